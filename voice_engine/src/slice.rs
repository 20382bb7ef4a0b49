// Slice segmentation and chord labelling (component A).
//
// A slice is a maximal contiguous range of mutually-overlapping notes.
// Segmenting the note stream into slices bounds the stochastic local search
// to a manageable sub-problem and resets the per-voice linking context at a
// clean boundary.

use crate::notes::Descriptor;

/// Per-voice state that persists across slices: the last note placed in
/// each voice before the current slice (`links`) and each voice's maximum
/// offset seen so far (`offsets`). `cands` is scratch space used while
/// evaluating cost within the current slice.
#[derive(Debug, Clone)]
pub struct VoiceLinks {
    pub offsets: Vec<f64>,
    pub links: Vec<i64>,
    pub cands: Vec<i64>,
}

impl VoiceLinks {
    /// Initial state: every voice starts empty (`links[v] = -1`) with its
    /// watermark at the first note's onset.
    pub fn new(max_voices: usize, initial_offset: f64) -> Self {
        VoiceLinks {
            offsets: vec![initial_offset; max_voices],
            links: vec![-1; max_voices],
            cands: vec![-1; max_voices],
        }
    }
}

/// Finds the next slice starting at `prev_stop`, or `None` once the note
/// table is exhausted.
///
/// A slice `[start, stop)` grows for as long as the next candidate note
/// overlaps every note already admitted.
pub fn next_slice(desc: &Descriptor, prev_stop: usize) -> Option<(usize, usize)> {
    let n = desc.len();
    let start = prev_stop;
    if start >= n {
        return None;
    }
    let mut stop = start;
    while stop < n && (start..stop).all(|i| desc.overlaps(i, stop)) {
        stop += 1;
    }
    Some((start, stop))
}

/// Labels `desc.chord[start..stop)` using onset proximity, continuing the
/// running chord counter `next_chord` (which is bumped by one extra at the
/// end so the following slice starts in a fresh chord group).
pub fn label_chords(desc: &mut Descriptor, start: usize, stop: usize, chord_spread: f64, next_chord: &mut i32) {
    if start >= stop {
        return;
    }
    let mut onset_prev = desc.onset[start];
    let mut c = *next_chord;
    desc.chord[start] = c;
    for i in (start + 1)..stop {
        if desc.onset[i] - onset_prev > chord_spread {
            c += 1;
            onset_prev = desc.onset[i];
        }
        desc.chord[i] = c;
    }
    *next_chord = c + 1;
}
