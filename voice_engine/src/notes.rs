// Core data model: a note table plus the per-invocation configuration.
//
// All per-note relationships (chord membership, voice assignment, voice
// back-links) are encoded as parallel arrays indexed by note index, not as
// a graph of owned nodes. This keeps the representation flat, trivially
// serializable, and free of ownership cycles — the same shape used
// throughout this codebase for indexed graphs (see `astar::Graph`).

use serde::{Deserialize, Serialize};

/// Tunables for a single voice-separation invocation.
///
/// Defaults mirror the reference implementation's documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationConfig {
    pub max_voices: usize,
    pub pitch_penalty: f64,
    pub gap_penalty: f64,
    pub chord_penalty: f64,
    pub overlap_penalty: f64,
    pub cross_penalty: f64,
    pub chord_spread: f64,
    pub pitch_lookback: usize,
    pub seed: u32,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        SeparationConfig {
            max_voices: 6,
            pitch_penalty: 1.0,
            gap_penalty: 0.5,
            chord_penalty: 1.0,
            overlap_penalty: 1.0,
            cross_penalty: 1.0,
            chord_spread: 0.0,
            pitch_lookback: 2,
            seed: 0,
        }
    }
}

/// The note table: parallel arrays, one entry per note, all indexed by the
/// same note index.
///
/// `link[i]` is the index of the previous note assigned to the same voice
/// as `i` (or `-1` for none); following it from any note visits strictly
/// decreasing indices sharing that note's final `voice`.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub onset: Vec<f64>,
    pub offset: Vec<f64>,
    pub duration: Vec<f64>,
    pub position: Vec<i32>,
    pub chord: Vec<i32>,
    pub voice: Vec<usize>,
    pub link: Vec<i64>,
    pub config: SeparationConfig,
}

impl Descriptor {
    /// Builds a note table from onset/offset/pitch arrays, validating shape.
    ///
    /// `onset`, `offset` and `pitch` must have equal, non-zero length, and
    /// every `offset[i]` must exceed `onset[i]`.
    pub fn new(
        onset: Vec<f64>,
        offset: Vec<f64>,
        position: Vec<i32>,
        config: SeparationConfig,
    ) -> Result<Self, crate::error::SeparationError> {
        use crate::error::SeparationError;

        if onset.is_empty() {
            return Err(SeparationError::InvalidInput(
                "note arrays must not be empty".to_string(),
            ));
        }
        if onset.len() != offset.len() || onset.len() != position.len() {
            return Err(SeparationError::InvalidInput(format!(
                "mismatched array lengths: onset={}, offset={}, pitch={}",
                onset.len(),
                offset.len(),
                position.len()
            )));
        }
        for i in 0..onset.len() {
            if offset[i] <= onset[i] {
                return Err(SeparationError::InvalidInput(format!(
                    "note {i} has non-positive duration (onset={}, offset={})",
                    onset[i], offset[i]
                )));
            }
        }

        let n = onset.len();
        let duration = onset.iter().zip(&offset).map(|(o, f)| f - o).collect();
        Ok(Descriptor {
            onset,
            offset,
            duration,
            position,
            chord: vec![0; n],
            voice: vec![0; n],
            link: vec![-1; n],
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.onset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.onset.is_empty()
    }

    /// Two notes overlap iff their half-open `[onset, offset)` intervals
    /// intersect.
    pub fn overlaps(&self, a: usize, b: usize) -> bool {
        if self.onset[a] <= self.onset[b] {
            self.offset[a] > self.onset[b]
        } else {
            self.offset[b] > self.onset[a]
        }
    }

    /// Collects, per voice, the ascending indices of notes assigned to it.
    pub fn voices(&self) -> Vec<Vec<usize>> {
        let mut voices = vec![Vec::new(); self.config.max_voices];
        for (i, &v) in self.voice.iter().enumerate() {
            voices[v].push(i);
        }
        voices
    }
}
