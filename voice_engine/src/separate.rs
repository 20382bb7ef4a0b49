// Top-level driver (components A through D): segments the note stream into
// slices, assigns chords, searches for a low-cost voice assignment per
// slice, and persists it into the cross-slice link chain before moving on.

use crate::cost::{MonitorCallback, MonitorState};
use crate::error::SeparationError;
use crate::link::apply_linking_pass;
use crate::notes::{Descriptor, SeparationConfig};
use crate::search::stochastic_local_search;
use crate::slice::{label_chords, next_slice, VoiceLinks};
use voice_prng::Lcg;

/// The result of a full separation run.
#[derive(Debug, Clone)]
pub struct SeparationOutput {
    /// `voices[v]` is the ascending list of note indices assigned to voice
    /// `v`.
    pub voices: Vec<Vec<usize>>,
    /// The chord label assigned to each note.
    pub chord: Vec<i32>,
}

/// Separates `onset`/`offset`/`position` into up to `config.max_voices`
/// voices.
pub fn separate_voices(
    onset: Vec<f64>,
    offset: Vec<f64>,
    position: Vec<i32>,
    config: SeparationConfig,
) -> Result<SeparationOutput, SeparationError> {
    let mut monitor = MonitorState::none();
    separate_voices_with_monitor(onset, offset, position, config, &mut monitor)
}

/// As [`separate_voices`], but invokes `callback` with progress at each
/// search stage. If `callback` returns an error, further invocations are
/// suppressed for the remainder of this call, but the separation still
/// runs to completion; the callback's message is then returned as
/// [`SeparationError::MonitorFailed`].
pub fn separate_voices_monitored<'a>(
    onset: Vec<f64>,
    offset: Vec<f64>,
    position: Vec<i32>,
    config: SeparationConfig,
    callback: &'a mut MonitorCallback<'a>,
) -> Result<SeparationOutput, SeparationError> {
    let mut monitor = MonitorState::new(callback);
    separate_voices_with_monitor(onset, offset, position, config, &mut monitor)
}

fn separate_voices_with_monitor(
    onset: Vec<f64>,
    offset: Vec<f64>,
    position: Vec<i32>,
    config: SeparationConfig,
    monitor: &mut MonitorState,
) -> Result<SeparationOutput, SeparationError> {
    let mut desc = Descriptor::new(onset, offset, position, config)?;
    let mut rng = Lcg::new(config.seed);
    let mut links = VoiceLinks::new(config.max_voices, desc.onset[0]);
    let mut next_chord = 0i32;
    let mut stop = 0usize;

    while let Some((start, new_stop)) = next_slice(&desc, stop) {
        label_chords(&mut desc, start, new_stop, config.chord_spread, &mut next_chord);
        stochastic_local_search(&mut desc, &mut links, start, new_stop, &mut rng, monitor);
        apply_linking_pass(&mut desc, &mut links, start, new_stop);
        stop = new_stop;
    }

    if let Some(message) = monitor.take_failure() {
        return Err(SeparationError::MonitorFailed(message));
    }

    Ok(SeparationOutput {
        voices: desc.voices(),
        chord: desc.chord,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_input() {
        let err = separate_voices(vec![], vec![], vec![], SeparationConfig::default());
        assert!(err.is_err());
    }

    #[test]
    fn scenario_two_non_overlapping_notes_share_a_voice() {
        let config = SeparationConfig {
            seed: 0,
            ..Default::default()
        };
        let out = separate_voices(vec![0.0, 2.0], vec![1.0, 3.0], vec![69, 72], config).unwrap();
        let non_empty: Vec<&Vec<usize>> = out.voices.iter().filter(|v| !v.is_empty()).collect();
        assert_eq!(non_empty.len(), 1);
        assert_eq!(non_empty[0], &vec![0, 1]);
    }

    #[test]
    fn scenario_two_simultaneous_notes_split_voices() {
        let config = SeparationConfig {
            seed: 0,
            ..Default::default()
        };
        let out = separate_voices(vec![0.0, 0.0], vec![1.0, 1.0], vec![60, 64], config).unwrap();
        let non_empty: Vec<&Vec<usize>> = out.voices.iter().filter(|v| !v.is_empty()).collect();
        assert_eq!(non_empty.len(), 2);
    }

    #[test]
    fn determinism_same_seed_same_output() {
        let config = SeparationConfig {
            seed: 7,
            ..Default::default()
        };
        let run = || {
            separate_voices(
                vec![0.0, 0.0, 0.0, 1.0],
                vec![1.0, 1.0, 1.0, 2.0],
                vec![72, 67, 60, 67],
                config,
            )
            .unwrap()
            .voices
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn every_note_lands_in_exactly_one_voice() {
        let config = SeparationConfig {
            seed: 3,
            max_voices: 3,
            ..Default::default()
        };
        let onset = vec![0.0, 0.0, 0.5, 1.0, 1.5, 2.0];
        let n = onset.len();
        let offset = vec![1.0, 1.0, 1.5, 2.0, 2.5, 3.0];
        let position = vec![60, 64, 67, 62, 65, 69];
        let out = separate_voices(onset, offset, position, config).unwrap();
        let mut seen = vec![false; n];
        for voice in &out.voices {
            for &i in voice {
                assert!(!seen[i], "note {i} assigned to more than one voice");
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn chord_labels_are_non_decreasing() {
        let config = SeparationConfig {
            seed: 1,
            ..Default::default()
        };
        let out = separate_voices(
            vec![0.0, 0.0, 1.0, 1.0],
            vec![1.0, 1.0, 2.0, 2.0],
            vec![60, 64, 61, 65],
            config,
        )
        .unwrap();
        for pair in out.chord.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn monitor_error_is_surfaced_after_completion() {
        let config = SeparationConfig {
            seed: 0,
            ..Default::default()
        };
        let mut cb = |_start: usize, _stop: usize, _cost: &crate::cost::CostVector, _stage: crate::cost::Stage| {
            Err(crate::error::MonitorError("stop watching".to_string()))
        };
        let result = separate_voices_monitored(vec![0.0, 0.0], vec![1.0, 1.0], vec![60, 64], config, &mut cb);
        match result {
            Err(SeparationError::MonitorFailed(msg)) => assert_eq!(msg, "stop watching"),
            other => panic!("expected MonitorFailed, got {other:?}"),
        }
    }
}
