// The five-term weighted cost model (component B).
//
// Every penalty is normalized into `[0, 1]`; sub-contributions within a
// penalty are folded together with `combine`, a saturating accumulator that
// treats each contribution as "this much more certain the assignment is
// bad" rather than averaging them away.
//
// `calculate_total_cost` is the one place that mutates `desc.link` and
// `links.cands` during search: every call rebuilds both from the current
// `desc.voice` assignment before scoring, so the cost functions below can
// assume `link`/`cands` already reflect whatever assignment is being
// evaluated.

use crate::error::MonitorError;
use crate::notes::Descriptor;
use crate::slice::VoiceLinks;
use serde::{Deserialize, Serialize};

/// Saturating accumulator: `a + (1 - a) * b`. Commutative, and `combine(a,
/// 0) == a`, `combine(a, 1) == 1`.
pub fn combine(a: f64, b: f64) -> f64 {
    a + (1.0 - a) * b
}

/// The five penalty terms plus their weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostVector {
    pub pitch: f64,
    pub gap: f64,
    pub chord: f64,
    pub overlap: f64,
    pub cross: f64,
    pub total: f64,
}

/// The evaluation context a monitor callback is invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// First evaluation of a freshly initialized slice.
    Initial = 0,
    /// Before the greedy 1-flip scan begins.
    PreFlip = 1,
    /// After the single best flip found by the greedy scan is applied.
    PerFlip = 2,
    /// After a random perturbation is applied.
    PerPerturbation = 3,
    /// After the slice's best-known assignment has been restored.
    Final = 4,
}

/// Callback signature for observing search progress.
///
/// Returning `Err` disables further notifications for the remainder of the
/// invocation (see [`MonitorState`]); it does not stop the search.
pub type MonitorCallback<'a> =
    dyn FnMut(usize, usize, &CostVector, Stage) -> Result<(), MonitorError> + 'a;

/// Tracks an optional monitor callback and whether it has failed.
///
/// Kept separate from the cost functions so the search's hot loop never has
/// to thread a `Result` through every cost evaluation: a failure is
/// recorded once here and surfaced by the top-level driver after the whole
/// separation has run to completion.
pub struct MonitorState<'a> {
    callback: Option<&'a mut MonitorCallback<'a>>,
    failure: Option<String>,
}

impl<'a> MonitorState<'a> {
    pub fn none() -> Self {
        MonitorState {
            callback: None,
            failure: None,
        }
    }

    pub fn new(callback: &'a mut MonitorCallback<'a>) -> Self {
        MonitorState {
            callback: Some(callback),
            failure: None,
        }
    }

    fn notify(&mut self, start: usize, stop: usize, cost: &CostVector, stage: Stage) {
        let Some(callback) = self.callback.as_mut() else {
            return;
        };
        if let Err(e) = callback(start, stop, cost, stage) {
            self.failure = Some(e.0);
            self.callback = None;
        }
    }

    /// Takes the recorded failure message, if the callback ever errored.
    pub fn take_failure(&mut self) -> Option<String> {
        self.failure.take()
    }
}

fn previous_chord(desc: &Descriptor, i: usize) -> i64 {
    let mut j = desc.link[i];
    while j >= 0 && desc.chord[j as usize] == desc.chord[i] {
        j = desc.link[j as usize];
    }
    j
}

fn chord_position(desc: &Descriptor, start_i: i64, reference: i32) -> i32 {
    let chord = desc.chord[start_i as usize];
    let mut i = start_i;
    let mut best = desc.position[start_i as usize];
    let mut best_dist = (best - reference).abs();
    loop {
        let idx = i as usize;
        let dist = (desc.position[idx] - reference).abs();
        if dist < best_dist {
            best_dist = dist;
            best = desc.position[idx];
        }
        let next = desc.link[idx];
        if next < 0 || desc.chord[next as usize] != chord {
            break;
        }
        i = next;
    }
    best
}

fn average_position_run(desc: &Descriptor, start_i: i64) -> (f64, i32) {
    if start_i < 0 {
        return (0.0, 0);
    }
    let chord = desc.chord[start_i as usize];
    let mut i = start_i;
    let mut sum = 0.0;
    let mut count = 0;
    loop {
        let idx = i as usize;
        sum += desc.position[idx] as f64;
        count += 1;
        let next = desc.link[idx];
        if next < 0 || desc.chord[next as usize] != chord {
            break;
        }
        i = next;
    }
    (sum, count)
}

struct ChordRunStats {
    min_onset: f64,
    max_onset: f64,
    min_duration: f64,
    max_duration: f64,
    min_position: i32,
    max_position: i32,
}

fn chord_run_stats(desc: &Descriptor, start_i: i64) -> ChordRunStats {
    let chord = desc.chord[start_i as usize];
    let mut i = start_i;
    let mut stats = ChordRunStats {
        min_onset: f64::INFINITY,
        max_onset: f64::NEG_INFINITY,
        min_duration: f64::INFINITY,
        max_duration: f64::NEG_INFINITY,
        min_position: i32::MAX,
        max_position: i32::MIN,
    };
    loop {
        let idx = i as usize;
        stats.min_onset = stats.min_onset.min(desc.onset[idx]);
        stats.max_onset = stats.max_onset.max(desc.onset[idx]);
        stats.min_duration = stats.min_duration.min(desc.duration[idx]);
        stats.max_duration = stats.max_duration.max(desc.duration[idx]);
        stats.min_position = stats.min_position.min(desc.position[idx]);
        stats.max_position = stats.max_position.max(desc.position[idx]);
        let next = desc.link[idx];
        if next < 0 || desc.chord[next as usize] != chord {
            break;
        }
        i = next;
    }
    stats
}

fn pitch_penalty(desc: &Descriptor, links: &VoiceLinks, start: usize) -> f64 {
    let lookback = desc.config.pitch_lookback;
    let mut pd = 0.0;
    for v in 0..links.cands.len() {
        let mut pvd = 0.0;
        let mut i = links.cands[v];
        while i >= 0 && (i as usize) >= start {
            let idx = i as usize;
            let j0 = previous_chord(desc, idx);
            if j0 >= 0 {
                let mut p = chord_position(desc, j0, desc.position[idx]) as f64;
                let mut j = j0;
                for _ in 0..lookback {
                    let j_next = previous_chord(desc, j as usize);
                    if j_next < 0 {
                        break;
                    }
                    let cp = chord_position(desc, j_next, desc.position[idx]) as f64;
                    p = 0.8 * p + 0.2 * cp;
                    j = j_next;
                }
                let dist = (desc.position[idx] as f64 - p).abs() / 128.0;
                pvd = combine(pvd, dist.min(1.0));
            }
            i = desc.link[idx];
        }
        pd = combine(pd, pvd);
    }
    pd
}

fn gap_penalty(desc: &Descriptor, links: &VoiceLinks, start: usize) -> f64 {
    let mut gd = 0.0;
    let mut count = 0u32;
    for v in 0..links.cands.len() {
        let cand = links.cands[v];
        if cand < 0 || (cand as usize) < start {
            continue;
        }
        let mut i = cand as usize;
        loop {
            let pred = desc.link[i];
            if pred >= 0 && (pred as usize) >= start {
                i = pred as usize;
            } else {
                break;
            }
        }
        let onset_i = desc.onset[i];
        let mut offset_min = onset_i;
        for &w in links.offsets.iter() {
            offset_min = offset_min.min(w);
        }
        count += 1;
        if links.offsets[v] < onset_i {
            let val = (onset_i - links.offsets[v]) / (onset_i - offset_min);
            gd += val.clamp(0.0, 1.0);
        }
    }
    if count == 0 {
        0.0
    } else {
        gd / count as f64
    }
}

fn chord_penalty(desc: &Descriptor, links: &VoiceLinks, start: usize) -> f64 {
    let mut cd = 0.0;
    for v in 0..links.cands.len() {
        let mut i = links.cands[v];
        while i >= 0 && (i as usize) >= start {
            let stats = chord_run_stats(desc, i);
            let p_duration = 1.0 - stats.min_duration / stats.max_duration;
            let p_range = ((stats.max_position - stats.min_position) as f64 / 24.0).min(1.0);
            let p_on = (stats.max_onset - stats.min_onset) / stats.max_duration;
            let p = combine(combine(p_duration, p_range), p_on);
            cd = combine(cd, p);
            i = previous_chord(desc, i as usize);
        }
    }
    cd
}

fn overlap_penalty(desc: &Descriptor, links: &VoiceLinks, start: usize, stop: usize) -> f64 {
    let mut od = 0.0;
    for v in 0..links.links.len() {
        let mut ovd = 0.0;
        let mut prev = links.links[v];
        for next in start..stop {
            if desc.voice[next] != v {
                continue;
            }
            if prev < 0 {
                prev = next as i64;
                continue;
            }
            let p = prev as usize;
            if desc.overlaps(p, next) {
                let o_dist = 1.0 - (desc.onset[next] - desc.onset[p]) / desc.duration[p];
                ovd = combine(ovd, o_dist.clamp(0.0, 1.0));
            }
            if desc.chord[p] != desc.chord[next] {
                prev = next as i64;
            }
        }
        od = combine(od, ovd);
    }
    od
}

fn cross_penalty(desc: &Descriptor, links: &VoiceLinks) -> f64 {
    let mut position0 = Vec::new();
    let mut position1 = Vec::new();
    for v in 0..links.cands.len() {
        if links.links[v] < 0 || links.cands[v] < 0 {
            continue;
        }
        let (sum0, count0) = average_position_run(desc, links.links[v]);
        let (sum1, count1) = average_position_run(desc, links.cands[v]);
        if count0 == 0 || count1 == 0 {
            continue;
        }
        position0.push(sum0 / count0 as f64);
        position1.push(sum1 / count1 as f64);
    }
    if position0.is_empty() {
        return 0.0;
    }
    let mut order0: Vec<usize> = (0..position0.len()).collect();
    order0.sort_by(|&a, &b| position0[a].partial_cmp(&position0[b]).unwrap());
    let mut order1: Vec<usize> = (0..position1.len()).collect();
    order1.sort_by(|&a, &b| position1[a].partial_cmp(&position1[b]).unwrap());
    if order0 == order1 {
        0.0
    } else {
        1.0
    }
}

/// Rebuilds `desc.link`/`links.cands` from `desc.voice[start..stop)` and
/// scores the result. Called many times per slice during search, once per
/// candidate flip.
pub fn calculate_total_cost(
    desc: &mut Descriptor,
    links: &mut VoiceLinks,
    start: usize,
    stop: usize,
    stage: Stage,
    monitor: &mut MonitorState,
) -> CostVector {
    links.cands.copy_from_slice(&links.links);
    for i in start..stop {
        let v = desc.voice[i];
        desc.link[i] = links.cands[v];
        links.cands[v] = i as i64;
    }

    let cfg = desc.config;
    let pitch = pitch_penalty(desc, links, start);
    let gap = gap_penalty(desc, links, start);
    let chord = chord_penalty(desc, links, start);
    let overlap = overlap_penalty(desc, links, start, stop);
    let cross = cross_penalty(desc, links);

    let total = cfg.pitch_penalty * pitch
        + cfg.gap_penalty * gap
        + cfg.chord_penalty * chord
        + cfg.overlap_penalty * overlap
        + cfg.cross_penalty * cross;

    let cost = CostVector {
        pitch,
        gap,
        chord,
        overlap,
        cross,
        total,
    };
    monitor.notify(start, stop, &cost, stage);
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::SeparationConfig;

    #[test]
    fn combine_is_commutative() {
        assert!((combine(0.3, 0.7) - combine(0.7, 0.3)).abs() < 1e-12);
    }

    #[test]
    fn combine_identity_and_absorption() {
        assert!((combine(0.4, 0.0) - 0.4).abs() < 1e-12);
        assert!((combine(0.4, 1.0) - 1.0).abs() < 1e-12);
    }

    fn simple_descriptor() -> Descriptor {
        Descriptor::new(
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![60, 64],
            SeparationConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn same_voice_same_time_costs_more_than_separate_voices() {
        let mut same = simple_descriptor();
        same.voice = vec![0, 0];
        let mut links_same = VoiceLinks::new(same.config.max_voices, same.onset[0]);
        let mut monitor = MonitorState::none();
        let cost_same = calculate_total_cost(&mut same, &mut links_same, 0, 2, Stage::Initial, &mut monitor);

        let mut split = simple_descriptor();
        split.voice = vec![0, 1];
        let mut links_split = VoiceLinks::new(split.config.max_voices, split.onset[0]);
        let cost_split = calculate_total_cost(&mut split, &mut links_split, 0, 2, Stage::Initial, &mut monitor);

        assert!(cost_same.total > cost_split.total);
    }

    #[test]
    fn monitor_failure_is_recorded_and_suppressed() {
        let mut desc = simple_descriptor();
        desc.voice = vec![0, 1];
        let mut links = VoiceLinks::new(desc.config.max_voices, desc.onset[0]);
        let mut calls = 0;
        let mut cb = |_start: usize, _stop: usize, _cost: &CostVector, _stage: Stage| {
            calls += 1;
            Err(MonitorError("boom".to_string()))
        };
        let mut monitor = MonitorState::new(&mut cb);
        calculate_total_cost(&mut desc, &mut links, 0, 2, Stage::Initial, &mut monitor);
        calculate_total_cost(&mut desc, &mut links, 0, 2, Stage::Final, &mut monitor);
        assert_eq!(calls, 1);
        assert_eq!(monitor.take_failure(), Some("boom".to_string()));
    }
}
