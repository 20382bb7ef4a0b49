// Polyphonic voice separation and A* routing core.
//
// Architecture:
// - notes.rs: the note table (`Descriptor`) and per-invocation configuration
// - slice.rs: slice segmentation, chord labelling, and cross-slice voice
//   link/offset state (`VoiceLinks`)
// - cost.rs: the five-term weighted cost model and the monitor callback
// - search.rs: stochastic local search (greedy 1-flip + random perturbation)
// - link.rs: persisting a slice's final assignment into the link chain
// - separate.rs: the top-level driver composing the above per slice
// - astar.rs: an independent A* shortest-path search over a 2-D node graph
// - error.rs: error types
//
// The separation search is deterministic given a fixed seed: see
// `voice_prng::Lcg`, the only source of randomness anywhere in this crate.

pub mod astar;
pub mod cost;
pub mod error;
pub mod link;
pub mod notes;
pub mod search;
pub mod separate;
pub mod slice;

pub use cost::{CostVector, Stage};
pub use error::{MonitorError, SeparationError};
pub use notes::{Descriptor, SeparationConfig};
pub use separate::{separate_voices, separate_voices_monitored, SeparationOutput};
