// Persisting a slice's voice assignment into the cross-slice link chain
// (component D).
//
// This runs once, after stochastic local search has committed its final
// `desc.voice[start..stop)`. Unlike `calculate_total_cost`'s transient
// reconstruction (scoped to a single cost evaluation), this pass is the
// authoritative update: it is what the next slice's `links`/`offsets` are
// built from.

use crate::notes::Descriptor;
use crate::slice::VoiceLinks;

/// Appends `desc.voice[start..stop)` into each voice's link chain and
/// advances each voice's offset watermark.
pub fn apply_linking_pass(desc: &mut Descriptor, links: &mut VoiceLinks, start: usize, stop: usize) {
    for i in start..stop {
        let v = desc.voice[i];
        desc.link[i] = links.links[v];
        links.links[v] = i as i64;
        if desc.offset[i] > links.offsets[v] {
            links.offsets[v] = desc.offset[i];
        }
    }
}
