//! Detection of accidental motif occurrences.

use crate::host::ShapeNode;
use crate::{HostGraph, Motif};
use petgraph::algo::subgraph_isomorphisms_iter;
use std::collections::BTreeSet;
use tracing::debug;

/// Node sets of every induced occurrence of `motif` in `host`.
///
/// Automorphic matches of the same nodes are reported once.
pub fn find_motif_occurrences(host: &HostGraph, motif: &Motif) -> Vec<Vec<usize>> {
    let pattern = motif.graph();
    let target = host.graph();
    let mut node_match = |_: &(), _: &ShapeNode| true;
    let mut edge_match = |_: &(), _: &()| true;

    let mut found = BTreeSet::new();
    if let Some(mappings) =
        subgraph_isomorphisms_iter(&pattern, &target, &mut node_match, &mut edge_match)
    {
        for mut nodes in mappings {
            nodes.sort_unstable();
            found.insert(nodes);
        }
    }
    found.into_iter().collect()
}

/// True when the only occurrences of `motif` are the planted instances.
///
/// Fails on any occurrence that touches an untagged node or spans two
/// instances, and on any instance id that does not own exactly one
/// motif's worth of nodes forming the pattern.
pub fn verify_motifs(host: &HostGraph, motif: &Motif) -> bool {
    let occurrences = find_motif_occurrences(host, motif);
    let mut matched_ids = BTreeSet::new();

    for nodes in &occurrences {
        let first = host.shape(nodes[0]);
        if first == 0 || nodes.iter().any(|&n| host.shape(n) != first) {
            debug!(?nodes, "Found motif occurrence outside the planted instances");
            return false;
        }
        matched_ids.insert(first);
    }

    let shapes = host.shapes();
    for id in 1..=host.num_motifs() {
        let size = shapes.iter().filter(|&&s| s == id).count();
        if size != motif.num_nodes() || !matched_ids.contains(&id) {
            debug!(id, size, "Malformed motif instance");
            return false;
        }
    }
    if shapes.iter().any(|&s| s > host.num_motifs()) {
        return false;
    }
    true
}
