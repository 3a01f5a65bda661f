use crate::HostGraph;
use shapegraph_core::LabelConfig;

/// Class 1 for nodes whose 1-hop neighborhood touches at least
/// `rule.min_shapes` distinct motifs, class 0 otherwise.
pub fn bound_graph_label(host: &HostGraph, rule: &LabelConfig) -> Vec<usize> {
    (0..host.num_nodes())
        .map(|n| usize::from(host.node(n).shapes_in_khop >= rule.min_shapes))
        .collect()
}
