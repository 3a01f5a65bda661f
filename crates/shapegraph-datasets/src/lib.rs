pub mod features;
pub mod generators;
pub mod graph_dataset;
pub mod host;
pub mod labels;
pub mod motif;
pub mod shape_graph;
pub mod splits;
pub mod verify;

pub use features::{add_sensitive_feature, gaussian_lv_generator, FeatureSet, SensitiveShuffle};
pub use generators::{barabasi_albert, erdos_renyi};
pub use graph_dataset::{GraphDataset, GraphSample};
pub use host::{HostGraph, HostGraphParams, ShapeNode};
pub use labels::bound_graph_label;
pub use motif::Motif;
pub use shape_graph::ShapeGraph;
pub use splits::{split_size, SplitMasks};
pub use verify::{find_motif_occurrences, verify_motifs};
