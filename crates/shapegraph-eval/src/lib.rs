pub mod accuracy;
pub mod faithfulness;
pub mod report;

pub use accuracy::{graph_exp_acc, jaccard, top_k_mask, AccuracyScores, Threshold};
pub use faithfulness::{gef, graph_exp_faith, FaithfulnessScores};
pub use report::{ScoreTable, Summary};
