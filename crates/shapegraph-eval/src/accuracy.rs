//! Agreement between predicted and ground-truth explanations.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use shapegraph_core::{Explanation, Result, ShapeGraphError};

/// Rule turning soft importance scores into a binary mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// The `k` highest scores, ties broken by position.
    TopK(usize),
    /// Every score strictly above the value.
    Above(f64),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Above(0.5)
    }
}

impl Threshold {
    pub fn apply(&self, scores: &Array1<f64>) -> Vec<bool> {
        match *self {
            Threshold::TopK(k) => top_k_mask(scores, k),
            Threshold::Above(t) => scores.iter().map(|&v| v > t).collect(),
        }
    }
}

pub fn top_k_mask(scores: &Array1<f64>, k: usize) -> Vec<bool> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    let mut mask = vec![false; scores.len()];
    for &i in order.iter().take(k) {
        mask[i] = true;
    }
    mask
}

/// |A ∩ B| / |A ∪ B|; two empty masks agree perfectly.
pub fn jaccard(a: &[bool], b: &[bool]) -> f64 {
    let (mut inter, mut union) = (0usize, 0usize);
    for (&x, &y) in a.iter().zip(b) {
        inter += usize::from(x && y);
        union += usize::from(x || y);
    }
    if union == 0 {
        1.0
    } else {
        inter as f64 / union as f64
    }
}

/// Jaccard scores of one explanation against its ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyScores {
    pub node: Option<f64>,
    pub edge: Option<f64>,
}

/// Explanation accuracy: Jaccard index between the nonzero entries of the
/// ground truth and the thresholded prediction, for node and edge masks.
///
/// A score is `None` when either side lacks that importance vector.
pub fn graph_exp_acc(
    ground_truth: &Explanation,
    predicted: &Explanation,
    threshold: Threshold,
) -> Result<AccuracyScores> {
    if ground_truth.scope_num_nodes() != predicted.scope_num_nodes()
        || ground_truth.scope_num_edges() != predicted.scope_num_edges()
    {
        return Err(ShapeGraphError::ShapeMismatch(format!(
            "ground truth covers {} nodes / {} edges, prediction {} nodes / {} edges",
            ground_truth.scope_num_nodes(),
            ground_truth.scope_num_edges(),
            predicted.scope_num_nodes(),
            predicted.scope_num_edges()
        )));
    }
    ground_truth.validate(None)?;
    predicted.validate(None)?;

    let score = |gt: &Option<Array1<f64>>, pred: &Option<Array1<f64>>| match (gt, pred) {
        (Some(gt), Some(pred)) => {
            let gt_mask: Vec<bool> = gt.iter().map(|&v| v > 0.0).collect();
            Some(jaccard(&gt_mask, &threshold.apply(pred)))
        }
        _ => None,
    };
    Ok(AccuracyScores {
        node: score(&ground_truth.node_imp, &predicted.node_imp),
        edge: score(&ground_truth.edge_imp, &predicted.edge_imp),
    })
}
