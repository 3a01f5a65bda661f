//! Graph explanation unfaithfulness (GEF).
//!
//! The model is run once on the explained neighborhood and once with only
//! the top-k explanation entries kept; GEF is `1 - exp(-KL(p_full || p_masked))`.
//! 0 means the explanation preserves the prediction, values near 1 mean
//! it does not.

use crate::accuracy::top_k_mask;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use shapegraph_core::{
    log_softmax, EdgeIndex, Explanation, ExplanationScope, GnnModel, Result, ShapeGraphError,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaithfulnessScores {
    /// Features of nodes outside the top-k zeroed.
    pub node: Option<f64>,
    /// Edges outside the top-k given zero weight.
    pub edge: Option<f64>,
}

/// GEF of `explanation` for the prediction it explains.
///
/// Node explanations are scored on their k-hop subgraph at the target row,
/// whole-graph explanations on the mean-pooled prediction. A score is
/// `None` when the explanation has no importance of that kind.
pub fn graph_exp_faith(
    model: &dyn GnnModel,
    x: &Array2<f64>,
    edge_index: &EdgeIndex,
    explanation: &Explanation,
    top_k: usize,
) -> Result<FaithfulnessScores> {
    explanation.validate(Some(x.ncols()))?;
    let required = match &explanation.scope {
        ExplanationScope::Node { subgraph, .. } => subgraph.nodes.last().map_or(0, |&n| n + 1),
        ExplanationScope::Graph { num_nodes, .. } => *num_nodes,
    };
    if x.nrows() < required {
        return Err(ShapeGraphError::ShapeMismatch(format!(
            "explanation covers node {} but features have {} rows",
            required.saturating_sub(1),
            x.nrows()
        )));
    }
    let expected_edges = match &explanation.scope {
        ExplanationScope::Node { subgraph, .. } => subgraph.edge_mask.len(),
        ExplanationScope::Graph { .. } => explanation.scope_num_edges(),
    };
    if edge_index.len() != expected_edges {
        return Err(ShapeGraphError::ShapeMismatch(format!(
            "explanation was computed on {} edges, graph has {}",
            expected_edges,
            edge_index.len()
        )));
    }

    let (sub_x, sub_ei, row) = match &explanation.scope {
        ExplanationScope::Node { subgraph, .. } => (
            subgraph.gather_rows(x),
            subgraph.local_edge_index(),
            Some(subgraph.mapping),
        ),
        ExplanationScope::Graph { .. } => (x.clone(), edge_index.clone(), None),
    };
    let predict = |features: &Array2<f64>, weights: Option<&Array1<f64>>| {
        let scores = model.forward(features, &sub_ei, weights);
        match row {
            Some(r) => log_softmax(scores.row(r)),
            None => scores
                .mean_axis(Axis(0))
                .map(|pooled| log_softmax(pooled.view()))
                .unwrap_or_default(),
        }
    };
    let full = predict(&sub_x, None);

    let node = explanation.node_imp.as_ref().map(|imp| {
        let keep = top_k_mask(imp, top_k);
        let mut masked = sub_x.clone();
        for (mut r, &k) in masked.axis_iter_mut(Axis(0)).zip(&keep) {
            if !k {
                r.fill(0.0);
            }
        }
        gef(full.view(), predict(&masked, None).view())
    });
    let edge = explanation.edge_imp.as_ref().map(|imp| {
        let weights: Array1<f64> = top_k_mask(imp, top_k)
            .into_iter()
            .map(|k| if k { 1.0 } else { 0.0 })
            .collect();
        gef(full.view(), predict(&sub_x, Some(&weights)).view())
    });

    debug!(?node, ?edge, top_k, "Computed GEF");
    Ok(FaithfulnessScores { node, edge })
}

/// `1 - exp(-KL(p || q))` from log-probabilities.
pub fn gef(log_p: ArrayView1<'_, f64>, log_q: ArrayView1<'_, f64>) -> f64 {
    let kl: f64 = log_p
        .iter()
        .zip(log_q.iter())
        .map(|(&lp, &lq)| lp.exp() * (lp - lq))
        .sum();
    1.0 - (-kl.max(0.0)).exp()
}
