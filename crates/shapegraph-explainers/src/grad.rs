//! Vanilla gradient saliency.

use crate::{resolve_graph_label, resolve_node_label};
use ndarray::{Array1, Array2, Axis};
use shapegraph_core::{
    k_hop_subgraph, Capabilities, Explainer, Explanation, GnnModel, GraphQuery, NodeQuery, Result,
    ScoreTarget,
};
use tracing::debug;

/// Attribution by `|∂ log p(label) / ∂ input|`.
///
/// Node queries are scored on the k-hop subgraph, graph queries on the
/// mean-pooled prediction of the whole graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradExplainer;

impl GradExplainer {
    pub fn new() -> Self {
        Self
    }
}

/// Per-feature and per-node saliency from an input gradient.
fn saliency(grad: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let abs = grad.mapv(f64::abs);
    let feature_imp = abs.sum_axis(Axis(0));
    let node_imp = abs.sum_axis(Axis(1));
    (feature_imp, node_imp)
}

impl Explainer for GradExplainer {
    fn name(&self) -> &'static str {
        "GradExplainer"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NODE_AND_GRAPH
    }

    fn explain_node(&mut self, model: &dyn GnnModel, query: &NodeQuery<'_>) -> Result<Explanation> {
        let label = resolve_node_label(model, query)?;
        let num_hops = query.num_hops.unwrap_or_else(|| model.num_layers());
        let subgraph = k_hop_subgraph(query.node_idx, num_hops, query.edge_index, query.x.nrows())?;

        let sub_x = subgraph.gather_rows(query.x);
        let sub_ei = subgraph.local_edge_index();
        let weights = Array1::ones(sub_ei.len());
        let target = ScoreTarget::Node(subgraph.mapping);

        let grad_x = model.feature_gradient(&sub_x, &sub_ei, &weights, target, label);
        let grad_w = model.edge_gradient(&sub_x, &sub_ei, &weights, target, label);
        let (feature_imp, node_imp) = saliency(&grad_x);
        debug!(node = query.node_idx, label, "Gradient node explanation");

        Ok(Explanation::for_node(query.node_idx, subgraph)
            .with_feature_imp(feature_imp)
            .with_node_imp(node_imp)
            .with_edge_imp(grad_w.mapv(f64::abs)))
    }

    fn explain_graph(&mut self, model: &dyn GnnModel, query: &GraphQuery<'_>) -> Result<Explanation> {
        let label = resolve_graph_label(model, query)?;
        let num_nodes = query.x.nrows();

        let weights = Array1::ones(query.edge_index.len());
        let grad_x =
            model.feature_gradient(query.x, query.edge_index, &weights, ScoreTarget::Graph, label);
        let grad_w =
            model.edge_gradient(query.x, query.edge_index, &weights, ScoreTarget::Graph, label);
        let (feature_imp, node_imp) = saliency(&grad_x);

        Ok(Explanation::for_graph(num_nodes, query.edge_index.clone())
            .with_feature_imp(feature_imp)
            .with_node_imp(node_imp)
            .with_edge_imp(grad_w.mapv(f64::abs)))
    }
}
