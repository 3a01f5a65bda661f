pub mod gnn_explainer;
pub mod grad;
pub mod optim;
pub mod random;
pub mod registry;

pub use gnn_explainer::GnnExplainer;
pub use grad::GradExplainer;
pub use optim::Adam;
pub use random::RandomExplainer;
pub use registry::{ExplainerKind, UnknownExplainer};

use ndarray::Array2;
use shapegraph_core::{EdgeIndex, GnnModel, GraphQuery, NodeQuery, Result, ShapeGraphError};

/// Class to explain for a node: the requested label, or the model's prediction.
pub(crate) fn resolve_node_label(model: &dyn GnnModel, query: &NodeQuery<'_>) -> Result<usize> {
    let num_nodes = query.x.nrows();
    if query.node_idx >= num_nodes {
        return Err(ShapeGraphError::NodeOutOfRange {
            node: query.node_idx,
            num_nodes,
        });
    }
    let predicted = model.predict(query.x, query.edge_index)[query.node_idx];
    check_label(model, query.x, query.edge_index, query.label.unwrap_or(predicted))
}

pub(crate) fn resolve_graph_label(model: &dyn GnnModel, query: &GraphQuery<'_>) -> Result<usize> {
    if query.x.nrows() == 0 {
        return Err(ShapeGraphError::InvalidOperation(
            "cannot explain an empty graph".to_string(),
        ));
    }
    let label = match query.label {
        Some(label) => label,
        None => model.predict_graph(query.x, query.edge_index),
    };
    check_label(model, query.x, query.edge_index, label)
}

fn check_label(
    model: &dyn GnnModel,
    x: &Array2<f64>,
    edge_index: &EdgeIndex,
    label: usize,
) -> Result<usize> {
    let num_classes = model.forward(x, edge_index, None).ncols();
    if label >= num_classes {
        return Err(ShapeGraphError::InvalidOperation(format!(
            "label {} out of range for {} classes",
            label, num_classes
        )));
    }
    Ok(label)
}
