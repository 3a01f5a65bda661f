use crate::{EdgeIndex, KhopSubgraph, Result, ShapeGraphError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// What an [`Explanation`] covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExplanationScope {
    /// Prediction of one node, explained over its k-hop neighborhood.
    Node {
        node_idx: usize,
        subgraph: KhopSubgraph,
    },
    /// Whole-graph prediction.
    Graph {
        num_nodes: usize,
        edge_index: EdgeIndex,
    },
}

/// Attribution of a prediction to features, nodes and edges.
///
/// `node_imp` and `edge_imp` are indexed like the scope: by position in the
/// k-hop node list / restricted edge index for node explanations, by global
/// id for whole graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub feature_imp: Option<Array1<f64>>,
    pub node_imp: Option<Array1<f64>>,
    pub edge_imp: Option<Array1<f64>>,
    pub scope: ExplanationScope,
}

impl Explanation {
    pub fn for_node(node_idx: usize, subgraph: KhopSubgraph) -> Self {
        Self {
            feature_imp: None,
            node_imp: None,
            edge_imp: None,
            scope: ExplanationScope::Node { node_idx, subgraph },
        }
    }

    pub fn for_graph(num_nodes: usize, edge_index: EdgeIndex) -> Self {
        Self {
            feature_imp: None,
            node_imp: None,
            edge_imp: None,
            scope: ExplanationScope::Graph {
                num_nodes,
                edge_index,
            },
        }
    }

    pub fn with_feature_imp(mut self, imp: Array1<f64>) -> Self {
        self.feature_imp = Some(imp);
        self
    }

    pub fn with_node_imp(mut self, imp: Array1<f64>) -> Self {
        self.node_imp = Some(imp);
        self
    }

    pub fn with_edge_imp(mut self, imp: Array1<f64>) -> Self {
        self.edge_imp = Some(imp);
        self
    }

    pub fn node_idx(&self) -> Option<usize> {
        match &self.scope {
            ExplanationScope::Node { node_idx, .. } => Some(*node_idx),
            ExplanationScope::Graph { .. } => None,
        }
    }

    pub fn enclosing_subgraph(&self) -> Option<&KhopSubgraph> {
        match &self.scope {
            ExplanationScope::Node { subgraph, .. } => Some(subgraph),
            ExplanationScope::Graph { .. } => None,
        }
    }

    /// Node count of the scope.
    pub fn scope_num_nodes(&self) -> usize {
        match &self.scope {
            ExplanationScope::Node { subgraph, .. } => subgraph.num_nodes(),
            ExplanationScope::Graph { num_nodes, .. } => *num_nodes,
        }
    }

    /// Edge count of the scope.
    pub fn scope_num_edges(&self) -> usize {
        match &self.scope {
            ExplanationScope::Node { subgraph, .. } => subgraph.num_edges(),
            ExplanationScope::Graph { edge_index, .. } => edge_index.len(),
        }
    }

    /// Check that importance vectors agree in length with the scope and,
    /// when given, the feature dimension.
    pub fn validate(&self, num_features: Option<usize>) -> Result<()> {
        if let Some(node_imp) = &self.node_imp {
            if node_imp.len() != self.scope_num_nodes() {
                return Err(ShapeGraphError::ShapeMismatch(format!(
                    "node_imp has {} entries, scope has {} nodes",
                    node_imp.len(),
                    self.scope_num_nodes()
                )));
            }
        }
        if let Some(edge_imp) = &self.edge_imp {
            if edge_imp.len() != self.scope_num_edges() {
                return Err(ShapeGraphError::ShapeMismatch(format!(
                    "edge_imp has {} entries, scope has {} edges",
                    edge_imp.len(),
                    self.scope_num_edges()
                )));
            }
        }
        if let (Some(feature_imp), Some(d)) = (&self.feature_imp, num_features) {
            if feature_imp.len() != d {
                return Err(ShapeGraphError::ShapeMismatch(format!(
                    "feature_imp has {} entries, features have {} dimensions",
                    feature_imp.len(),
                    d
                )));
            }
        }
        Ok(())
    }
}

/// Mark an edge important when both of its endpoints are.
pub fn edge_mask_from_node_mask(node_mask: &[bool], edge_index: &EdgeIndex) -> Result<Array1<f64>> {
    if edge_index.max_node() > node_mask.len() {
        return Err(ShapeGraphError::ShapeMismatch(format!(
            "node mask covers {} nodes but edges reference node {}",
            node_mask.len(),
            edge_index.max_node() - 1
        )));
    }
    Ok(edge_index
        .iter()
        .map(|(u, v)| if node_mask[u] && node_mask[v] { 1.0 } else { 0.0 })
        .collect())
}
