//! Graph-classification datasets assembled from externally loaded molecules.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use shapegraph_core::{edge_mask_from_node_mask, EdgeIndex, Explanation, Result, ShapeGraphError};
use tracing::info;

/// One graph with its node features and graph label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSample {
    pub x: Array2<f64>,
    pub y: usize,
    pub edge_index: EdgeIndex,
    pub edge_attr: Option<Array2<f64>>,
}

impl GraphSample {
    pub fn num_nodes(&self) -> usize {
        self.x.nrows()
    }
}

/// Graphs paired with whole-graph ground-truth explanations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDataset {
    name: String,
    graphs: Vec<GraphSample>,
    explanations: Vec<Explanation>,
    external_ids: Vec<String>,
}

impl GraphDataset {
    /// Pair every graph with its node attribution.
    ///
    /// Edge importance is derived from the node mask: an edge counts when
    /// both of its endpoints are nonzero. Features carry no ground truth.
    pub fn from_parts(
        name: impl Into<String>,
        graphs: Vec<GraphSample>,
        node_imps: Vec<Array1<f64>>,
        external_ids: Vec<String>,
    ) -> Result<Self> {
        if node_imps.len() != graphs.len() {
            return Err(ShapeGraphError::ShapeMismatch(format!(
                "{} graphs but {} node attributions",
                graphs.len(),
                node_imps.len()
            )));
        }
        if !external_ids.is_empty() && external_ids.len() != graphs.len() {
            return Err(ShapeGraphError::ShapeMismatch(format!(
                "{} graphs but {} external ids",
                graphs.len(),
                external_ids.len()
            )));
        }

        let mut explanations = Vec::with_capacity(graphs.len());
        for (i, (graph, node_imp)) in graphs.iter().zip(node_imps).enumerate() {
            if node_imp.len() != graph.num_nodes() {
                return Err(ShapeGraphError::ShapeMismatch(format!(
                    "Num: {}, Shapes: {} vs. {}",
                    i,
                    node_imp.len(),
                    graph.num_nodes()
                )));
            }
            if let Some(edge_attr) = &graph.edge_attr {
                if edge_attr.nrows() != graph.edge_index.len() {
                    return Err(ShapeGraphError::ShapeMismatch(format!(
                        "Num: {}, edge attributes: {} vs. {} edges",
                        i,
                        edge_attr.nrows(),
                        graph.edge_index.len()
                    )));
                }
            }
            let mask: Vec<bool> = node_imp.iter().map(|&v| v != 0.0).collect();
            let edge_imp = edge_mask_from_node_mask(&mask, &graph.edge_index)?;
            explanations.push(
                Explanation::for_graph(graph.num_nodes(), graph.edge_index.clone())
                    .with_node_imp(node_imp)
                    .with_edge_imp(edge_imp),
            );
        }

        let name = name.into();
        info!(graphs = graphs.len(), "Assembled graph dataset {}", name);
        Ok(Self {
            name,
            graphs,
            explanations,
            external_ids,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<(&GraphSample, &Explanation)> {
        Some((self.graphs.get(i)?, self.explanations.get(i)?))
    }

    pub fn graphs(&self) -> &[GraphSample] {
        &self.graphs
    }

    pub fn explanations(&self) -> &[Explanation] {
        &self.explanations
    }

    pub fn external_id(&self, i: usize) -> Option<&str> {
        self.external_ids.get(i).map(String::as_str)
    }
}
