use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use shapegraph_core::{ConfigError, MotifKind, Result, ShapeGraphError};

/// Small fixed pattern planted into host graphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "MotifRecord", try_from = "MotifRecord")]
pub struct Motif {
    name: String,
    graph: UnGraph<(), ()>,
}

#[derive(Serialize, Deserialize)]
struct MotifRecord {
    name: String,
    num_nodes: usize,
    edges: Vec<(usize, usize)>,
}

impl Motif {
    /// Square base `0-1-3-2` with roof node 4 over `2` and `3`.
    pub fn house() -> Self {
        Self::build(
            "house",
            5,
            &[(0, 1), (0, 2), (1, 3), (2, 3), (2, 4), (3, 4)],
        )
    }

    /// 5-cycle.
    pub fn circle() -> Self {
        Self::build("circle", 5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)])
    }

    pub fn from_edges(name: &str, num_nodes: usize, edges: &[(usize, usize)]) -> Result<Self> {
        if num_nodes < 2 || edges.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "motif '{}' needs at least 2 nodes and one edge",
                name
            ))
            .into());
        }
        if let Some(&(u, v)) = edges
            .iter()
            .find(|&&(u, v)| u >= num_nodes || v >= num_nodes || u == v)
        {
            return Err(ConfigError::ValidationError(format!(
                "motif '{}' has invalid edge ({}, {})",
                name, u, v
            ))
            .into());
        }
        Ok(Self::build(name, num_nodes, edges))
    }

    pub fn from_kind(kind: &MotifKind) -> Result<Self> {
        match kind {
            MotifKind::House => Ok(Self::house()),
            MotifKind::Circle => Ok(Self::circle()),
            MotifKind::Custom { num_nodes, edges } => Self::from_edges("custom", *num_nodes, edges),
        }
    }

    fn build(name: &str, num_nodes: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = UnGraph::with_capacity(num_nodes, edges.len());
        for _ in 0..num_nodes {
            graph.add_node(());
        }
        for &(u, v) in edges {
            graph.update_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }
        Self {
            name: name.to_string(),
            graph,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index(), b.index()))
            .collect()
    }

    pub fn graph(&self) -> &UnGraph<(), ()> {
        &self.graph
    }
}

impl From<Motif> for MotifRecord {
    fn from(motif: Motif) -> Self {
        MotifRecord {
            num_nodes: motif.num_nodes(),
            edges: motif.edges(),
            name: motif.name,
        }
    }
}

impl TryFrom<MotifRecord> for Motif {
    type Error = ShapeGraphError;

    fn try_from(record: MotifRecord) -> Result<Self> {
        Motif::from_edges(&record.name, record.num_nodes, &record.edges)
    }
}
