//! Edge lists and k-hop neighborhoods.
//!
//! [`EdgeIndex`] mirrors the `[2 x m]` edge tensors GNN libraries consume: a
//! list of directed `(src, dst)` pairs. Undirected graphs store both
//! directions. [`k_hop_subgraph`] extracts the induced neighborhood a
//! message-passing model with `k` layers can see.

use crate::{Result, ShapeGraphError};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeIndex {
    edges: Vec<(usize, usize)>,
}

impl EdgeIndex {
    /// Directed edges taken as given.
    pub fn new(edges: Vec<(usize, usize)>) -> Self {
        Self { edges }
    }

    /// Both directions of every edge, sorted and deduplicated. Self loops are dropped.
    pub fn undirected<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let set: BTreeSet<(usize, usize)> = edges
            .into_iter()
            .filter(|(u, v)| u != v)
            .flat_map(|(u, v)| [(u, v), (v, u)])
            .collect();
        Self {
            edges: set.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }

    pub fn as_slice(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// One past the largest node id referenced, 0 for an empty index.
    pub fn max_node(&self) -> usize {
        self.edges
            .iter()
            .map(|&(u, v)| u.max(v) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Incoming-neighbor lists: `adj[dst]` holds every `src` with an edge `src -> dst`.
    pub fn in_neighbors(&self, num_nodes: usize) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); num_nodes];
        for &(src, dst) in &self.edges {
            if dst < num_nodes {
                adj[dst].push(src);
            }
        }
        adj
    }

    /// Keep only edges with both ends in `subset` and renumber them to
    /// positions within `subset`. `subset` must be sorted.
    pub fn relabel(&self, subset: &[usize]) -> EdgeIndex {
        let local = |n: usize| subset.binary_search(&n).ok();
        EdgeIndex::new(
            self.edges
                .iter()
                .filter_map(|&(u, v)| Some((local(u)?, local(v)?)))
                .collect(),
        )
    }
}

/// Induced k-hop neighborhood of one node, in global node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KhopSubgraph {
    /// Nodes of the neighborhood, sorted ascending.
    pub nodes: Vec<usize>,
    /// Edges of the full index with both ends inside `nodes`, global ids.
    pub edge_index: EdgeIndex,
    /// Position of the query node within `nodes`.
    pub mapping: usize,
    /// One flag per edge of the full index: kept or not.
    pub edge_mask: Vec<bool>,
}

impl KhopSubgraph {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }

    /// Local position of a global node id.
    pub fn local_index(&self, node: usize) -> Option<usize> {
        self.nodes.binary_search(&node).ok()
    }

    /// Edge index renumbered to local positions.
    pub fn local_edge_index(&self) -> EdgeIndex {
        self.edge_index.relabel(&self.nodes)
    }

    /// Rows of `x` belonging to the neighborhood, in `nodes` order.
    pub fn gather_rows(&self, x: &Array2<f64>) -> Array2<f64> {
        x.select(Axis(0), &self.nodes)
    }
}

/// Nodes within `num_hops` of `node_idx` following edges `src -> dst`
/// backwards from the target, plus every edge among them.
pub fn k_hop_subgraph(
    node_idx: usize,
    num_hops: usize,
    edge_index: &EdgeIndex,
    num_nodes: usize,
) -> Result<KhopSubgraph> {
    if node_idx >= num_nodes {
        return Err(ShapeGraphError::NodeOutOfRange {
            node: node_idx,
            num_nodes,
        });
    }
    if edge_index.max_node() > num_nodes {
        return Err(ShapeGraphError::ShapeMismatch(format!(
            "edge index references node {} but graph has {} nodes",
            edge_index.max_node() - 1,
            num_nodes
        )));
    }

    let adj = edge_index.in_neighbors(num_nodes);
    let mut in_subset = vec![false; num_nodes];
    let mut queue = VecDeque::new();
    in_subset[node_idx] = true;
    queue.push_back((node_idx, 0usize));

    while let Some((current, depth)) = queue.pop_front() {
        if depth == num_hops {
            continue;
        }
        for &src in &adj[current] {
            if !in_subset[src] {
                in_subset[src] = true;
                queue.push_back((src, depth + 1));
            }
        }
    }

    let nodes: Vec<usize> = (0..num_nodes).filter(|&n| in_subset[n]).collect();
    let edge_mask: Vec<bool> = edge_index
        .iter()
        .map(|(u, v)| in_subset[u] && in_subset[v])
        .collect();
    let kept = edge_index
        .iter()
        .zip(&edge_mask)
        .filter(|(_, &keep)| keep)
        .map(|(e, _)| e)
        .collect();
    let mapping = nodes
        .binary_search(&node_idx)
        .map_err(|_| ShapeGraphError::InvalidOperation("query node lost from subset".into()))?;

    Ok(KhopSubgraph {
        nodes,
        edge_index: EdgeIndex::new(kept),
        mapping,
        edge_mask,
    })
}
