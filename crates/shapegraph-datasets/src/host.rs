//! Host graph assembly: base subgraphs, one motif each, inter-subgraph edges.

use crate::generators::{barabasi_albert, erdos_renyi, weighted_choice};
use crate::Motif;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shapegraph_core::{
    BaseGraph, EdgeIndex, GenerationVariant, Result, ShapeGraphConfig, ShapeGraphError,
};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapeNode {
    /// 0 outside motifs, otherwise the 1-based motif instance id.
    pub shape: u32,
    /// Subgraph the node was generated in.
    pub subgraph: usize,
    /// Distinct motif ids within the annotated neighborhood radius.
    pub shapes_in_khop: usize,
}

/// Parameters of [`HostGraph::build`].
#[derive(Debug, Clone, Copy)]
pub struct HostGraphParams<'a> {
    pub motif: &'a Motif,
    pub num_subgraphs: usize,
    pub subgraph_size: usize,
    pub prob_connection: f64,
    pub inter_sg_connections: usize,
    pub num_hops: usize,
    pub base_graph: BaseGraph,
    pub variant: GenerationVariant,
}

impl<'a> HostGraphParams<'a> {
    pub fn from_config(config: &ShapeGraphConfig, motif: &'a Motif) -> Self {
        Self {
            motif,
            num_subgraphs: config.num_subgraphs,
            subgraph_size: config.subgraph_size,
            prob_connection: config.prob_connection,
            inter_sg_connections: config.inter_sg_connections,
            num_hops: 1,
            base_graph: config.base_graph,
            variant: config.variant,
        }
    }
}

/// Undirected graph with every node tagged by the motif instance it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "HostGraphRecord", try_from = "HostGraphRecord")]
pub struct HostGraph {
    graph: UnGraph<ShapeNode, ()>,
    anchors: Vec<usize>,
    num_motifs: u32,
    num_hops: usize,
}

#[derive(Serialize, Deserialize)]
struct HostGraphRecord {
    nodes: Vec<(u32, usize)>,
    edges: Vec<(usize, usize)>,
    anchors: Vec<usize>,
    num_motifs: u32,
    num_hops: usize,
}

impl HostGraph {
    /// Assemble a candidate host graph. Verification is the caller's job.
    pub fn build<R: Rng + ?Sized>(params: &HostGraphParams<'_>, rng: &mut R) -> Self {
        let motif = params.motif;
        let per_subgraph = params.subgraph_size + motif.num_nodes();
        let mut graph = UnGraph::with_capacity(params.num_subgraphs * per_subgraph, 0);
        let mut members: Vec<Vec<usize>> = Vec::with_capacity(params.num_subgraphs);
        let mut anchors = Vec::with_capacity(params.num_subgraphs);

        for s in 0..params.num_subgraphs {
            let offset = graph.node_count();
            let base_edges = match (params.variant, params.base_graph) {
                (GenerationVariant::PreferentialAttachment, _) => {
                    barabasi_albert(params.subgraph_size, 1, rng)
                }
                (GenerationVariant::Uniform, BaseGraph::BarabasiAlbert { m }) => {
                    barabasi_albert(params.subgraph_size, m, rng)
                }
                (GenerationVariant::Uniform, BaseGraph::ErdosRenyi { edge_prob }) => {
                    erdos_renyi(params.subgraph_size, edge_prob, rng)
                }
            };
            for _ in 0..params.subgraph_size {
                graph.add_node(ShapeNode {
                    shape: 0,
                    subgraph: s,
                    shapes_in_khop: 0,
                });
            }
            for (u, v) in base_edges {
                graph.update_edge(NodeIndex::new(offset + u), NodeIndex::new(offset + v), ());
            }

            let shape_id = s as u32 + 1;
            let motif_offset = graph.node_count();
            for _ in 0..motif.num_nodes() {
                graph.add_node(ShapeNode {
                    shape: shape_id,
                    subgraph: s,
                    shapes_in_khop: 0,
                });
            }
            for (u, v) in motif.edges() {
                graph.update_edge(
                    NodeIndex::new(motif_offset + u),
                    NodeIndex::new(motif_offset + v),
                    (),
                );
            }

            let base_nodes: Vec<usize> = (offset..motif_offset).collect();
            let anchor = pick_node(&graph, &base_nodes, params.variant, rng).unwrap_or(offset);
            let attach = motif_offset + rng.random_range(0..motif.num_nodes());
            graph.update_edge(NodeIndex::new(anchor), NodeIndex::new(attach), ());
            anchors.push(anchor);
            members.push((offset..graph.node_count()).collect());
        }

        let mut inter_edges = 0usize;
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                if !rng.random_bool(params.prob_connection) {
                    continue;
                }
                for _ in 0..params.inter_sg_connections {
                    let u = pick_node(&graph, &members[i], params.variant, rng);
                    let v = pick_node(&graph, &members[j], params.variant, rng);
                    if let (Some(u), Some(v)) = (u, v) {
                        graph.update_edge(NodeIndex::new(u), NodeIndex::new(v), ());
                        inter_edges += 1;
                    }
                }
            }
        }

        let mut host = Self {
            graph,
            anchors,
            num_motifs: params.num_subgraphs as u32,
            num_hops: params.num_hops,
        };
        host.annotate_shapes_in_khop();
        debug!(
            nodes = host.num_nodes(),
            edges = host.num_edges(),
            inter_edges,
            "Assembled candidate host graph"
        );
        host
    }

    /// Graph from explicit shape tags and edges. `num_motifs` is the largest tag.
    ///
    /// Fails on self loops and endpoints outside `shapes`.
    pub fn from_edges(shapes: &[u32], edges: &[(usize, usize)], num_hops: usize) -> Result<Self> {
        let nodes = shapes.iter().map(|&shape| ShapeNode {
            shape,
            subgraph: 0,
            shapes_in_khop: 0,
        });
        let num_motifs = shapes.iter().copied().max().unwrap_or(0);
        Self::assemble(nodes, edges, Vec::new(), num_motifs, num_hops)
    }

    /// Add an undirected edge and refresh neighborhood annotations.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<()> {
        check_edge(u, v, self.num_nodes())?;
        self.graph
            .update_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        self.annotate_shapes_in_khop();
        Ok(())
    }

    fn assemble(
        nodes: impl ExactSizeIterator<Item = ShapeNode>,
        edges: &[(usize, usize)],
        anchors: Vec<usize>,
        num_motifs: u32,
        num_hops: usize,
    ) -> Result<Self> {
        let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
        for node in nodes {
            graph.add_node(node);
        }
        let num_nodes = graph.node_count();
        for &(u, v) in edges {
            check_edge(u, v, num_nodes)?;
            graph.update_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }
        if let Some(&anchor) = anchors.iter().find(|&&a| a >= num_nodes) {
            return Err(ShapeGraphError::NodeOutOfRange {
                node: anchor,
                num_nodes,
            });
        }
        let mut host = Self {
            graph,
            anchors,
            num_motifs,
            num_hops,
        };
        host.annotate_shapes_in_khop();
        Ok(host)
    }

    pub fn graph(&self) -> &UnGraph<ShapeNode, ()> {
        &self.graph
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn num_motifs(&self) -> u32 {
        self.num_motifs
    }

    /// Base node each motif instance hangs from, indexed by `shape - 1`.
    pub fn anchors(&self) -> &[usize] {
        &self.anchors
    }

    pub fn node(&self, n: usize) -> ShapeNode {
        self.graph[NodeIndex::new(n)]
    }

    pub fn shape(&self, n: usize) -> u32 {
        self.graph[NodeIndex::new(n)].shape
    }

    pub fn shapes(&self) -> Vec<u32> {
        self.graph.node_weights().map(|w| w.shape).collect()
    }

    pub fn degree(&self, n: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(n)).count()
    }

    /// Undirected edges, each once as `(min, max)`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let set: BTreeSet<(usize, usize)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index().min(b.index()), a.index().max(b.index())))
            .collect();
        set.into_iter().collect()
    }

    pub fn edge_index(&self) -> EdgeIndex {
        EdgeIndex::undirected(self.edges())
    }

    /// Nodes within `hops` of `n`, `n` included, sorted.
    pub fn closed_neighborhood(&self, n: usize, hops: usize) -> Vec<usize> {
        let mut seen = vec![false; self.num_nodes()];
        let mut queue = VecDeque::new();
        seen[n] = true;
        queue.push_back((n, 0usize));
        while let Some((current, depth)) = queue.pop_front() {
            if depth == hops {
                continue;
            }
            for nb in self.graph.neighbors(NodeIndex::new(current)) {
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    queue.push_back((nb.index(), depth + 1));
                }
            }
        }
        (0..seen.len()).filter(|&i| seen[i]).collect()
    }

    /// Nonzero motif ids within `hops` of `n`.
    pub fn shapes_near(&self, n: usize, hops: usize) -> BTreeSet<u32> {
        self.closed_neighborhood(n, hops)
            .into_iter()
            .map(|m| self.shape(m))
            .filter(|&s| s != 0)
            .collect()
    }

    fn annotate_shapes_in_khop(&mut self) {
        let counts: Vec<usize> = (0..self.num_nodes())
            .map(|n| self.shapes_near(n, self.num_hops).len())
            .collect();
        for (n, count) in counts.into_iter().enumerate() {
            self.graph[NodeIndex::new(n)].shapes_in_khop = count;
        }
    }
}

fn check_edge(u: usize, v: usize, num_nodes: usize) -> Result<()> {
    if let Some(node) = [u, v].into_iter().find(|&n| n >= num_nodes) {
        return Err(ShapeGraphError::NodeOutOfRange { node, num_nodes });
    }
    if u == v {
        return Err(ShapeGraphError::InvalidOperation(format!(
            "self loop at node {}",
            u
        )));
    }
    Ok(())
}

fn pick_node<R: Rng + ?Sized>(
    graph: &UnGraph<ShapeNode, ()>,
    candidates: &[usize],
    variant: GenerationVariant,
    rng: &mut R,
) -> Option<usize> {
    match variant {
        GenerationVariant::Uniform => candidates.choose(rng).copied(),
        GenerationVariant::PreferentialAttachment => {
            let weights: Vec<f64> = candidates
                .iter()
                .map(|&n| graph.neighbors(NodeIndex::new(n)).count() as f64)
                .collect();
            weighted_choice(candidates, &weights, rng)
        }
    }
}

impl From<HostGraph> for HostGraphRecord {
    fn from(host: HostGraph) -> Self {
        HostGraphRecord {
            nodes: host
                .graph
                .node_weights()
                .map(|w| (w.shape, w.subgraph))
                .collect(),
            edges: host.edges(),
            anchors: host.anchors,
            num_motifs: host.num_motifs,
            num_hops: host.num_hops,
        }
    }
}

impl TryFrom<HostGraphRecord> for HostGraph {
    type Error = ShapeGraphError;

    fn try_from(record: HostGraphRecord) -> Result<Self> {
        let nodes = record.nodes.iter().map(|&(shape, subgraph)| ShapeNode {
            shape,
            subgraph,
            shapes_in_khop: 0,
        });
        HostGraph::assemble(
            nodes,
            &record.edges,
            record.anchors,
            record.num_motifs,
            record.num_hops,
        )
    }
}
