use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use shapegraph_core::{
    k_hop_subgraph, Capabilities, Explainer, Explanation, GnnModel, GraphQuery, NodeQuery, Result,
};
use tracing::debug;

/// Baseline that ignores the model and returns Gaussian noise.
#[derive(Debug, Clone)]
pub struct RandomExplainer {
    rng: ChaCha8Rng,
}

impl RandomExplainer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn randn(&mut self, len: usize) -> Array1<f64> {
        (0..len).map(|_| StandardNormal.sample(&mut self.rng)).collect()
    }
}

impl Explainer for RandomExplainer {
    fn name(&self) -> &'static str {
        "RandomExplainer"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NODE_AND_GRAPH
    }

    fn explain_node(&mut self, model: &dyn GnnModel, query: &NodeQuery<'_>) -> Result<Explanation> {
        let num_hops = query.num_hops.unwrap_or_else(|| model.num_layers());
        let subgraph = k_hop_subgraph(query.node_idx, num_hops, query.edge_index, query.x.nrows())?;
        let feature_imp = self.randn(query.x.ncols());
        let edge_imp = self.randn(subgraph.num_edges());
        debug!(node = query.node_idx, edges = subgraph.num_edges(), "Random node explanation");

        Ok(Explanation::for_node(query.node_idx, subgraph)
            .with_feature_imp(feature_imp)
            .with_edge_imp(edge_imp))
    }

    fn explain_graph(&mut self, _model: &dyn GnnModel, query: &GraphQuery<'_>) -> Result<Explanation> {
        let num_nodes = query.x.nrows();
        let node_imp: Array1<f64> = (0..num_nodes)
            .map(|_| if self.rng.random_bool(0.5) { 1.0 } else { 0.0 })
            .collect();
        let feature_imp = self.randn(query.x.ncols());
        let edge_imp = self.randn(query.edge_index.len());

        Ok(Explanation::for_graph(num_nodes, query.edge_index.clone())
            .with_node_imp(node_imp)
            .with_feature_imp(feature_imp)
            .with_edge_imp(edge_imp))
    }
}
