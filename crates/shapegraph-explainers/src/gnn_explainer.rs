//! GNNExplainer (Ying et al., 2019), node-level only.
//!
//! Soft masks are learned on the k-hop subgraph of the target by
//! minimizing
//!
//! ```text
//! -log p(label | masked input) + size * Σ σ(m) + entropy * mean(H(σ(m)))
//! ```
//!
//! with Adam. The feature mask (optional) is trained first with all edges
//! kept, then the edge mask with the raw features.

use crate::optim::Adam;
use crate::resolve_node_label;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use shapegraph_core::{
    k_hop_subgraph, Capabilities, EdgeIndex, Explainer, ExplainerConfig, Explanation, GnnModel,
    MaskCoefficients, NodeQuery, Result, ScoreTarget, ShapeGraphError,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GnnExplainer {
    config: ExplainerConfig,
    rng: ChaCha8Rng,
}

impl GnnExplainer {
    pub fn new(config: ExplainerConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    fn init_mask(&mut self, len: usize, std: f64) -> Result<Array1<f64>> {
        let normal = Normal::new(0.0, std)
            .map_err(|e| ShapeGraphError::InvalidOperation(format!("mask init: {}", e)))?;
        Ok((0..len).map(|_| normal.sample(&mut self.rng)).collect())
    }

    fn train_feature_mask(
        &mut self,
        model: &dyn GnnModel,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        target: ScoreTarget,
        label: usize,
    ) -> Result<Array1<f64>> {
        let mut mask = self.init_mask(x.ncols(), 0.1)?;
        let mut adam = Adam::new(mask.len(), self.config.lr);
        let weights = Array1::ones(edge_index.len());
        let coeffs = self.config.coeffs.feature;

        for epoch in 0..self.config.num_epochs {
            let a = mask.mapv(sigmoid);
            let h = x * &a.view().insert_axis(Axis(0));
            let grad_h = model.feature_gradient(&h, edge_index, &weights, target, label);
            // d(-log p)/da_j = -Σ_i ∂log p/∂h_ij · x_ij
            let grad_a = -(&grad_h * x).sum_axis(Axis(0));
            let grad = mask_gradient(&mask, &a, &grad_a, coeffs);
            adam.step(&mut mask, &grad);

            if epoch + 1 == self.config.num_epochs {
                let loss = mask_loss(
                    -model.objective(&h, edge_index, &weights, target, label),
                    &a,
                    coeffs,
                );
                debug!(epoch, loss, "Feature mask trained");
            }
        }
        Ok(mask.mapv(sigmoid))
    }

    fn train_edge_mask(
        &mut self,
        model: &dyn GnnModel,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        target: ScoreTarget,
        label: usize,
    ) -> Result<Array1<f64>> {
        let num_nodes = x.nrows().max(1) as f64;
        let std = 2f64.sqrt() * (2.0 / (2.0 * num_nodes)).sqrt();
        let mut mask = self.init_mask(edge_index.len(), std)?;
        let mut adam = Adam::new(mask.len(), self.config.lr);
        let coeffs = self.config.coeffs.edge;

        for epoch in 0..self.config.num_epochs {
            let a = mask.mapv(sigmoid);
            let grad_a = -model.edge_gradient(x, edge_index, &a, target, label);
            let grad = mask_gradient(&mask, &a, &grad_a, coeffs);
            adam.step(&mut mask, &grad);

            if epoch + 1 == self.config.num_epochs {
                let loss = mask_loss(-model.objective(x, edge_index, &a, target, label), &a, coeffs);
                debug!(epoch, loss, "Edge mask trained");
            }
        }
        Ok(mask.mapv(sigmoid))
    }
}

impl Explainer for GnnExplainer {
    fn name(&self) -> &'static str {
        "GNNExplainer"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NODE_ONLY
    }

    fn explain_node(&mut self, model: &dyn GnnModel, query: &NodeQuery<'_>) -> Result<Explanation> {
        let label = resolve_node_label(model, query)?;
        let num_hops = query.num_hops.unwrap_or_else(|| model.num_layers());
        let subgraph = k_hop_subgraph(query.node_idx, num_hops, query.edge_index, query.x.nrows())?;

        let sub_x = subgraph.gather_rows(query.x);
        let sub_ei = subgraph.local_edge_index();
        let target = ScoreTarget::Node(subgraph.mapping);

        let feature_imp = if self.config.get_feature_mask {
            Some(self.train_feature_mask(model, &sub_x, &sub_ei, target, label)?)
        } else {
            None
        };
        let edge_imp = self.train_edge_mask(model, &sub_x, &sub_ei, target, label)?;

        // A node is as important as its strongest incident edge.
        let mut node_imp = Array1::<f64>::zeros(subgraph.num_nodes());
        for ((u, v), &w) in sub_ei.iter().zip(edge_imp.iter()) {
            node_imp[u] = node_imp[u].max(w);
            node_imp[v] = node_imp[v].max(w);
        }

        let mut explanation = Explanation::for_node(query.node_idx, subgraph)
            .with_node_imp(node_imp)
            .with_edge_imp(edge_imp);
        if let Some(feature_imp) = feature_imp {
            explanation = explanation.with_feature_imp(feature_imp);
        }
        Ok(explanation)
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// Gradient of the full objective w.r.t. the raw mask, given the gradient
/// of the prediction term w.r.t. `a = σ(mask)`.
fn mask_gradient(
    mask: &Array1<f64>,
    a: &Array1<f64>,
    grad_pred: &Array1<f64>,
    coeffs: MaskCoefficients,
) -> Array1<f64> {
    let len = mask.len().max(1) as f64;
    let mut grad = Array1::zeros(mask.len());
    for (i, g) in grad.iter_mut().enumerate() {
        let da = a[i] * (1.0 - a[i]);
        // dH(σ(m))/dm = ln((1 - a) / a) · σ'(m) = -m · σ'(m)
        let entropy = -mask[i] * da;
        *g = (grad_pred[i] + coeffs.size) * da + coeffs.entropy * entropy / len;
    }
    grad
}

fn mask_loss(pred_loss: f64, a: &Array1<f64>, coeffs: MaskCoefficients) -> f64 {
    let entropy = a
        .mapv(|p| -p * (p + 1e-15).ln() - (1.0 - p) * (1.0 - p + 1e-15).ln())
        .mean()
        .unwrap_or(0.0);
    pred_loss + coeffs.size * a.sum() + coeffs.entropy * entropy
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn mask_gradient_matches_finite_difference() {
        let coeffs = MaskCoefficients {
            entropy: 1.0,
            size: 0.005,
        };
        let mask = array![0.3, -1.2, 2.0];
        let grad_pred = array![0.0, 0.0, 0.0];
        let a = mask.mapv(sigmoid);
        let analytic = mask_gradient(&mask, &a, &grad_pred, coeffs);

        let eps = 1e-6;
        for i in 0..mask.len() {
            let mut up = mask.clone();
            up[i] += eps;
            let mut down = mask.clone();
            down[i] -= eps;
            let numeric = (mask_loss(0.0, &up.mapv(sigmoid), coeffs)
                - mask_loss(0.0, &down.mapv(sigmoid), coeffs))
                / (2.0 * eps);
            assert_abs_diff_eq!(analytic[i], numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn sigmoid_is_bounded() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(50.0) <= 1.0);
        assert!(sigmoid(-50.0) >= 0.0);
    }
}
