//! The model under explanation.
//!
//! Explainers never look inside a model: they call `forward` and ask for
//! gradients of a log-probability. Gradients default to central finite
//! differences so any scoring function can be explained; models with
//! analytic gradients should override [`GnnModel::feature_gradient`] and
//! [`GnnModel::edge_gradient`].

use crate::EdgeIndex;
use ndarray::{Array1, Array2, ArrayView1, Axis};

const FD_STEP: f64 = 1e-5;

/// Which prediction a gradient or score refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTarget {
    /// Row of one node.
    Node(usize),
    /// Mean of all node rows.
    Graph,
}

pub trait GnnModel {
    /// Message-passing depth; the default explanation radius.
    fn num_layers(&self) -> usize;

    /// Unnormalized class scores, one row per node. `edge_weight`, when
    /// given, scales each message and has one entry per edge.
    fn forward(
        &self,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        edge_weight: Option<&Array1<f64>>,
    ) -> Array2<f64>;

    fn log_prob(
        &self,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        edge_weight: Option<&Array1<f64>>,
    ) -> Array2<f64> {
        log_softmax_rows(&self.forward(x, edge_index, edge_weight))
    }

    /// Argmax class of every node.
    fn predict(&self, x: &Array2<f64>, edge_index: &EdgeIndex) -> Vec<usize> {
        self.forward(x, edge_index, None)
            .axis_iter(Axis(0))
            .map(argmax)
            .collect()
    }

    /// Argmax class of the mean-pooled graph score.
    fn predict_graph(&self, x: &Array2<f64>, edge_index: &EdgeIndex) -> usize {
        let scores = self.forward(x, edge_index, None);
        match scores.mean_axis(Axis(0)) {
            Some(pooled) => argmax(pooled.view()),
            None => 0,
        }
    }

    /// `log p(class)` for `target`.
    fn objective(
        &self,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        edge_weight: &Array1<f64>,
        target: ScoreTarget,
        class: usize,
    ) -> f64 {
        let scores = self.forward(x, edge_index, Some(edge_weight));
        let row = match target {
            ScoreTarget::Node(n) => scores.row(n).to_owned(),
            ScoreTarget::Graph => match scores.mean_axis(Axis(0)) {
                Some(pooled) => pooled,
                None => return f64::NEG_INFINITY,
            },
        };
        log_softmax(row.view())[class]
    }

    /// `∂ objective / ∂ x`, same shape as `x`.
    fn feature_gradient(
        &self,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        edge_weight: &Array1<f64>,
        target: ScoreTarget,
        class: usize,
    ) -> Array2<f64> {
        let mut grad = Array2::zeros(x.raw_dim());
        let mut probe = x.clone();
        for ((i, j), g) in grad.indexed_iter_mut() {
            let orig = probe[[i, j]];
            probe[[i, j]] = orig + FD_STEP;
            let up = self.objective(&probe, edge_index, edge_weight, target, class);
            probe[[i, j]] = orig - FD_STEP;
            let down = self.objective(&probe, edge_index, edge_weight, target, class);
            probe[[i, j]] = orig;
            *g = (up - down) / (2.0 * FD_STEP);
        }
        grad
    }

    /// `∂ objective / ∂ edge_weight`, one entry per edge.
    fn edge_gradient(
        &self,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        edge_weight: &Array1<f64>,
        target: ScoreTarget,
        class: usize,
    ) -> Array1<f64> {
        let mut grad = Array1::zeros(edge_weight.len());
        let mut probe = edge_weight.clone();
        for (e, g) in grad.iter_mut().enumerate() {
            let orig = probe[e];
            probe[e] = orig + FD_STEP;
            let up = self.objective(x, edge_index, &probe, target, class);
            probe[e] = orig - FD_STEP;
            let down = self.objective(x, edge_index, &probe, target, class);
            probe[e] = orig;
            *g = (up - down) / (2.0 * FD_STEP);
        }
        grad
    }
}

pub fn log_softmax(row: ArrayView1<'_, f64>) -> Array1<f64> {
    let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let log_sum = row.mapv(|v| (v - max).exp()).sum().ln() + max;
    row.mapv(|v| v - log_sum)
}

pub fn softmax(row: ArrayView1<'_, f64>) -> Array1<f64> {
    log_softmax(row).mapv(f64::exp)
}

pub fn log_softmax_rows(scores: &Array2<f64>) -> Array2<f64> {
    let mut out = scores.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let normalized = log_softmax(row.view());
        row.assign(&normalized);
    }
    out
}

pub fn argmax(row: ArrayView1<'_, f64>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 {
                (i, v)
            } else {
                best
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// Score of class 0 is the weighted sum of incoming features; class 1 is fixed.
    struct SumModel;

    impl GnnModel for SumModel {
        fn num_layers(&self) -> usize {
            1
        }

        fn forward(
            &self,
            x: &Array2<f64>,
            edge_index: &EdgeIndex,
            edge_weight: Option<&Array1<f64>>,
        ) -> Array2<f64> {
            let mut out = Array2::zeros((x.nrows(), 2));
            for i in 0..x.nrows() {
                out[[i, 0]] = x.row(i).sum();
            }
            for (e, (src, dst)) in edge_index.iter().enumerate() {
                let w = edge_weight.map_or(1.0, |w| w[e]);
                out[[dst, 0]] += w * x.row(src).sum();
            }
            out
        }
    }

    #[test]
    fn log_softmax_normalizes() {
        let lp = log_softmax(array![1.0, 2.0, 3.0].view());
        assert_abs_diff_eq!(lp.mapv(f64::exp).sum(), 1.0, epsilon = 1e-12);
        assert_eq!(argmax(lp.view()), 2);
    }

    #[test]
    fn finite_difference_gradients_match_analytic() {
        let x = array![[0.2], [0.5]];
        let ei = EdgeIndex::new(vec![(0, 1)]);
        let w = array![1.0];
        let model = SumModel;

        // log p0 at node 1 = s - ln(e^s + 1) with s = x1 + w * x0
        let s: f64 = 0.5 + 0.2;
        let dlogp_ds = 1.0 - s.exp() / (s.exp() + 1.0);

        let gx = model.feature_gradient(&x, &ei, &w, ScoreTarget::Node(1), 0);
        assert_abs_diff_eq!(gx[[0, 0]], dlogp_ds, epsilon = 1e-6);
        assert_abs_diff_eq!(gx[[1, 0]], dlogp_ds, epsilon = 1e-6);

        let gw = model.edge_gradient(&x, &ei, &w, ScoreTarget::Node(1), 0);
        assert_abs_diff_eq!(gw[0], 0.2 * dlogp_ds, epsilon = 1e-6);
    }

    #[test]
    fn predict_takes_row_argmax() {
        let x = array![[1.0], [-1.0]];
        let ei = EdgeIndex::default();
        assert_eq!(SumModel.predict(&x, &ei), vec![0, 1]);
    }
}
