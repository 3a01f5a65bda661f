//! Small deterministic models for exercising explainers and metrics.

use crate::{EdgeIndex, GnnModel};
use ndarray::{Array1, Array2};

/// `layers` rounds of weighted mean aggregation (self loop included)
/// followed by a linear read-out `h · weight`.
#[derive(Debug, Clone)]
pub struct MeanConvModel {
    pub layers: usize,
    /// `[num_features x num_classes]`
    pub weight: Array2<f64>,
}

impl MeanConvModel {
    pub fn new(layers: usize, weight: Array2<f64>) -> Self {
        Self { layers, weight }
    }

    /// Class 1 scores the first feature, class 0 its negation.
    pub fn first_feature_detector(layers: usize, num_features: usize) -> Self {
        let mut weight = Array2::zeros((num_features, 2));
        weight[[0, 1]] = 1.0;
        weight[[0, 0]] = -1.0;
        Self { layers, weight }
    }
}

impl GnnModel for MeanConvModel {
    fn num_layers(&self) -> usize {
        self.layers
    }

    fn forward(
        &self,
        x: &Array2<f64>,
        edge_index: &EdgeIndex,
        edge_weight: Option<&Array1<f64>>,
    ) -> Array2<f64> {
        let mut h = x.clone();
        for _ in 0..self.layers {
            let mut acc = h.clone();
            let mut norm = Array1::<f64>::ones(h.nrows());
            for (e, (src, dst)) in edge_index.iter().enumerate() {
                let w = edge_weight.map_or(1.0, |w| w[e]);
                let msg = &h.row(src) * w;
                let mut row = acc.row_mut(dst);
                row += &msg;
                norm[dst] += w;
            }
            for (mut row, n) in acc.rows_mut().into_iter().zip(norm.iter()) {
                row /= *n;
            }
            h = acc;
        }
        h.dot(&self.weight)
    }
}
