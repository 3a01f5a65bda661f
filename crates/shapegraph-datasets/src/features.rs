//! Class-conditional node features and their ground-truth importance.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use shapegraph_core::{ConfigError, FeatureConfig, Result, ShapeGraphError};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    /// `[num_nodes x num_features]`
    pub x: Array2<f64>,
    /// 1 on informative dimensions, 0 elsewhere.
    pub feature_imp: Array1<f64>,
}

/// Gaussian clusters on hypercube vertices, `n_clusters_per_class` per class.
///
/// The first `n_informative` columns carry the class signal; the remaining
/// ones are standard normal noise.
pub fn gaussian_lv_generator<R: Rng + ?Sized>(
    labels: &[usize],
    config: &FeatureConfig,
    rng: &mut R,
) -> Result<FeatureSet> {
    config.validate()?;
    let n_inf = config.n_informative;
    let n_classes = labels.iter().copied().max().map_or(2, |m| (m + 1).max(2));
    let n_clusters = n_classes * config.n_clusters_per_class;
    if n_clusters > 1usize << n_inf {
        return Err(ShapeGraphError::Config(ConfigError::ValidationError(format!(
            "{} classes x {} clusters do not fit on a {}-dimensional hypercube",
            n_classes, config.n_clusters_per_class, n_inf
        ))));
    }

    let vertices = rand::seq::index::sample(rng, 1usize << n_inf, n_clusters);
    let centroids: Vec<Array1<f64>> = vertices
        .iter()
        .map(|v| {
            (0..n_inf)
                .map(|bit| {
                    if (v >> bit) & 1 == 1 {
                        config.class_sep
                    } else {
                        -config.class_sep
                    }
                })
                .collect()
        })
        .collect();
    let covariances: Vec<Array2<f64>> = (0..n_clusters)
        .map(|_| Array2::from_shape_simple_fn((n_inf, n_inf), || rng.random_range(-1.0..1.0)))
        .collect();

    let mut x = Array2::zeros((labels.len(), config.n_features));
    for (mut row, &label) in x.axis_iter_mut(Axis(0)).zip(labels) {
        let cluster = label * config.n_clusters_per_class
            + rng.random_range(0..config.n_clusters_per_class);
        let z: Array1<f64> = (0..n_inf).map(|_| StandardNormal.sample(rng)).collect();
        let informative = z.dot(&covariances[cluster]) + &centroids[cluster];
        for (j, v) in informative.iter().enumerate() {
            row[j] = *v;
        }
        for j in n_inf..config.n_features {
            row[j] = StandardNormal.sample(rng);
        }
    }

    let feature_imp = (0..config.n_features)
        .map(|j| if j < n_inf { 1.0 } else { 0.0 })
        .collect();
    Ok(FeatureSet { x, feature_imp })
}

/// Column permutation hiding the sensitive attribute.
///
/// Column `j` before the shuffle sits at `permutation[j]` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveShuffle {
    pub permutation: Vec<usize>,
    /// Column of the sensitive attribute after shuffling.
    pub sensitive_index: usize,
}

impl SensitiveShuffle {
    pub fn apply(&self, features: &FeatureSet) -> Result<FeatureSet> {
        self.check(features)?;
        let mut x = Array2::zeros(features.x.raw_dim());
        let mut imp = Array1::zeros(features.feature_imp.len());
        for (j, &to) in self.permutation.iter().enumerate() {
            x.column_mut(to).assign(&features.x.column(j));
            imp[to] = features.feature_imp[j];
        }
        Ok(FeatureSet { x, feature_imp: imp })
    }

    pub fn invert(&self, features: &FeatureSet) -> Result<FeatureSet> {
        self.check(features)?;
        let mut x = Array2::zeros(features.x.raw_dim());
        let mut imp = Array1::zeros(features.feature_imp.len());
        for (j, &from) in self.permutation.iter().enumerate() {
            x.column_mut(j).assign(&features.x.column(from));
            imp[j] = features.feature_imp[from];
        }
        Ok(FeatureSet { x, feature_imp: imp })
    }

    fn check(&self, features: &FeatureSet) -> Result<()> {
        let d = self.permutation.len();
        if features.x.ncols() != d || features.feature_imp.len() != d {
            return Err(ShapeGraphError::ShapeMismatch(format!(
                "permutation covers {} columns, features have {} columns and {} weights",
                d,
                features.x.ncols(),
                features.feature_imp.len()
            )));
        }
        Ok(())
    }
}

/// Append a Bernoulli(0.5) column with zero importance, then shuffle
/// features and weights with one shared permutation.
pub fn add_sensitive_feature<R: Rng + ?Sized>(
    features: &FeatureSet,
    rng: &mut R,
) -> Result<(FeatureSet, SensitiveShuffle)> {
    let n = features.x.nrows();
    let d = features.x.ncols();
    let sensitive: Array1<f64> = (0..n)
        .map(|_| if rng.random_bool(0.5) { 1.0 } else { 0.0 })
        .collect();

    let mut x = Array2::zeros((n, d + 1));
    x.slice_mut(ndarray::s![.., ..d]).assign(&features.x);
    x.column_mut(d).assign(&sensitive);
    let mut feature_imp = Array1::zeros(d + 1);
    feature_imp
        .slice_mut(ndarray::s![..d])
        .assign(&features.feature_imp);

    let mut permutation: Vec<usize> = (0..=d).collect();
    permutation.shuffle(rng);
    let shuffle = SensitiveShuffle {
        sensitive_index: permutation[d],
        permutation,
    };
    let shuffled = shuffle.apply(&FeatureSet { x, feature_imp })?;
    Ok((shuffled, shuffle))
}
