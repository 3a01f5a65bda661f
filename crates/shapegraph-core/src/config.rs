use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Motif planted into every subgraph of a [`ShapeGraphConfig`] dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotifKind {
    /// Square base with a triangle roof (5 nodes, 6 edges).
    #[default]
    House,
    /// 5-member ring.
    Circle,
    /// Arbitrary pattern given as an edge list over `0..num_nodes`.
    Custom {
        num_nodes: usize,
        edges: Vec<(usize, usize)>,
    },
}

/// How subgraphs are wired into one host graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationVariant {
    /// Anchors and inter-subgraph endpoints drawn uniformly; subgraphs use `base_graph`.
    Uniform,
    /// Anchors and inter-subgraph endpoints drawn proportionally to degree;
    /// subgraphs are always Barabási–Albert trees.
    #[default]
    PreferentialAttachment,
}

/// Random family used for each base subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseGraph {
    BarabasiAlbert {
        #[serde(default = "default_ba_edges")]
        m: usize,
    },
    ErdosRenyi {
        edge_prob: f64,
    },
}

impl Default for BaseGraph {
    fn default() -> Self {
        BaseGraph::BarabasiAlbert {
            m: default_ba_edges(),
        }
    }
}

/// Full description of a `ShapeGraph` dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeGraphConfig {
    /// Number of layers of the GNN being explained; radius of ground-truth explanations
    #[serde(default = "default_model_layers")]
    pub model_layers: usize,

    #[serde(default)]
    pub shape: MotifKind,

    /// Seed for topology and features. `None` draws one from entropy at build time.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_true")]
    pub make_explanations: bool,

    #[serde(default)]
    pub variant: GenerationVariant,

    /// Number of subgraphs stitched together. Each receives one motif.
    #[serde(default = "default_num_subgraphs")]
    pub num_subgraphs: usize,

    /// Probability of connecting any two subgraphs
    #[serde(default = "default_prob_connection")]
    pub prob_connection: f64,

    /// Base nodes per subgraph, motif nodes not included
    #[serde(default = "default_subgraph_size")]
    pub subgraph_size: usize,

    /// Only honoured by the uniform variant
    #[serde(default)]
    pub base_graph: BaseGraph,

    /// Edges added per connected subgraph pair
    #[serde(default = "default_inter_sg_connections")]
    pub inter_sg_connections: usize,

    #[serde(default = "default_true")]
    pub verify: bool,

    #[serde(default = "default_max_tries_verification")]
    pub max_tries_verification: usize,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub labels: LabelConfig,

    #[serde(default)]
    pub splits: SplitConfig,
}

impl Default for ShapeGraphConfig {
    fn default() -> Self {
        Self {
            model_layers: default_model_layers(),
            shape: MotifKind::default(),
            seed: None,
            make_explanations: true,
            variant: GenerationVariant::default(),
            num_subgraphs: default_num_subgraphs(),
            prob_connection: default_prob_connection(),
            subgraph_size: default_subgraph_size(),
            base_graph: BaseGraph::default(),
            inter_sg_connections: default_inter_sg_connections(),
            verify: true,
            max_tries_verification: default_max_tries_verification(),
            features: FeatureConfig::default(),
            labels: LabelConfig::default(),
            splits: SplitConfig::default(),
        }
    }
}

/// Class-conditional Gaussian feature generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_n_features")]
    pub n_features: usize,

    #[serde(default = "default_n_informative")]
    pub n_informative: usize,

    #[serde(default = "default_class_sep")]
    pub class_sep: f64,

    #[serde(default = "default_n_clusters_per_class")]
    pub n_clusters_per_class: usize,

    /// Append a random binary column and hide it with a feature shuffle
    #[serde(default = "default_true")]
    pub add_sensitive_feature: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_features: default_n_features(),
            n_informative: default_n_informative(),
            class_sep: default_class_sep(),
            n_clusters_per_class: default_n_clusters_per_class(),
            add_sensitive_feature: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// A node is class 1 once this many distinct motifs sit in its 1-hop neighborhood
    #[serde(default = "default_min_shapes")]
    pub min_shapes: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            min_shapes: default_min_shapes(),
        }
    }
}

/// Train/test/valid sampling. Each mask is drawn independently, so masks may overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_split_seed")]
    pub seed: u64,

    #[serde(default = "default_train_fraction")]
    pub train: f64,

    #[serde(default = "default_test_fraction")]
    pub test: f64,

    #[serde(default = "default_valid_fraction")]
    pub valid: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: default_split_seed(),
            train: default_train_fraction(),
            test: default_test_fraction(),
            valid: default_valid_fraction(),
        }
    }
}

/// Regularization weights of one GNNExplainer mask
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskCoefficients {
    pub entropy: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GnnExplainerCoefficients {
    #[serde(default = "default_edge_coeffs")]
    pub edge: MaskCoefficients,
    #[serde(default = "default_feature_coeffs")]
    pub feature: MaskCoefficients,
}

impl Default for GnnExplainerCoefficients {
    fn default() -> Self {
        Self {
            edge: default_edge_coeffs(),
            feature: default_feature_coeffs(),
        }
    }
}

/// Settings shared by the explainer family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainerConfig {
    #[serde(default = "default_explainer_seed")]
    pub seed: u64,

    /// Optimization steps for mask-learning explainers
    #[serde(default = "default_num_epochs")]
    pub num_epochs: usize,

    #[serde(default = "default_learning_rate")]
    pub lr: f64,

    #[serde(default)]
    pub coeffs: GnnExplainerCoefficients,

    /// Also learn a feature mask before the edge mask
    #[serde(default)]
    pub get_feature_mask: bool,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            seed: default_explainer_seed(),
            num_epochs: default_num_epochs(),
            lr: default_learning_rate(),
            coeffs: GnnExplainerCoefficients::default(),
            get_feature_mask: false,
        }
    }
}

impl ExplainerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_epochs == 0 {
            return Err(ConfigError::ValidationError(
                "num_epochs must be at least 1".to_string(),
            ));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "lr must be a positive number, got {}",
                self.lr
            )));
        }
        for (name, c) in [("edge", self.coeffs.edge), ("feature", self.coeffs.feature)] {
            let valid = |w: f64| w.is_finite() && w >= 0.0;
            if !(valid(c.entropy) && valid(c.size)) {
                return Err(ConfigError::ValidationError(format!(
                    "{} mask coefficients must be finite and non-negative",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl ShapeGraphConfig {
    /// Parse a TOML document. Missing fields fall back to their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded ShapeGraph config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply `SHAPEGRAPH_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(seed) = env_parse::<u64>("SHAPEGRAPH_SEED") {
            self.seed = Some(seed);
        }
        if let Some(n) = env_parse::<usize>("SHAPEGRAPH_NUM_SUBGRAPHS") {
            self.num_subgraphs = n;
        }
        if let Some(n) = env_parse::<usize>("SHAPEGRAPH_SUBGRAPH_SIZE") {
            self.subgraph_size = n;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_layers == 0 {
            return Err(invalid("model_layers must be at least 1"));
        }
        if self.num_subgraphs == 0 {
            return Err(invalid("num_subgraphs must be at least 1"));
        }
        if self.subgraph_size < 2 {
            return Err(invalid("subgraph_size must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.prob_connection) {
            return Err(invalid(format!(
                "prob_connection must lie in [0, 1], got {}",
                self.prob_connection
            )));
        }
        if self.verify && self.max_tries_verification == 0 {
            return Err(invalid("max_tries_verification must be at least 1"));
        }
        match self.base_graph {
            BaseGraph::BarabasiAlbert { m } => {
                if m == 0 || m >= self.subgraph_size {
                    return Err(invalid(format!(
                        "barabasi_albert m must satisfy 1 <= m < subgraph_size, got m = {}",
                        m
                    )));
                }
            }
            BaseGraph::ErdosRenyi { edge_prob } => {
                if !(0.0..=1.0).contains(&edge_prob) {
                    return Err(invalid(format!(
                        "erdos_renyi edge_prob must lie in [0, 1], got {}",
                        edge_prob
                    )));
                }
            }
        }
        if let MotifKind::Custom { num_nodes, edges } = &self.shape {
            if *num_nodes < 2 {
                return Err(invalid("custom motif needs at least 2 nodes"));
            }
            if edges.is_empty() {
                return Err(invalid("custom motif needs at least one edge"));
            }
            for &(u, v) in edges {
                if u >= *num_nodes || v >= *num_nodes || u == v {
                    return Err(invalid(format!("custom motif edge ({}, {}) is invalid", u, v)));
                }
            }
        }
        self.features.validate()?;
        self.splits.validate()?;
        debug!("ShapeGraph config validated");
        Ok(())
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_informative == 0 || self.n_informative > self.n_features {
            return Err(invalid(format!(
                "n_informative must satisfy 1 <= n_informative <= n_features ({}), got {}",
                self.n_features, self.n_informative
            )));
        }
        if self.n_informative > 30 {
            return Err(invalid("n_informative above 30 is not supported"));
        }
        if self.n_clusters_per_class == 0 {
            return Err(invalid("n_clusters_per_class must be at least 1"));
        }
        // Two classes are the minimum a labeled dataset produces.
        if 2 * self.n_clusters_per_class > 1usize << self.n_informative {
            return Err(invalid(format!(
                "2 classes x {} clusters do not fit on a {}-dimensional hypercube",
                self.n_clusters_per_class, self.n_informative
            )));
        }
        if !self.class_sep.is_finite() || self.class_sep < 0.0 {
            return Err(invalid("class_sep must be a non-negative number"));
        }
        Ok(())
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, f) in [("train", self.train), ("test", self.test), ("valid", self.valid)] {
            if !(0.0..=1.0).contains(&f) {
                return Err(invalid(format!("{} fraction must lie in [0, 1], got {}", name, f)));
            }
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", key, raw);
            None
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_model_layers() -> usize {
    3
}
fn default_num_subgraphs() -> usize {
    10
}
fn default_prob_connection() -> f64 {
    1.0
}
fn default_subgraph_size() -> usize {
    13
}
fn default_ba_edges() -> usize {
    1
}
fn default_inter_sg_connections() -> usize {
    1
}
fn default_max_tries_verification() -> usize {
    5
}
fn default_n_features() -> usize {
    10
}
fn default_n_informative() -> usize {
    4
}
fn default_class_sep() -> f64 {
    1.0
}
fn default_n_clusters_per_class() -> usize {
    2
}
fn default_min_shapes() -> usize {
    2
}
fn default_split_seed() -> u64 {
    1234
}
fn default_train_fraction() -> f64 {
    0.7
}
fn default_test_fraction() -> f64 {
    0.25
}
fn default_valid_fraction() -> f64 {
    0.05
}
fn default_explainer_seed() -> u64 {
    0
}
fn default_num_epochs() -> usize {
    200
}
fn default_learning_rate() -> f64 {
    0.01
}
fn default_edge_coeffs() -> MaskCoefficients {
    MaskCoefficients {
        entropy: 1.0,
        size: 0.005,
    }
}
fn default_feature_coeffs() -> MaskCoefficients {
    MaskCoefficients {
        entropy: 0.1,
        size: 1.0,
    }
}
