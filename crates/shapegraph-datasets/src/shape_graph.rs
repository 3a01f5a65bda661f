use crate::features::{add_sensitive_feature, gaussian_lv_generator, SensitiveShuffle};
use crate::labels::bound_graph_label;
use crate::splits::SplitMasks;
use crate::verify::verify_motifs;
use crate::{HostGraph, HostGraphParams, Motif};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shapegraph_core::{
    k_hop_subgraph, EdgeIndex, Explanation, Result, ShapeGraphConfig, ShapeGraphError,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Node-classification dataset with planted motifs and ground-truth
/// explanations for every node.
///
/// Topology and features come from one generator seeded with [`seed`](Self::seed);
/// split masks come from a second generator seeded with `config.splits.seed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeGraph {
    config: ShapeGraphConfig,
    seed: u64,
    motif: Motif,
    host: HostGraph,
    x: Array2<f64>,
    y: Vec<usize>,
    edge_index: EdgeIndex,
    shape: Vec<u32>,
    feature_imp: Array1<f64>,
    sensitive: Option<SensitiveShuffle>,
    explanations: Option<Vec<Explanation>>,
    masks: SplitMasks,
    attempts: usize,
}

impl ShapeGraph {
    pub fn new(config: ShapeGraphConfig) -> Result<Self> {
        config.validate()?;
        let motif = Motif::from_kind(&config.shape)?;
        let seed = config.seed.unwrap_or_else(|| {
            let seed: u64 = rand::rng().random();
            info!(seed, "No seed configured, drew one from entropy");
            seed
        });
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let (host, attempts) = build_verified_host(&config, &motif, &mut rng)?;
        let y = bound_graph_label(&host, &config.labels);

        let features = gaussian_lv_generator(&y, &config.features, &mut rng)?;
        let (features, sensitive) = if config.features.add_sensitive_feature {
            let (shuffled, shuffle) = add_sensitive_feature(&features, &mut rng)?;
            debug!(index = shuffle.sensitive_index, "Shuffled in sensitive feature");
            (shuffled, Some(shuffle))
        } else {
            (features, None)
        };

        let masks = SplitMasks::sample(host.num_nodes(), &config.splits);
        let mut dataset = Self {
            seed,
            edge_index: host.edge_index(),
            shape: host.shapes(),
            x: features.x,
            feature_imp: features.feature_imp,
            y,
            sensitive,
            explanations: None,
            masks,
            attempts,
            motif,
            host,
            config,
        };

        if dataset.config.make_explanations {
            let explanations = (0..dataset.num_nodes())
                .map(|n| dataset.explanation_generator(n))
                .collect::<Result<Vec<_>>>()?;
            dataset.explanations = Some(explanations);
        }

        let counts = dataset.class_counts();
        info!(
            nodes = dataset.num_nodes(),
            edges = dataset.host.num_edges(),
            motifs = dataset.host.num_motifs(),
            attempts,
            ?counts,
            "Built ShapeGraph with {} motif",
            dataset.motif.name()
        );
        Ok(dataset)
    }

    /// Ground-truth explanation of `node_idx`.
    ///
    /// Nodes of the `model_layers`-hop neighborhood are important when they
    /// belong to a motif instance found within one hop of the target. Edges
    /// are important when both ends are; when the target lies outside every
    /// motif, its edges into important nodes are marked too.
    pub fn explanation_generator(&self, node_idx: usize) -> Result<Explanation> {
        let num_nodes = self.num_nodes();
        if node_idx >= num_nodes {
            return Err(ShapeGraphError::NodeOutOfRange {
                node: node_idx,
                num_nodes,
            });
        }

        let nearby = self.host.shapes_near(node_idx, 1);
        let subgraph = k_hop_subgraph(
            node_idx,
            self.config.model_layers,
            &self.edge_index,
            num_nodes,
        )?;

        let important: Vec<bool> = subgraph
            .nodes
            .iter()
            .map(|&n| nearby.contains(&self.shape[n]))
            .collect();
        let is_important = |n: usize| {
            subgraph
                .local_index(n)
                .map(|i| important[i])
                .unwrap_or(false)
        };
        let target_important = important[subgraph.mapping];

        let edge_imp: Array1<f64> = subgraph
            .edge_index
            .iter()
            .map(|(u, v)| {
                let (iu, iv) = (is_important(u), is_important(v));
                let touches_target = u == node_idx || v == node_idx;
                if (iu && iv) || ((iu || iv) && touches_target && !target_important) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let node_imp: Array1<f64> = important
            .iter()
            .map(|&b| if b { 1.0 } else { 0.0 })
            .collect();

        Ok(Explanation::for_node(node_idx, subgraph)
            .with_feature_imp(self.feature_imp.clone())
            .with_node_imp(node_imp)
            .with_edge_imp(edge_imp))
    }

    /// Cached explanation, when the dataset was built with `make_explanations`.
    pub fn explanation(&self, node_idx: usize) -> Option<&Explanation> {
        self.explanations.as_ref()?.get(node_idx)
    }

    pub fn explanations(&self) -> Option<&[Explanation]> {
        self.explanations.as_deref()
    }

    pub fn config(&self) -> &ShapeGraphConfig {
        &self.config
    }

    /// Seed the topology and feature stream actually used.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn motif(&self) -> &Motif {
        &self.motif
    }

    pub fn host(&self) -> &HostGraph {
        &self.host
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &[usize] {
        &self.y
    }

    /// Both directions of every host edge.
    pub fn edge_index(&self) -> &EdgeIndex {
        &self.edge_index
    }

    pub fn shapes(&self) -> &[u32] {
        &self.shape
    }

    pub fn feature_imp(&self) -> &Array1<f64> {
        &self.feature_imp
    }

    /// Column of the sensitive attribute, if one was shuffled in.
    pub fn sensitive_feature(&self) -> Option<usize> {
        self.sensitive.as_ref().map(|s| s.sensitive_index)
    }

    pub fn sensitive_shuffle(&self) -> Option<&SensitiveShuffle> {
        self.sensitive.as_ref()
    }

    pub fn masks(&self) -> &SplitMasks {
        &self.masks
    }

    /// Host graphs built before one passed verification, this one included.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn num_nodes(&self) -> usize {
        self.host.num_nodes()
    }

    pub fn num_features(&self) -> usize {
        self.x.ncols()
    }

    /// Nodes per class, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let num_classes = self.y.iter().copied().max().map_or(0, |m| m + 1);
        let mut counts = vec![0; num_classes];
        for &label in &self.y {
            counts[label] += 1;
        }
        counts
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| ShapeGraphError::Encoding(e.to_string()))?;
        writer.flush()?;
        info!("Saved ShapeGraph snapshot to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let dataset: Self =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| ShapeGraphError::Encoding(e.to_string()))?;
        info!(
            nodes = dataset.num_nodes(),
            "Loaded ShapeGraph snapshot from {}",
            path.display()
        );
        Ok(dataset)
    }
}

/// Build host graphs until one carries only the planted motif instances.
fn build_verified_host(
    config: &ShapeGraphConfig,
    motif: &Motif,
    rng: &mut ChaCha8Rng,
) -> Result<(HostGraph, usize)> {
    let params = HostGraphParams::from_config(config, motif);
    if !config.verify {
        return Ok((HostGraph::build(&params, rng), 1));
    }

    for attempt in 1..=config.max_tries_verification {
        let host = HostGraph::build(&params, rng);
        if verify_motifs(&host, motif) {
            return Ok((host, attempt));
        }
        warn!(
            attempt,
            max_tries = config.max_tries_verification,
            "Host graph failed motif verification, rebuilding"
        );
    }
    Err(ShapeGraphError::ConstructionExhausted {
        attempts: config.max_tries_verification,
    })
}
