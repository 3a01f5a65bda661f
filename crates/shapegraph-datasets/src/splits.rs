use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shapegraph_core::SplitConfig;

/// Train/test/valid node masks.
///
/// Each mask is sampled on its own from the split stream, so a node can
/// belong to several of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMasks {
    pub train: Vec<bool>,
    pub test: Vec<bool>,
    pub valid: Vec<bool>,
}

impl SplitMasks {
    /// Draw `floor(n * fraction)` nodes without replacement per mask, using a
    /// generator seeded from `config.seed` alone.
    pub fn sample(num_nodes: usize, config: &SplitConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let train = draw_mask(num_nodes, config.train, &mut rng);
        let test = draw_mask(num_nodes, config.test, &mut rng);
        let valid = draw_mask(num_nodes, config.valid, &mut rng);
        Self { train, test, valid }
    }

    pub fn train_count(&self) -> usize {
        count(&self.train)
    }

    pub fn test_count(&self) -> usize {
        count(&self.test)
    }

    pub fn valid_count(&self) -> usize {
        count(&self.valid)
    }

    /// Nodes present in more than one mask.
    pub fn overlap(&self) -> usize {
        (0..self.train.len())
            .filter(|&i| {
                usize::from(self.train[i]) + usize::from(self.test[i]) + usize::from(self.valid[i])
                    > 1
            })
            .count()
    }

    pub fn train_nodes(&self) -> Vec<usize> {
        indices(&self.train)
    }

    pub fn test_nodes(&self) -> Vec<usize> {
        indices(&self.test)
    }

    pub fn valid_nodes(&self) -> Vec<usize> {
        indices(&self.valid)
    }
}

/// `floor(n * fraction)`, computed in floating point.
pub fn split_size(num_nodes: usize, fraction: f64) -> usize {
    ((num_nodes as f64) * fraction) as usize
}

fn draw_mask(num_nodes: usize, fraction: f64, rng: &mut ChaCha8Rng) -> Vec<bool> {
    let amount = split_size(num_nodes, fraction).min(num_nodes);
    let mut mask = vec![false; num_nodes];
    for i in rand::seq::index::sample(rng, num_nodes, amount) {
        mask[i] = true;
    }
    mask
}

fn count(mask: &[bool]) -> usize {
    mask.iter().filter(|&&m| m).count()
}

fn indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &m)| m.then_some(i))
        .collect()
}
