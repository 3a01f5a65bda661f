//! Random base graphs.
//!
//! Generators return edge lists over `0..n`; callers offset them into a
//! larger host graph.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Barabási–Albert preferential attachment.
///
/// Starts from a star on `m + 1` nodes; every later node attaches to `m`
/// distinct existing nodes drawn proportionally to degree. `m = 1` yields a tree.
pub fn barabasi_albert<R: Rng + ?Sized>(n: usize, m: usize, rng: &mut R) -> Vec<(usize, usize)> {
    if m == 0 || n <= m {
        return Vec::new();
    }

    let mut edges: Vec<(usize, usize)> = (1..=m).map(|leaf| (0, leaf)).collect();
    // Each node appears once per incident edge.
    let mut repeated: Vec<usize> = Vec::with_capacity(2 * n * m);
    repeated.extend(std::iter::repeat(0).take(m));
    repeated.extend(1..=m);

    for source in (m + 1)..n {
        let mut targets = BTreeSet::new();
        while targets.len() < m {
            if let Some(&t) = repeated.choose(rng) {
                targets.insert(t);
            }
        }
        for &t in &targets {
            edges.push((source, t));
            repeated.push(t);
        }
        repeated.extend(std::iter::repeat(source).take(m));
    }
    edges
}

/// G(n, p): every pair independently with probability `edge_prob`.
pub fn erdos_renyi<R: Rng + ?Sized>(n: usize, edge_prob: f64, rng: &mut R) -> Vec<(usize, usize)> {
    let p = edge_prob.clamp(0.0, 1.0);
    let mut edges = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.random_bool(p) {
                edges.push((u, v));
            }
        }
    }
    edges
}

/// Draw one candidate proportionally to `weights`; uniform when every weight is zero.
pub(crate) fn weighted_choice<R: Rng + ?Sized>(
    candidates: &[usize],
    weights: &[f64],
    rng: &mut R,
) -> Option<usize> {
    match WeightedIndex::new(weights) {
        Ok(dist) => candidates.get(dist.sample(rng)).copied(),
        Err(_) => candidates.choose(rng).copied(),
    }
}
