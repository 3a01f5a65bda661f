//! Score tables per (algorithm, dataset) and their summaries.

use serde::{Deserialize, Serialize};
use shapegraph_core::Result;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Distribution summary of one score list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub median: f64,
}

impl Summary {
    /// `None` when no finite score is present.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        let mut values: Vec<f64> = scores.iter().copied().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            values[count / 2]
        } else {
            (values[count / 2 - 1] + values[count / 2]) / 2.0
        };
        Some(Self {
            count,
            mean,
            std: var.sqrt(),
            median,
        })
    }
}

/// Scores keyed by algorithm short name, then dataset name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    scores: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, algorithm: &str, dataset: &str, score: f64) {
        self.entry(algorithm, dataset).push(score);
    }

    pub fn extend<I>(&mut self, algorithm: &str, dataset: &str, scores: I)
    where
        I: IntoIterator<Item = f64>,
    {
        self.entry(algorithm, dataset).extend(scores);
    }

    /// Register an algorithm that produced nothing for `dataset`.
    pub fn mark_missing(&mut self, algorithm: &str, dataset: &str) {
        self.entry(algorithm, dataset);
    }

    pub fn scores(&self, algorithm: &str, dataset: &str) -> Option<&[f64]> {
        self.scores
            .get(algorithm)?
            .get(dataset)
            .map(Vec::as_slice)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    pub fn summary(&self, algorithm: &str, dataset: &str) -> Option<Summary> {
        Summary::from_scores(self.scores(algorithm, dataset)?)
    }

    /// Summaries for `dataset` in the given algorithm order. Algorithms
    /// without results are left out.
    pub fn summaries(&self, dataset: &str, order: &[&str]) -> Vec<(String, Summary)> {
        order
            .iter()
            .filter_map(|&algorithm| match self.summary(algorithm, dataset) {
                Some(summary) => Some((algorithm.to_string(), summary)),
                None => {
                    debug!(algorithm, dataset, "No results, dropping from summary");
                    None
                }
            })
            .collect()
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!("Saved score table to {}", path.display());
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn entry(&mut self, algorithm: &str, dataset: &str) -> &mut Vec<f64> {
        self.scores
            .entry(algorithm.to_string())
            .or_default()
            .entry(dataset.to_string())
            .or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn summary_statistics() {
        let s = Summary::from_scores(&[4.0, 1.0, 3.0, 2.0, f64::NAN]).unwrap();
        assert_eq!(s.count, 4);
        assert_abs_diff_eq!(s.mean, 2.5);
        assert_abs_diff_eq!(s.median, 2.5);
        assert_abs_diff_eq!(s.std, 1.25f64.sqrt());
        assert!(Summary::from_scores(&[]).is_none());
    }

    #[test]
    fn missing_algorithms_are_dropped() {
        let mut table = ScoreTable::new();
        table.extend("rand", "small", [0.9, 0.8]);
        table.mark_missing("cam", "small");
        table.record("gnnex", "small", 0.3);

        let summaries = table.summaries("small", &["rand", "cam", "gnnex", "pgex"]);
        let names: Vec<&str> = summaries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["rand", "gnnex"]);
        assert_eq!(table.algorithms().count(), 3);
        assert_eq!(table.scores("cam", "small"), Some(&[][..]));
    }
}
