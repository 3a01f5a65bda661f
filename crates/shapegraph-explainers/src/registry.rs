use crate::{GnnExplainer, GradExplainer, RandomExplainer};
use serde::{Deserialize, Serialize};
use shapegraph_core::{Explainer, ExplainerConfig, Result};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown explainer '{0}', expected one of: rand, grad, gnnex")]
pub struct UnknownExplainer(pub String);

/// Explainers selectable by name, using the short names of score tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExplainerKind {
    #[serde(rename = "rand")]
    Random,
    #[serde(rename = "grad")]
    Grad,
    #[serde(rename = "gnnex")]
    GnnExplainer,
}

impl ExplainerKind {
    pub const ALL: [ExplainerKind; 3] = [
        ExplainerKind::Random,
        ExplainerKind::Grad,
        ExplainerKind::GnnExplainer,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            ExplainerKind::Random => "rand",
            ExplainerKind::Grad => "grad",
            ExplainerKind::GnnExplainer => "gnnex",
        }
    }

    pub fn build(&self, config: &ExplainerConfig) -> Result<Box<dyn Explainer>> {
        Ok(match self {
            ExplainerKind::Random => Box::new(RandomExplainer::new(config.seed)),
            ExplainerKind::Grad => Box::new(GradExplainer::new()),
            ExplainerKind::GnnExplainer => Box::new(GnnExplainer::new(config.clone())?),
        })
    }
}

impl fmt::Display for ExplainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ExplainerKind {
    type Err = UnknownExplainer;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rand" | "random" => Ok(ExplainerKind::Random),
            "grad" | "gradient" => Ok(ExplainerKind::Grad),
            "gnnex" | "gnnexplainer" => Ok(ExplainerKind::GnnExplainer),
            other => Err(UnknownExplainer(other.to_string())),
        }
    }
}
