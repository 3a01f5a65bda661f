use crate::Granularity;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShapeGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Config error: {0}")]
    Config(#[from] crate::ConfigError),

    #[error(
        "Could not build a valid graph in {attempts} attempts; try different generation \
         parameters or a larger max_tries_verification"
    )]
    ConstructionExhausted { attempts: usize },

    #[error("{explainer} does not support {granularity}-level explanation")]
    Unsupported {
        explainer: &'static str,
        granularity: Granularity,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Node out of range: {node} (graph has {num_nodes} nodes)")]
    NodeOutOfRange { node: usize, num_nodes: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, ShapeGraphError>;
