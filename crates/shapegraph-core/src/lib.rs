pub mod config;
pub mod error;
pub mod explainer;
pub mod explanation;
pub mod graph;
pub mod model;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::*;
pub use error::*;
pub use explainer::*;
pub use explanation::*;
pub use graph::*;
pub use model::*;
