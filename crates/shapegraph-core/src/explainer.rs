use crate::{EdgeIndex, Explanation, GnnModel, Result, ShapeGraphError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Node,
    Graph,
    Link,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Node => "node",
            Granularity::Graph => "graph",
            Granularity::Link => "link",
        };
        write!(f, "{}", s)
    }
}

/// Granularities an explainer implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub node: bool,
    pub graph: bool,
    pub link: bool,
}

impl Capabilities {
    pub const NODE_ONLY: Capabilities = Capabilities {
        node: true,
        graph: false,
        link: false,
    };

    pub const NODE_AND_GRAPH: Capabilities = Capabilities {
        node: true,
        graph: true,
        link: false,
    };

    pub fn supports(&self, granularity: Granularity) -> bool {
        match granularity {
            Granularity::Node => self.node,
            Granularity::Graph => self.graph,
            Granularity::Link => self.link,
        }
    }
}

/// Explain the prediction for one node.
#[derive(Debug, Clone, Copy)]
pub struct NodeQuery<'a> {
    pub node_idx: usize,
    pub x: &'a Array2<f64>,
    pub edge_index: &'a EdgeIndex,
    /// Class to explain; the model's prediction when `None`.
    pub label: Option<usize>,
    /// Neighborhood radius; the model's layer count when `None`.
    pub num_hops: Option<usize>,
}

impl<'a> NodeQuery<'a> {
    pub fn new(node_idx: usize, x: &'a Array2<f64>, edge_index: &'a EdgeIndex) -> Self {
        Self {
            node_idx,
            x,
            edge_index,
            label: None,
            num_hops: None,
        }
    }

    pub fn with_label(mut self, label: usize) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_num_hops(mut self, num_hops: usize) -> Self {
        self.num_hops = Some(num_hops);
        self
    }
}

/// Explain a whole-graph prediction.
#[derive(Debug, Clone, Copy)]
pub struct GraphQuery<'a> {
    pub x: &'a Array2<f64>,
    pub edge_index: &'a EdgeIndex,
    pub label: Option<usize>,
}

/// Explain the prediction of a link `(src, dst)`.
#[derive(Debug, Clone, Copy)]
pub struct LinkQuery<'a> {
    pub x: &'a Array2<f64>,
    pub edge_index: &'a EdgeIndex,
    pub link: (usize, usize),
}

/// A request at any granularity, for callers that dispatch dynamically.
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    Node(NodeQuery<'a>),
    Graph(GraphQuery<'a>),
    Link(LinkQuery<'a>),
}

impl Query<'_> {
    pub fn granularity(&self) -> Granularity {
        match self {
            Query::Node(_) => Granularity::Node,
            Query::Graph(_) => Granularity::Graph,
            Query::Link(_) => Granularity::Link,
        }
    }
}

pub trait Explainer {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    fn explain_node(&mut self, model: &dyn GnnModel, query: &NodeQuery<'_>) -> Result<Explanation>;

    fn explain_graph(
        &mut self,
        _model: &dyn GnnModel,
        _query: &GraphQuery<'_>,
    ) -> Result<Explanation> {
        Err(unsupported(self.name(), Granularity::Graph))
    }

    fn explain_link(
        &mut self,
        _model: &dyn GnnModel,
        _query: &LinkQuery<'_>,
    ) -> Result<Explanation> {
        Err(unsupported(self.name(), Granularity::Link))
    }

    /// Check capabilities, then dispatch.
    fn explain(&mut self, model: &dyn GnnModel, query: &Query<'_>) -> Result<Explanation> {
        let granularity = query.granularity();
        if !self.capabilities().supports(granularity) {
            return Err(unsupported(self.name(), granularity));
        }
        match query {
            Query::Node(q) => self.explain_node(model, q),
            Query::Graph(q) => self.explain_graph(model, q),
            Query::Link(q) => self.explain_link(model, q),
        }
    }
}

pub fn unsupported(explainer: &'static str, granularity: Granularity) -> ShapeGraphError {
    ShapeGraphError::Unsupported {
        explainer,
        granularity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_flags() {
        assert!(Capabilities::NODE_ONLY.supports(Granularity::Node));
        assert!(!Capabilities::NODE_ONLY.supports(Granularity::Graph));
        assert!(Capabilities::NODE_AND_GRAPH.supports(Granularity::Graph));
        assert!(!Capabilities::NODE_AND_GRAPH.supports(Granularity::Link));
    }

    #[test]
    fn unsupported_error_names_granularity() {
        let err = unsupported("RandomExplainer", Granularity::Link);
        assert_eq!(
            err.to_string(),
            "RandomExplainer does not support link-level explanation"
        );
    }
}
