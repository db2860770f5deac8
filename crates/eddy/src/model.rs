//! Caller-facing input records.
//!
//! These are immutable inputs to [`crate::layout`]; the pipeline copies the identities it needs
//! into its own arena graph and never writes back into them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub links: Vec<FlowLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    /// Total order used to classify circular links when `sort_nodes` is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rank: None,
        }
    }

    pub fn with_rank(id: impl Into<String>, rank: f64) -> Self {
        Self {
            id: id.into(),
            rank: Some(rank),
        }
    }
}

/// A link endpoint: either a position in [`FlowGraph::nodes`] or a node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Index(usize),
    Id(String),
}

impl From<usize> for NodeRef {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for NodeRef {
    fn from(value: &str) -> Self {
        Self::Id(value.to_string())
    }
}

impl From<String> for NodeRef {
    fn from(value: String) -> Self {
        Self::Id(value)
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRef::Index(i) => write!(f, "#{i}"),
            NodeRef::Id(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: NodeRef,
    pub target: NodeRef,
    pub value: f64,
}

impl FlowLink {
    pub fn new(source: impl Into<NodeRef>, target: impl Into<NodeRef>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

impl FlowGraph {
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds a graph from `(source, target, value)` triples, creating nodes in first-appearance
    /// order.
    pub fn from_links<'a>(links: impl IntoIterator<Item = (&'a str, &'a str, f64)>) -> Self {
        let mut graph = FlowGraph::default();
        let mut seen: rustc_hash::FxHashSet<&'a str> = rustc_hash::FxHashSet::default();
        for (source, target, value) in links {
            for id in [source, target] {
                if seen.insert(id) {
                    graph.nodes.push(FlowNode::new(id));
                }
            }
            graph.links.push(FlowLink::new(source, target, value));
        }
        graph
    }
}
