//! Arena graph shared by every layout stage.
//!
//! The graph owns both nodes and links; links refer to nodes (and nodes to links) by index, so
//! there is no shared ownership and every stage is a plain `&mut Graph` transformation.

use crate::model::{FlowGraph, NodeRef};
use crate::path::{CircularPathData, LinkPath};
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircularLinkType {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
    pub source_links: Vec<usize>,
    pub target_links: Vec<usize>,
    pub value: f64,
    pub depth: usize,
    pub height: usize,
    pub column: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub part_of_cycle: bool,
    pub circular_link_type: Option<CircularLinkType>,
}

impl Node {
    fn new(id: String, index: usize, rank: Option<f64>) -> Self {
        Self {
            id,
            index,
            rank,
            source_links: Vec::new(),
            target_links: Vec::new(),
            value: 0.0,
            depth: 0,
            height: 0,
            column: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
            part_of_cycle: false,
            circular_link_type: None,
        }
    }

    pub fn center(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn breadth(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub width: f64,
    pub circular: bool,
    pub circular_link_id: Option<usize>,
    pub circular_link_type: Option<CircularLinkType>,
    pub y0: f64,
    pub y1: f64,
    pub path: LinkPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circular_path_data: Option<CircularPathData>,
}

impl Link {
    pub fn is_self_linking(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

/// Resolves caller records into an arena graph.
///
/// Adjacency lists are filled in link order; that order seeds every later stable sort.
pub fn build(input: &FlowGraph) -> Result<Graph> {
    let mut nodes: Vec<Node> = Vec::with_capacity(input.nodes.len());
    let mut node_by_id: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, n) in input.nodes.iter().enumerate() {
        if node_by_id.insert(n.id.as_str(), i).is_some() {
            return Err(Error::DuplicateNode { id: n.id.clone() });
        }
        nodes.push(Node::new(n.id.clone(), i, n.rank));
    }

    let resolve = |link: usize, r: &NodeRef| -> Result<usize> {
        let found = match r {
            NodeRef::Index(i) => (*i < nodes.len()).then_some(*i),
            NodeRef::Id(id) => node_by_id.get(id.as_str()).copied(),
        };
        found.ok_or_else(|| Error::MissingNode {
            link,
            node: r.to_string(),
        })
    };

    let mut links: Vec<Link> = Vec::with_capacity(input.links.len());
    for (i, l) in input.links.iter().enumerate() {
        let source = resolve(i, &l.source)?;
        let target = resolve(i, &l.target)?;
        if !(l.value.is_finite() && l.value >= 0.0) {
            return Err(Error::InvalidLinkValue {
                link: i,
                value: l.value,
            });
        }
        links.push(Link {
            index: i,
            source,
            target,
            value: l.value,
            width: 0.0,
            circular: false,
            circular_link_id: None,
            circular_link_type: None,
            y0: 0.0,
            y1: 0.0,
            path: LinkPath::default(),
            circular_path_data: None,
        });
    }

    for l in &links {
        nodes[l.source].source_links.push(l.index);
        nodes[l.target].target_links.push(l.index);
    }

    tracing::trace!(nodes = nodes.len(), links = links.len(), "built flow graph");
    Ok(Graph { nodes, links })
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node value is the larger of its inflow and outflow; also flags nodes touching a circular
    /// link.
    pub fn compute_node_values(&mut self) {
        let links = &self.links;
        for node in &mut self.nodes {
            let out_sum: f64 = node.source_links.iter().map(|&li| links[li].value).sum();
            let in_sum: f64 = node.target_links.iter().map(|&li| links[li].value).sum();
            node.value = out_sum.max(in_sum);
            node.part_of_cycle = node
                .source_links
                .iter()
                .chain(node.target_links.iter())
                .any(|&li| links[li].circular);
        }
    }

    pub fn max_column(&self) -> usize {
        self.nodes.iter().map(|n| n.column).max().unwrap_or(0)
    }

    /// Node indices grouped by column, each column in node order.
    pub fn columns(&self) -> Vec<Vec<usize>> {
        if self.nodes.is_empty() {
            return Vec::new();
        }
        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); self.max_column() + 1];
        for n in &self.nodes {
            columns[n.column].push(n.index);
        }
        columns
    }

    /// Circular links on `node` that are not self-loops, counting both directions.
    pub fn non_self_linking_cycles(&self, node: usize) -> usize {
        let n = &self.nodes[node];
        n.source_links
            .iter()
            .chain(n.target_links.iter())
            .filter(|&&li| self.links[li].circular && !self.links[li].is_self_linking())
            .count()
    }

    /// True when `link` is the only circular link leaving its source and the only one entering
    /// its target.
    pub fn only_circular_link(&self, link: usize) -> bool {
        let l = &self.links[link];
        let out_circular = self.nodes[l.source]
            .source_links
            .iter()
            .filter(|&&li| self.links[li].circular)
            .count();
        let in_circular = self.nodes[l.target]
            .target_links
            .iter()
            .filter(|&&li| self.links[li].circular)
            .count();
        out_circular <= 1 && in_circular <= 1
    }

    pub(crate) fn debug_assert_finite(&self, stage: &str) {
        for n in &self.nodes {
            debug_assert!(
                n.y0.is_finite() && n.y1.is_finite(),
                "{stage}: node {} has non-finite breadth",
                n.id
            );
        }
        for l in &self.links {
            debug_assert!(
                l.y0.is_finite() && l.y1.is_finite() && l.width.is_finite(),
                "{stage}: link {} has non-finite breadth",
                l.index
            );
        }
    }
}
