#![forbid(unsafe_code)]

//! Sankey layout for flow graphs that may contain cycles.
//!
//! Links that close a cycle are routed as detours above or below the diagram instead of being
//! drawn backwards through the columns. The pipeline runs once per [`layout`] call:
//!
//! 1. [`graph::build`] resolves the caller records into an arena graph.
//! 2. [`cycles`] marks circular links and picks their detour side.
//! 3. [`columns`] assigns columns over the acyclic remainder.
//! 4. [`breadth`] scales values to pixels and places nodes vertically.
//! 5. [`links`] orders links within node stacks and builds every path.
//!
//! [`SankeyLayout::update`] re-runs only the size-dependent stages.

pub mod breadth;
pub mod columns;
pub mod csv;
pub mod cycles;
mod error;
pub mod graph;
pub mod links;
pub mod model;
mod normalize;
pub mod options;
pub mod path;
pub mod util;

pub use breadth::{LayoutState, Margins};
pub use error::{Error, Result};
pub use graph::{CircularLinkType, Graph, Link, Node};
pub use model::{FlowGraph, FlowLink, FlowNode, NodeRef};
pub use options::{Extent, LayoutOptions, NodeAlign, NodePadding};
pub use path::{CircularPathData, LinkPath, PathSegment, Point};

use options::LINK_SORTING_ITERATIONS;
use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLayout {
    pub graph: Graph,
    pub state: LayoutState,
}

impl SankeyLayout {
    pub fn nodes(&self) -> &[Node] {
        &self.graph.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.graph.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph.nodes.iter().find(|n| n.id == id)
    }

    /// Smallest box holding every node and every path point. Circular detours usually extend
    /// past the node area, so this can be larger than the inner extent.
    pub fn bounds(&self) -> Extent {
        let mut b = Extent::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        let mut include = |x: f64, y: f64| {
            b.x0 = b.x0.min(x);
            b.y0 = b.y0.min(y);
            b.x1 = b.x1.max(x);
            b.y1 = b.y1.max(y);
        };
        for n in &self.graph.nodes {
            include(n.x0, n.y0);
            include(n.x1, n.y1);
        }
        for l in &self.graph.links {
            for p in l.path.points() {
                include(p.x, p.y);
            }
        }
        if b.x0.is_finite() { b } else { self.state.outer }
    }
}

/// Lays out `input` inside `options.extent`.
///
/// Fails only when the input cannot be resolved into a graph; an empty graph yields an empty
/// layout.
pub fn layout(input: &FlowGraph, options: &LayoutOptions) -> Result<SankeyLayout> {
    let mut graph = graph::build(input)?;
    let span = tracing::debug_span!(
        "sankey_layout",
        nodes = graph.nodes.len(),
        links = graph.links.len()
    );
    let _guard = span.enter();

    if graph.is_empty() {
        let outer = options.extent;
        return Ok(SankeyLayout {
            graph,
            state: LayoutState {
                outer,
                inner: outer,
                padding: 0.0,
                ky: 0.0,
                margins: Margins::default(),
            },
        });
    }

    cycles::identify_circles(&mut graph, options.sort_nodes);
    graph.compute_node_values();
    columns::assign_columns(&mut graph, options.align);
    cycles::select_circular_link_types(&mut graph);

    let mut state = breadth::compute_node_breadths(&mut graph, options);
    links::compute_link_breadths(&mut graph);
    for _ in 0..LINK_SORTING_ITERATIONS {
        links::sort_source_links(&mut graph);
        links::sort_target_links(&mut graph);
        links::resolve_node_link_overlaps(&mut graph, &state);
        links::sort_source_links(&mut graph);
        links::sort_target_links(&mut graph);
    }

    breadth::resolve_residual_collisions(&mut graph, &state);
    breadth::fill_height(&mut graph, &mut state);
    links::sort_source_links(&mut graph);
    links::sort_target_links(&mut graph);
    links::compute_link_paths(&mut graph, &state, options.circular_link_gap);
    graph.debug_assert_finite("layout");

    Ok(SankeyLayout { graph, state })
}
