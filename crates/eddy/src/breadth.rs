//! Vertical placement of nodes ("breadths").
//!
//! The flow is: resolve padding and the value-to-pixel scale `ky`, reserve margins for circular
//! link detours, seed positions, relax toward neighbours for a fixed number of passes, and finally
//! sweep out any overlap. Everything that varies per call is carried in [`LayoutState`].

use crate::graph::{CircularLinkType, Graph};
use crate::options::{
    ALPHA_DECAY, BASE_RADIUS, Extent, LayoutOptions, NodePadding, SCALE_DAMPING, VERTICAL_MARGIN,
};
use crate::util::{f64_cmp, mean};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Space reserved around the node area for circular link detours.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Per-call scale and margin state, threaded explicitly through the stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutState {
    /// Caller-supplied bounding box.
    pub outer: Extent,
    /// Node area after margin reservation.
    pub inner: Extent,
    pub padding: f64,
    pub ky: f64,
    pub margins: Margins,
}

pub fn resolve_padding(columns: &[Vec<usize>], padding: NodePadding, height: f64) -> f64 {
    match padding {
        NodePadding::Fixed(p) => p.max(0.0),
        NodePadding::Ratio(ratio) => {
            let p = columns
                .iter()
                .map(|c| height * ratio / (c.len() as f64 + 1.0))
                .fold(f64::INFINITY, f64::min);
            if p.is_finite() { p.max(0.0) } else { 0.0 }
        }
    }
}

/// Largest `ky` letting every column fit its values plus padding into `height`.
///
/// Columns whose total value is zero do not constrain the scale; they are laid out with an even
/// height share instead. Returns 0 when no column carries any value.
pub fn compute_scale(graph: &Graph, columns: &[Vec<usize>], height: f64, padding: f64) -> f64 {
    let mut ky = f64::INFINITY;
    for col in columns {
        let sum_values: f64 = col.iter().map(|&ni| graph.nodes[ni].value).sum();
        if !(sum_values > 0.0) {
            continue;
        }
        let available = height - (col.len() as f64 - 1.0) * padding;
        ky = ky.min(available.max(0.0) / sum_values);
    }
    if ky.is_finite() { ky } else { 0.0 }
}

pub fn set_link_widths(graph: &mut Graph, ky: f64) {
    for link in &mut graph.links {
        link.width = link.value * ky;
    }
}

/// Sums circular link widths per side; a used side is widened by the arc radius and margin.
pub fn circle_margins(graph: &Graph) -> Margins {
    let max_column = graph.max_column();
    let mut m = Margins::default();
    for link in graph.links.iter().filter(|l| l.circular) {
        match link.circular_link_type {
            Some(CircularLinkType::Top) => m.top += link.width,
            _ => m.bottom += link.width,
        }
        if graph.nodes[link.target].column == 0 {
            m.left += link.width;
        }
        if graph.nodes[link.source].column == max_column {
            m.right += link.width;
        }
    }
    let pad = |w: f64| if w > 0.0 { w + VERTICAL_MARGIN + BASE_RADIUS } else { w };
    Margins {
        top: pad(m.top),
        bottom: pad(m.bottom),
        left: pad(m.left),
        right: pad(m.right),
    }
}

/// Shrinks `outer` so that the margins, scaled along with the content, fit around it.
///
/// Returns the inner extent and the vertical scale factor applied to the content.
pub fn scale_extent(outer: Extent, margins: &Margins) -> (Extent, f64) {
    let width = outer.width();
    let height = outer.height();
    let new_width = width + margins.left + margins.right;
    let new_height = height + margins.top + margins.bottom;
    let scale_x = if new_width > 0.0 { width / new_width } else { 1.0 };
    let scale_y = if new_height > 0.0 { height / new_height } else { 1.0 };
    let inner = Extent::new(
        outer.x0 + margins.left * scale_x,
        outer.y0 + margins.top * scale_y,
        outer.x1 - margins.right * scale_x,
        outer.y1 - margins.bottom * scale_y,
    );
    (inner, scale_y)
}

/// Places each node's fixed-width band by column inside `inner`.
pub fn assign_x_bands(graph: &mut Graph, inner: &Extent, node_width: f64) {
    let max_column = graph.max_column();
    let kx = if max_column == 0 {
        0.0
    } else {
        (inner.width() - node_width) / max_column as f64
    };
    for node in &mut graph.nodes {
        node.x0 = inner.x0 + node.column as f64 * kx;
        node.x1 = node.x0 + node_width;
    }
}

fn collision_class(graph: &Graph, node: usize) -> u8 {
    let n = &graph.nodes[node];
    match (n.part_of_cycle, n.circular_link_type) {
        (true, Some(CircularLinkType::Top)) => 0,
        (true, Some(CircularLinkType::Bottom)) => 2,
        _ => 1,
    }
}

/// Stacking order within a column: cycle nodes detouring above first, plain nodes, then cycle
/// nodes detouring below; each group by current top, then by index.
pub fn ascending_breadth(graph: &Graph, a: usize, b: usize) -> Ordering {
    collision_class(graph, a)
        .cmp(&collision_class(graph, b))
        .then_with(|| f64_cmp(graph.nodes[a].y0, graph.nodes[b].y0))
        .then_with(|| a.cmp(&b))
}

fn shift_node(graph: &mut Graph, node: usize, dy: f64) {
    let n = &mut graph.nodes[node];
    n.y0 += dy;
    n.y1 += dy;
}

pub fn initialize_node_breadths(graph: &mut Graph, columns: &[Vec<usize>], state: &LayoutState) {
    let inner = state.inner;
    let one_sided = state.margins.top == 0.0 || state.margins.bottom == 0.0;
    let column_count = columns.len();

    for (ci, column) in columns.iter().enumerate() {
        let n = column.len();
        let total: f64 = column.iter().map(|&ni| graph.nodes[ni].value).sum();
        let even_share = (!(total > 0.0)).then(|| {
            let available = inner.height() - (n as f64 - 1.0) * state.padding;
            available.max(0.0) / n as f64 * SCALE_DAMPING
        });
        let lone_end = n == 1 && (ci == 0 || ci + 1 == column_count);

        for (i, &ni) in column.iter().enumerate() {
            let offset = i as f64;
            let h = even_share.unwrap_or(graph.nodes[ni].value * state.ky);
            let node = &graph.nodes[ni];
            let y0 = if lone_end {
                inner.mid_y() - h / 2.0
            } else if node.part_of_cycle {
                if graph.non_self_linking_cycles(ni) == 0 {
                    inner.mid_y() + offset
                } else if node.circular_link_type == Some(CircularLinkType::Top) {
                    inner.y0 + offset
                } else {
                    inner.y1 - h - offset
                }
            } else if one_sided {
                inner.y0 + inner.height() / n as f64 * offset
            } else {
                inner.mid_y() - n as f64 / 2.0 + offset
            };
            let node = &mut graph.nodes[ni];
            node.y0 = y0;
            node.y1 = y0 + h;
        }
    }
}

/// One relaxation pass: move connected nodes toward the mean centre of their neighbours.
///
/// Nodes on a circular path through other nodes stay where initial placement leaned them; a
/// lone node in the first or last column is kept centred.
pub fn relax_left_and_right(
    graph: &mut Graph,
    columns: &[Vec<usize>],
    alpha: f64,
    state: &LayoutState,
) {
    let column_count = columns.len();
    for (ci, column) in columns.iter().enumerate() {
        let lone_end = column.len() == 1 && (ci == 0 || ci + 1 == column_count);
        for &ni in column {
            let node = &graph.nodes[ni];
            if node.source_links.is_empty() && node.target_links.is_empty() {
                continue;
            }
            if node.part_of_cycle && graph.non_self_linking_cycles(ni) > 0 {
                continue;
            }
            if lone_end {
                let h = node.breadth();
                let node = &mut graph.nodes[ni];
                node.y0 = state.inner.mid_y() - h / 2.0;
                node.y1 = state.inner.mid_y() + h / 2.0;
                continue;
            }

            let avg_target = mean(
                node.source_links
                    .iter()
                    .map(|&li| graph.nodes[graph.links[li].target].center()),
            );
            let avg_source = mean(
                node.target_links
                    .iter()
                    .map(|&li| graph.nodes[graph.links[li].source].center()),
            );
            let avg = match (avg_target, avg_source) {
                (Some(t), Some(s)) => (t + s) / 2.0,
                (Some(v), None) | (None, Some(v)) => v,
                (None, None) => continue,
            };
            let dy = (avg - node.center()) * alpha;
            shift_node(graph, ni, dy);
        }
    }
}

/// Sorts each column into stacking order, pushes overlapping nodes down, and pulls the column
/// back up if it ran past the bottom of the node area.
pub fn resolve_collisions(graph: &mut Graph, columns: &mut [Vec<usize>], state: &LayoutState) {
    let (y_top, y_bottom, py) = (state.inner.y0, state.inner.y1, state.padding);
    for column in columns.iter_mut() {
        column.sort_by(|&a, &b| ascending_breadth(graph, a, b));

        let mut y = y_top;
        for &ni in column.iter() {
            let dy = y - graph.nodes[ni].y0;
            if dy > 0.0 {
                shift_node(graph, ni, dy);
            }
            y = graph.nodes[ni].y1 + py;
        }

        let Some(&last) = column.last() else {
            continue;
        };
        let dy = y - py - y_bottom;
        if dy > 0.0 {
            shift_node(graph, last, -dy);
            let mut y = graph.nodes[last].y0;
            for &ni in column.iter().rev().skip(1) {
                let dy = graph.nodes[ni].y1 + py - y;
                if dy > 0.0 {
                    shift_node(graph, ni, -dy);
                }
                y = graph.nodes[ni].y0;
            }
        }
    }
}

/// Final sweep per column after nodes were nudged individually; leaves no overlap regardless of
/// earlier passes.
pub fn resolve_residual_collisions(graph: &mut Graph, state: &LayoutState) {
    let mut columns = graph.columns();
    resolve_collisions(graph, &mut columns, state);
}

/// Scale, margins, placement, relaxation and cleanup for every node.
pub fn compute_node_breadths(graph: &mut Graph, options: &LayoutOptions) -> LayoutState {
    let mut columns = graph.columns();
    let outer = options.extent;
    let padding = resolve_padding(&columns, options.node_padding, outer.height());

    let ky = compute_scale(graph, &columns, outer.height(), padding) * SCALE_DAMPING;
    set_link_widths(graph, ky);
    let margins = circle_margins(graph);
    let (inner, ratio) = scale_extent(outer, &margins);
    let ky = ky * ratio;
    set_link_widths(graph, ky);
    assign_x_bands(graph, &inner, options.node_width);

    let state = LayoutState {
        outer,
        inner,
        padding,
        ky,
        margins,
    };
    tracing::debug!(ky, padding, ?margins, "computed breadth scale");

    initialize_node_breadths(graph, &columns, &state);
    resolve_collisions(graph, &mut columns, &state);
    let mut alpha = 1.0;
    for _ in 0..options.iterations {
        alpha *= ALPHA_DECAY;
        relax_left_and_right(graph, &columns, alpha, &state);
        resolve_collisions(graph, &mut columns, &state);
    }
    resolve_residual_collisions(graph, &state);
    graph.debug_assert_finite("node breadths");
    state
}

/// Stretches the layout vertically to the full node area when margins were only reserved on one
/// side (or none); with detours both above and below the node area is already fully used.
///
/// Returns the applied ratio, if any.
pub fn fill_height(graph: &mut Graph, state: &mut LayoutState) -> Option<f64> {
    let has_type = |ty: CircularLinkType| {
        graph
            .links
            .iter()
            .any(|l| l.circular && l.circular_link_type == Some(ty))
    };
    if has_type(CircularLinkType::Top) && has_type(CircularLinkType::Bottom) {
        return None;
    }

    let min_y0 = graph
        .nodes
        .iter()
        .map(|n| n.y0)
        .fold(f64::INFINITY, f64::min);
    let max_y1 = graph
        .nodes
        .iter()
        .map(|n| n.y1)
        .fold(f64::NEG_INFINITY, f64::max);
    let current = max_y1 - min_y0;
    if !(current > 0.0) {
        return None;
    }

    let ratio = state.inner.height() / current;
    let top = state.inner.y0;
    for node in &mut graph.nodes {
        let h = node.breadth() * ratio;
        node.y0 = top + (node.y0 - min_y0) * ratio;
        node.y1 = node.y0 + h;
    }
    for link in &mut graph.links {
        link.y0 = top + (link.y0 - min_y0) * ratio;
        link.y1 = top + (link.y1 - min_y0) * ratio;
        link.width *= ratio;
    }
    state.ky *= ratio;
    graph.debug_assert_finite("fill height");
    tracing::debug!(ratio, "filled layout height");
    Some(ratio)
}
