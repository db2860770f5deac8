//! Link ordering within node stacks, link offsets, and path construction.

use crate::breadth::{LayoutState, ascending_breadth};
use crate::graph::{CircularLinkType, Graph, Link};
use crate::options::{BASE_RADIUS, NODE_BUFFER, OVERLAP_CLEARANCE, VERTICAL_MARGIN};
use crate::path::{self, CircularPathData, Point};
use crate::util::{f64_cmp, insertion_sort_by};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Incline {
    Up,
    Down,
}

fn incline(link: &Link) -> Incline {
    if link.y0 - link.y1 > 0.0 {
        Incline::Up
    } else {
        Incline::Down
    }
}

fn is_top(link: &Link) -> bool {
    link.circular_link_type == Some(CircularLinkType::Top)
}

fn is_bottom(link: &Link) -> bool {
    link.circular && link.circular_link_type == Some(CircularLinkType::Bottom)
}

/// Breadth of `link` where its straight source→target chord crosses `x`.
fn breadth_at(graph: &Graph, link: &Link, x: f64) -> f64 {
    let sx = graph.nodes[link.source].x1;
    let tx = graph.nodes[link.target].x0;
    let dx = tx - sx;
    if dx.abs() < f64::EPSILON {
        return link.y0;
    }
    link.y0 + (link.y1 - link.y0) * (x - sx) / dx
}

/// Initial per-node link order: by the far end's stacking order, then link index. Non-circular
/// links stack down from the node top, circular links up from the node bottom.
pub fn compute_link_breadths(graph: &mut Graph) {
    for ni in 0..graph.nodes.len() {
        let mut source_links = std::mem::take(&mut graph.nodes[ni].source_links);
        source_links.sort_by(|&a, &b| {
            ascending_breadth(graph, graph.links[a].target, graph.links[b].target)
                .then_with(|| a.cmp(&b))
        });
        let mut target_links = std::mem::take(&mut graph.nodes[ni].target_links);
        target_links.sort_by(|&a, &b| {
            ascending_breadth(graph, graph.links[a].source, graph.links[b].source)
                .then_with(|| a.cmp(&b))
        });
        graph.nodes[ni].source_links = source_links;
        graph.nodes[ni].target_links = target_links;
    }

    for ni in 0..graph.nodes.len() {
        let (top, bottom) = (graph.nodes[ni].y0, graph.nodes[ni].y1);
        let (mut y0, mut y0_cycle) = (top, bottom);
        for &li in &graph.nodes[ni].source_links {
            let link = &mut graph.links[li];
            if link.circular {
                link.y0 = y0_cycle - link.width / 2.0;
                y0_cycle -= link.width;
            } else {
                link.y0 = y0 + link.width / 2.0;
                y0 += link.width;
            }
        }
        let (mut y1, mut y1_cycle) = (top, bottom);
        for &li in &graph.nodes[ni].target_links {
            let link = &mut graph.links[li];
            if link.circular {
                link.y1 = y1_cycle - link.width / 2.0;
                y1_cycle -= link.width;
            } else {
                link.y1 = y1 + link.width / 2.0;
                y1 += link.width;
            }
        }
    }
}

fn compare_circular_types(first: &Link) -> Ordering {
    if is_top(first) {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn compare_source_links(graph: &Graph, a: usize, b: usize) -> Ordering {
    let (l1, l2) = (&graph.links[a], &graph.links[b]);
    let (t1, t2) = (&graph.nodes[l1.target], &graph.nodes[l2.target]);
    match (l1.circular, l2.circular) {
        (false, false) => {
            if t1.column == t2.column || incline(l1) != incline(l2) {
                f64_cmp(l1.y1, l2.y1)
            } else if t1.column > t2.column {
                f64_cmp(breadth_at(graph, l1, t2.x0), l2.y1)
            } else {
                f64_cmp(l1.y1, breadth_at(graph, l2, t1.x0))
            }
        }
        (true, false) => compare_circular_types(l1),
        (false, true) => compare_circular_types(l2).reverse(),
        (true, true) => match (l1.circular_link_type, l2.circular_link_type) {
            (Some(CircularLinkType::Top), Some(CircularLinkType::Top)) => {
                if t1.column == t2.column {
                    f64_cmp(t1.y1, t2.y1)
                } else {
                    t2.column.cmp(&t1.column)
                }
            }
            (Some(CircularLinkType::Bottom), Some(CircularLinkType::Bottom)) => {
                if t1.column == t2.column {
                    f64_cmp(t2.y1, t1.y1)
                } else {
                    t1.column.cmp(&t2.column)
                }
            }
            _ => compare_circular_types(l1),
        },
    }
}

fn compare_target_links(graph: &Graph, a: usize, b: usize) -> Ordering {
    let (l1, l2) = (&graph.links[a], &graph.links[b]);
    let (s1, s2) = (&graph.nodes[l1.source], &graph.nodes[l2.source]);
    match (l1.circular, l2.circular) {
        (false, false) => {
            if s1.column == s2.column || incline(l1) != incline(l2) {
                f64_cmp(l1.y0, l2.y0)
            } else if s1.column < s2.column {
                f64_cmp(breadth_at(graph, l1, s2.x1), l2.y0)
            } else {
                f64_cmp(l1.y0, breadth_at(graph, l2, s1.x1))
            }
        }
        (true, false) => compare_circular_types(l1),
        (false, true) => compare_circular_types(l2).reverse(),
        (true, true) => match (l1.circular_link_type, l2.circular_link_type) {
            (Some(CircularLinkType::Top), Some(CircularLinkType::Top)) => {
                if s1.column == s2.column {
                    f64_cmp(s1.y1, s2.y1)
                } else {
                    s1.column.cmp(&s2.column)
                }
            }
            (Some(CircularLinkType::Bottom), Some(CircularLinkType::Bottom)) => {
                if s1.column == s2.column {
                    f64_cmp(s2.y1, s1.y1)
                } else {
                    s2.column.cmp(&s1.column)
                }
            }
            _ => compare_circular_types(l1),
        },
    }
}

/// Stacks `ordered` link widths from `top`, then re-derives bottom-detour circular links from
/// `bottom` backwards so they always leave from the trailing edge of the stack.
fn stack_offsets(graph: &mut Graph, ordered: &[usize], top: f64, bottom: f64, source_side: bool) {
    let mut offset = top;
    for &li in ordered {
        let link = &mut graph.links[li];
        let y = offset + link.width / 2.0;
        offset += link.width;
        if source_side {
            link.y0 = y;
        } else {
            link.y1 = y;
        }
    }
    for (i, &li) in ordered.iter().enumerate() {
        if !is_bottom(&graph.links[li]) {
            continue;
        }
        let below: f64 = ordered[i + 1..].iter().map(|&lj| graph.links[lj].width).sum();
        let link = &mut graph.links[li];
        let y = bottom - below - link.width / 2.0;
        if source_side {
            link.y0 = y;
        } else {
            link.y1 = y;
        }
    }
}

/// Reorders each node's outgoing links and recomputes their source offsets.
pub fn sort_source_links(graph: &mut Graph) {
    for ni in 0..graph.nodes.len() {
        let mut ordered: Vec<usize> = graph.nodes[ni].source_links.clone();
        ordered.sort_unstable();
        if ordered.len() > 1 {
            insertion_sort_by(&mut ordered, |&a, &b| compare_source_links(graph, a, b));
        }
        let (top, bottom) = (graph.nodes[ni].y0, graph.nodes[ni].y1);
        stack_offsets(graph, &ordered, top, bottom, true);
        graph.nodes[ni].source_links = ordered;
    }
}

/// Reorders each node's incoming links and recomputes their target offsets.
pub fn sort_target_links(graph: &mut Graph) {
    for ni in 0..graph.nodes.len() {
        let mut ordered: Vec<usize> = graph.nodes[ni].target_links.clone();
        ordered.sort_unstable();
        if ordered.len() > 1 {
            insertion_sort_by(&mut ordered, |&a, &b| compare_target_links(graph, a, b));
        }
        let (top, bottom) = (graph.nodes[ni].y0, graph.nodes[ni].y1);
        stack_offsets(graph, &ordered, top, bottom, false);
        graph.nodes[ni].target_links = ordered;
    }
}

fn nodes_overlap(graph: &Graph, a: usize, b: usize) -> bool {
    let (a, b) = (&graph.nodes[a], &graph.nodes[b]);
    (a.y0 > b.y0 && a.y0 < b.y1) || (a.y1 > b.y0 && a.y1 < b.y1) || (a.y0 < b.y0 && a.y1 > b.y1)
}

/// Moves a node (and the ends of its links) by `dy` if it stays inside the node area.
fn adjust_node_height(graph: &mut Graph, node: usize, dy: f64, state: &LayoutState) -> bool {
    let n = &graph.nodes[node];
    if n.y0 + dy < state.inner.y0 || n.y1 + dy > state.inner.y1 {
        return false;
    }
    let n = &mut graph.nodes[node];
    n.y0 += dy;
    n.y1 += dy;
    let (source_links, target_links) = (n.source_links.clone(), n.target_links.clone());
    for li in target_links {
        graph.links[li].y1 += dy;
    }
    for li in source_links {
        graph.links[li].y0 += dy;
    }
    true
}

/// Nudges nodes sitting in the way of non-circular links that skip over their column.
///
/// The link curve is sampled with the same Bezier used to draw it, once per skipped column.
pub fn resolve_node_link_overlaps(graph: &mut Graph, state: &LayoutState) {
    for li in 0..graph.links.len() {
        let link = &graph.links[li];
        if link.circular {
            continue;
        }
        let source_column = graph.nodes[link.source].column;
        let target_column = graph.nodes[link.target].column;
        if target_column <= source_column + 1 {
            continue;
        }
        let half_width = link.width / 2.0;
        let start = Point::new(graph.nodes[link.source].x1, link.y0);
        let end = Point::new(graph.nodes[link.target].x0, link.y1);
        let skipped = (target_column - source_column - 1) as f64;

        for (i, column) in (source_column + 1..target_column).enumerate() {
            let t = (i as f64 + 1.0) / (skipped + 1.0);
            let y = path::horizontal_link_point(start, end, t).y;
            let (link_top, link_bottom) = (y - half_width, y + half_width);

            for ni in 0..graph.nodes.len() {
                let node = &graph.nodes[ni];
                if node.column != column {
                    continue;
                }
                let dy = if link_top > node.y0 && link_top < node.y1 {
                    let dy = node.y1 - link_top + OVERLAP_CLEARANCE;
                    if node.circular_link_type == Some(CircularLinkType::Bottom) {
                        dy
                    } else {
                        -dy
                    }
                } else if (link_bottom > node.y0 && link_bottom < node.y1)
                    || (link_top < node.y0 && link_bottom > node.y1)
                {
                    link_bottom - node.y0 + OVERLAP_CLEARANCE
                } else {
                    continue;
                };

                adjust_node_height(graph, ni, dy, state);
                for other in 0..graph.nodes.len() {
                    if other == ni || graph.nodes[other].column != column {
                        continue;
                    }
                    if nodes_overlap(graph, ni, other) {
                        adjust_node_height(graph, other, dy, state);
                    }
                }
            }
        }
    }
}

fn column_span(graph: &Graph, link: &Link) -> (usize, usize) {
    let (a, b) = (
        graph.nodes[link.source].column,
        graph.nodes[link.target].column,
    );
    (a.min(b), a.max(b))
}

fn circular_links_cross(graph: &Graph, a: &Link, b: &Link) -> bool {
    let (a_lo, a_hi) = column_span(graph, a);
    let (b_lo, b_hi) = column_span(graph, b);
    a_lo <= b_hi && b_lo <= a_hi
}

/// Distance of each circular link's horizontal run from the node area, for links of type `ty`.
///
/// Links are placed shortest span first; each is pushed beyond every crossing link placed before
/// it by that link's buffer, half its width and `gap`.
fn vertical_buffers(graph: &Graph, ty: CircularLinkType, gap: f64, buffers: &mut [f64]) {
    let mut ordered: Vec<usize> = graph
        .links
        .iter()
        .filter(|l| l.circular && l.circular_link_type == Some(ty))
        .map(|l| l.index)
        .collect();
    ordered.sort_by(|&a, &b| {
        let (la, lb) = (&graph.links[a], &graph.links[b]);
        let span = |l: &Link| {
            let (lo, hi) = column_span(graph, l);
            hi - lo
        };
        span(la)
            .cmp(&span(lb))
            .then_with(|| match ty {
                CircularLinkType::Bottom => f64_cmp(lb.y0, la.y0),
                CircularLinkType::Top => f64_cmp(la.y0, lb.y0),
            })
            .then_with(|| a.cmp(&b))
    });

    for (i, &li) in ordered.iter().enumerate() {
        let link = &graph.links[li];
        let mut buffer = 0.0_f64;
        if !(link.is_self_linking() && graph.only_circular_link(li)) {
            for &lj in &ordered[..i] {
                let other = &graph.links[lj];
                if circular_links_cross(graph, link, other) {
                    buffer = buffer.max(buffers[lj] + other.width / 2.0 + gap);
                }
            }
        }
        buffers[li] = buffer + link.width / 2.0;
    }
}

/// Arc radii for `link` on one side: grows with the widths of same-type circular links sharing
/// that column that sit nearer the node edge.
fn arc_radii(graph: &Graph, link: &Link, source_side: bool, gap: f64) -> (f64, f64) {
    let ty = link.circular_link_type;
    let column_of = |l: &Link| {
        if source_side {
            graph.nodes[l.source].column
        } else {
            graph.nodes[l.target].column
        }
    };
    let breadth_of = |l: &Link| if source_side { l.y0 } else { l.y1 };

    let column = column_of(link);
    let mut same: Vec<&Link> = graph
        .links
        .iter()
        .filter(|l| l.circular && l.circular_link_type == ty && column_of(l) == column)
        .collect();
    same.sort_by(|a, b| {
        let by_breadth = if ty == Some(CircularLinkType::Bottom) {
            f64_cmp(breadth_of(b), breadth_of(a))
        } else {
            f64_cmp(breadth_of(a), breadth_of(b))
        };
        by_breadth.then_with(|| a.index.cmp(&b.index))
    });

    let base = BASE_RADIUS + link.width / 2.0;
    let mut radius_offset = 0.0;
    for (i, l) in same.iter().enumerate() {
        if l.index == link.index {
            return (base + radius_offset, base + i as f64 * gap + radius_offset);
        }
        radius_offset += l.width;
    }
    (base, base)
}

/// Computes detour geometry for every circular link and the drawable path of every link.
pub fn compute_link_paths(graph: &mut Graph, state: &LayoutState, circular_link_gap: f64) {
    let mut buffers = vec![0.0; graph.links.len()];
    vertical_buffers(
        graph,
        CircularLinkType::Top,
        circular_link_gap,
        &mut buffers,
    );
    vertical_buffers(
        graph,
        CircularLinkType::Bottom,
        circular_link_gap,
        &mut buffers,
    );

    for li in 0..graph.links.len() {
        let link = &graph.links[li];
        let source = &graph.nodes[link.source];
        let target = &graph.nodes[link.target];

        if !link.circular {
            let path = path::horizontal_link(
                Point::new(source.x1, link.y0),
                Point::new(target.x0, link.y1),
            );
            let link = &mut graph.links[li];
            link.path = path;
            link.circular_path_data = None;
            continue;
        }

        let above = is_top(link);
        let dir = if above { -1.0 } else { 1.0 };
        let mut d = CircularPathData {
            source_x: source.x1,
            source_y: link.y0,
            target_x: target.x0,
            target_y: link.y1,
            vertical_buffer: buffers[li],
            ..Default::default()
        };

        if link.is_self_linking() && graph.only_circular_link(li) {
            let r = BASE_RADIUS + link.width / 2.0;
            d.left_small_arc_radius = r;
            d.left_large_arc_radius = r;
            d.right_small_arc_radius = r;
            d.right_large_arc_radius = r;
            let edge = if above { source.y0 } else { source.y1 };
            d.vertical_full_extent = edge + dir * (VERTICAL_MARGIN + d.vertical_buffer);
        } else {
            let (left_small, left_large) = arc_radii(graph, link, true, circular_link_gap);
            let (right_small, right_large) = arc_radii(graph, link, false, circular_link_gap);
            d.left_small_arc_radius = left_small;
            d.left_large_arc_radius = left_large;
            d.right_small_arc_radius = right_small;
            d.right_large_arc_radius = right_large;
            // Both sides anchor on the node area edge, or on an endpoint that pokes past it.
            d.vertical_full_extent = if above {
                state.inner.y0.min(source.y0).min(target.y0) - VERTICAL_MARGIN - d.vertical_buffer
            } else {
                state.inner.y1.max(source.y1).max(target.y1) + VERTICAL_MARGIN + d.vertical_buffer
            };
        }
        d.vertical_left_inner_extent = d.vertical_full_extent - dir * d.left_large_arc_radius;
        d.vertical_right_inner_extent = d.vertical_full_extent - dir * d.right_large_arc_radius;
        d.left_inner_extent = d.source_x + NODE_BUFFER;
        d.right_inner_extent = d.target_x - NODE_BUFFER;
        d.left_full_extent = d.source_x + d.left_large_arc_radius + NODE_BUFFER;
        d.right_full_extent = d.target_x - d.right_large_arc_radius - NODE_BUFFER;

        let path = path::circular_link(&d, above);
        let link = &mut graph.links[li];
        link.path = path;
        link.circular_path_data = Some(d);
    }
    tracing::debug!(links = graph.links.len(), "computed link paths");
}
