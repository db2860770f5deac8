//! Column assignment over the acyclic part of the graph.
//!
//! Circular links are skipped by both sweeps, so every frontier only moves along forward edges and
//! the sweeps terminate after at most `nodes.len()` steps.

use crate::graph::Graph;
use crate::options::NodeAlign;

/// Forward sweep: `depth` is the longest forward path from a node with no forward inflow.
pub fn compute_node_depths(graph: &mut Graph) {
    let n = graph.nodes.len();
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x: usize = 0;
    while !current.is_empty() && x <= n {
        for &node_idx in &current {
            graph.nodes[node_idx].depth = x;
            for &li in &graph.nodes[node_idx].source_links {
                let link = &graph.links[li];
                if link.circular {
                    continue;
                }
                if !next_seen[link.target] {
                    next_seen[link.target] = true;
                    next.push(link.target);
                }
            }
        }
        x += 1;
        current = std::mem::take(&mut next);
        for &i in &current {
            next_seen[i] = false;
        }
    }
    debug_assert!(current.is_empty(), "forward sweep did not terminate");
}

/// Backward sweep: `height` is the longest forward path to a node with no forward outflow.
pub fn compute_node_heights(graph: &mut Graph) {
    let n = graph.nodes.len();
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x: usize = 0;
    while !current.is_empty() && x <= n {
        for &node_idx in &current {
            graph.nodes[node_idx].height = x;
            for &li in &graph.nodes[node_idx].target_links {
                let link = &graph.links[li];
                if link.circular {
                    continue;
                }
                if !next_seen[link.source] {
                    next_seen[link.source] = true;
                    next.push(link.source);
                }
            }
        }
        x += 1;
        current = std::mem::take(&mut next);
        for &i in &current {
            next_seen[i] = false;
        }
    }
    debug_assert!(current.is_empty(), "backward sweep did not terminate");
}

/// Runs both sweeps and derives `column` from the alignment policy.
pub fn assign_columns(graph: &mut Graph, align: NodeAlign) {
    compute_node_depths(graph);
    compute_node_heights(graph);

    let max_depth = graph.nodes.iter().map(|n| n.depth).max().unwrap_or(0);
    let has_forward =
        |graph: &Graph, links: &[usize]| links.iter().any(|&li| !graph.links[li].circular);

    for i in 0..graph.nodes.len() {
        let node = &graph.nodes[i];
        let column = match align {
            NodeAlign::Left => node.depth,
            NodeAlign::Right => max_depth.saturating_sub(node.height),
            NodeAlign::Justify => {
                if has_forward(graph, &node.source_links) {
                    node.depth
                } else {
                    max_depth
                }
            }
            NodeAlign::Center => {
                if has_forward(graph, &node.target_links) {
                    node.depth
                } else if has_forward(graph, &node.source_links) {
                    node.source_links
                        .iter()
                        .filter(|&&li| !graph.links[li].circular)
                        .map(|&li| graph.nodes[graph.links[li].target].depth)
                        .min()
                        .unwrap_or(1)
                        .saturating_sub(1)
                } else {
                    0
                }
            }
        };
        graph.nodes[i].column = column.min(max_depth);
    }
    tracing::debug!(columns = max_depth + 1, ?align, "assigned node columns");
}
