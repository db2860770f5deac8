//! Circular link classification.
//!
//! In discovery mode every elementary circuit of the graph is enumerated (Johnson's algorithm)
//! and only the edge closing each circuit back to its least-index node is marked circular. The
//! remaining circuit edges stay ordinary forward edges, which means a different edge than a
//! human would pick can end up as the back edge when circuits share edges. Column assignment only
//! needs the circular set to break every cycle, which this rule guarantees.

use crate::graph::{CircularLinkType, Graph};
use rustc_hash::FxHashSet;

/// Enumerates the elementary circuits of a directed graph given as an adjacency list.
///
/// Each circuit is reported as `[s, ..., v, s]` where `s` is its least vertex. Parallel edges
/// must already be collapsed by the caller; self-loops are reported as `[v, v]`.
pub fn find_circuits(adj: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct Johnson<'a> {
        sub_adj: &'a [Vec<usize>],
        start: usize,
        blocked: Vec<bool>,
        b: Vec<Vec<usize>>,
        stack: Vec<usize>,
        circuits: Vec<Vec<usize>>,
    }

    impl Johnson<'_> {
        fn unblock(&mut self, u: usize) {
            let mut pending = vec![u];
            while let Some(u) = pending.pop() {
                self.blocked[u] = false;
                while let Some(w) = self.b[u].pop() {
                    if self.blocked[w] {
                        pending.push(w);
                    }
                }
            }
        }

        fn enter(&mut self, v: usize, frames: &mut Vec<(usize, usize, bool)>) {
            self.stack.push(v);
            self.blocked[v] = true;
            frames.push((v, 0, false));
        }

        /// Walks every path from `start`, keeping one `(vertex, next neighbour, found)` frame per
        /// path vertex instead of recursing.
        fn circuits_from(&mut self, start: usize) {
            let sub_adj = self.sub_adj;
            let mut frames: Vec<(usize, usize, bool)> = Vec::new();
            self.enter(start, &mut frames);

            while let Some(&(v, next, found)) = frames.last() {
                let top = frames.len() - 1;
                if let Some(&w) = sub_adj[v].get(next) {
                    frames[top].1 += 1;
                    if w == start {
                        let mut cycle = self.stack.clone();
                        cycle.push(start);
                        self.circuits.push(cycle);
                        frames[top].2 = true;
                    } else if !self.blocked[w] {
                        self.enter(w, &mut frames);
                    }
                    continue;
                }

                frames.pop();
                if found {
                    self.unblock(v);
                } else {
                    for &w in &sub_adj[v] {
                        if !self.b[w].contains(&v) {
                            self.b[w].push(v);
                        }
                    }
                }
                self.stack.pop();
                if let Some(parent) = frames.last_mut() {
                    parent.2 |= found;
                }
            }
        }
    }

    let n = adj.len();
    let mut circuits: Vec<Vec<usize>> = Vec::new();
    let mut s = 0usize;
    while s < n {
        let Some(component) = least_nontrivial_component(adj, s) else {
            break;
        };
        let Some(&least) = component.iter().min() else {
            break;
        };
        let mut in_component = vec![false; n];
        for &v in &component {
            in_component[v] = true;
        }
        let sub_adj: Vec<Vec<usize>> = (0..n)
            .map(|v| {
                if in_component[v] {
                    adj[v].iter().copied().filter(|&w| in_component[w]).collect()
                } else {
                    Vec::new()
                }
            })
            .collect();

        let mut johnson = Johnson {
            sub_adj: &sub_adj,
            start: least,
            blocked: vec![false; n],
            b: vec![Vec::new(); n],
            stack: Vec::new(),
            circuits: Vec::new(),
        };
        johnson.circuits_from(least);
        circuits.append(&mut johnson.circuits);
        s = least + 1;
    }
    circuits
}

/// Strongly connected components of the subgraph induced by vertices `>= from` (Tarjan); returns
/// the component holding the least vertex among components that contain at least one edge.
fn least_nontrivial_component(adj: &[Vec<usize>], from: usize) -> Option<Vec<usize>> {
    struct Tarjan<'a> {
        adj: &'a [Vec<usize>],
        from: usize,
        index: usize,
        indices: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        stack: Vec<usize>,
        on_stack: Vec<bool>,
        sccs: Vec<Vec<usize>>,
    }

    impl Tarjan<'_> {
        fn visit(&mut self, v: usize) {
            self.indices[v] = Some(self.index);
            self.lowlink[v] = self.index;
            self.index += 1;
            self.stack.push(v);
            self.on_stack[v] = true;
        }

        /// Depth-first search from `root` with an explicit `(vertex, next neighbour)` call stack.
        fn strongconnect(&mut self, root: usize) {
            let adj = self.adj;
            self.visit(root);
            let mut calls: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(&(v, next)) = calls.last() {
                if let Some(&w) = adj[v].get(next) {
                    let top = calls.len() - 1;
                    calls[top].1 += 1;
                    if w < self.from {
                        continue;
                    }
                    match self.indices[w] {
                        None => {
                            self.visit(w);
                            calls.push((w, 0));
                        }
                        Some(w_index) if self.on_stack[w] => {
                            self.lowlink[v] = self.lowlink[v].min(w_index);
                        }
                        Some(_) => {}
                    }
                    continue;
                }

                calls.pop();
                if Some(self.lowlink[v]) == self.indices[v] {
                    let mut scc = Vec::new();
                    while let Some(w) = self.stack.pop() {
                        self.on_stack[w] = false;
                        scc.push(w);
                        if w == v {
                            break;
                        }
                    }
                    self.sccs.push(scc);
                }
                if let Some(&(parent, _)) = calls.last() {
                    self.lowlink[parent] = self.lowlink[parent].min(self.lowlink[v]);
                }
            }
        }
    }

    let n = adj.len();
    let mut tarjan = Tarjan {
        adj,
        from,
        index: 0,
        indices: vec![None; n],
        lowlink: vec![0; n],
        stack: Vec::new(),
        on_stack: vec![false; n],
        sccs: Vec::new(),
    };
    for v in from..n {
        if tarjan.indices[v].is_none() {
            tarjan.strongconnect(v);
        }
    }

    tarjan
        .sccs
        .into_iter()
        .filter(|scc| scc.len() > 1 || scc.first().is_some_and(|&v| adj[v].contains(&v)))
        .min_by_key(|scc| scc.iter().copied().min().unwrap_or(usize::MAX))
}

/// Marks links as circular and hands out `circular_link_id`s in link order.
///
/// With `sort_nodes` set and a rank on every node, a link is circular iff its source ranks at or
/// after its target and no circuit search happens.
pub fn identify_circles(graph: &mut Graph, sort_nodes: bool) {
    let ranks: Option<Vec<f64>> = if sort_nodes {
        graph.nodes.iter().map(|n| n.rank).collect()
    } else {
        None
    };
    if sort_nodes && ranks.is_none() {
        tracing::debug!("sort_nodes requested but not every node has a rank; searching circuits");
    }

    let mut next_id = 0usize;
    match ranks {
        Some(ranks) => {
            for link in &mut graph.links {
                link.circular = ranks[link.source] >= ranks[link.target];
                link.circular_link_id = link.circular.then(|| {
                    next_id += 1;
                    next_id - 1
                });
            }
        }
        None => {
            let closing = closing_edges(graph);
            for link in &mut graph.links {
                link.circular = link.source == link.target
                    || closing.contains(&(link.source, link.target));
                link.circular_link_id = link.circular.then(|| {
                    next_id += 1;
                    next_id - 1
                });
            }
        }
    }
    tracing::debug!(circular = next_id, "identified circular links");
}

fn closing_edges(graph: &Graph) -> FxHashSet<(usize, usize)> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
    for link in &graph.links {
        if !adj[link.source].contains(&link.target) {
            adj[link.source].push(link.target);
        }
    }

    let mut circuits = find_circuits(&adj);
    circuits.sort_by_key(|c| c.len());

    let mut closing: FxHashSet<(usize, usize)> = FxHashSet::default();
    for cycle in &circuits {
        if let [.., from, to] = cycle.as_slice() {
            closing.insert((*from, *to));
        }
    }
    closing
}

/// Decides whether each circular link detours above (`Top`) or below (`Bottom`) the diagram.
///
/// Links inherit a type already held by their source (then target) node; otherwise they go to
/// `Top` only while fewer top links than bottom links have been handed out. Both endpoint nodes
/// adopt the link's type.
pub fn select_circular_link_types(graph: &mut Graph) {
    let mut tops = 0usize;
    let mut bottoms = 0usize;

    for li in 0..graph.links.len() {
        if !graph.links[li].circular {
            continue;
        }
        let (source, target) = (graph.links[li].source, graph.links[li].target);
        let ty = match (
            graph.nodes[source].circular_link_type,
            graph.nodes[target].circular_link_type,
        ) {
            (Some(ty), _) | (None, Some(ty)) => ty,
            (None, None) if tops < bottoms => CircularLinkType::Top,
            (None, None) => CircularLinkType::Bottom,
        };
        match ty {
            CircularLinkType::Top => tops += 1,
            CircularLinkType::Bottom => bottoms += 1,
        }
        graph.links[li].circular_link_type = Some(ty);
        graph.nodes[source].circular_link_type = Some(ty);
        graph.nodes[target].circular_link_type = Some(ty);
    }

    for li in 0..graph.links.len() {
        let link = &graph.links[li];
        if !link.circular {
            continue;
        }
        let source_ty = graph.nodes[link.source].circular_link_type;
        let target_ty = graph.nodes[link.target].circular_link_type;
        if source_ty == target_ty || link.is_self_linking() {
            graph.links[li].circular_link_type = source_ty;
        }
    }
    tracing::debug!(tops, bottoms, "selected circular link types");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_circuits_reports_each_circuit_from_its_least_vertex() {
        let adj = vec![vec![1], vec![2], vec![0]];
        assert_eq!(find_circuits(&adj), vec![vec![0, 1, 2, 0]]);
    }

    #[test]
    fn find_circuits_finds_overlapping_circuits() {
        // 0 -> 1 -> 0 and 0 -> 1 -> 2 -> 0
        let adj = vec![vec![1], vec![0, 2], vec![0]];
        let mut circuits = find_circuits(&adj);
        circuits.sort();
        assert_eq!(circuits, vec![vec![0, 1, 0], vec![0, 1, 2, 0]]);
    }

    #[test]
    fn find_circuits_includes_self_loops() {
        let adj = vec![vec![0, 1], vec![]];
        assert_eq!(find_circuits(&adj), vec![vec![0, 0]]);
    }

    #[test]
    fn find_circuits_of_a_dag_is_empty() {
        let adj = vec![vec![1, 2], vec![2], vec![]];
        assert!(find_circuits(&adj).is_empty());
    }
}
