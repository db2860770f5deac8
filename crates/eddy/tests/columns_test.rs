use eddy::{FlowGraph, NodeAlign};
use eddy::{columns, cycles, graph};

fn columns_of(input: &FlowGraph, align: NodeAlign) -> Vec<usize> {
    let mut g = graph::build(input).unwrap();
    cycles::identify_circles(&mut g, false);
    g.compute_node_values();
    columns::assign_columns(&mut g, align);
    g.nodes.iter().map(|n| n.column).collect()
}

/// a -> b -> c plus a lone source d feeding c.
fn fan_in() -> FlowGraph {
    FlowGraph::from_links([("a", "b", 1.0), ("b", "c", 1.0), ("d", "c", 1.0)])
}

#[test]
fn diamond_is_layered_with_sources_in_column_zero() {
    let input = FlowGraph::from_links([
        ("a", "b", 1.0),
        ("a", "c", 1.0),
        ("b", "d", 1.0),
        ("c", "d", 1.0),
    ]);
    assert_eq!(columns_of(&input, NodeAlign::Justify), vec![0, 1, 1, 2]);
}

#[test]
fn justify_pushes_sinks_to_the_last_column() {
    let input = FlowGraph::from_links([("a", "b", 1.0), ("b", "c", 1.0), ("a", "d", 1.0)]);
    assert_eq!(columns_of(&input, NodeAlign::Justify), vec![0, 1, 2, 2]);
    assert_eq!(columns_of(&input, NodeAlign::Left), vec![0, 1, 2, 1]);
}

#[test]
fn alignment_policies_place_a_short_branch_differently() {
    assert_eq!(columns_of(&fan_in(), NodeAlign::Left), vec![0, 1, 2, 0]);
    assert_eq!(columns_of(&fan_in(), NodeAlign::Justify), vec![0, 1, 2, 0]);
    assert_eq!(columns_of(&fan_in(), NodeAlign::Right), vec![0, 1, 2, 1]);
    assert_eq!(columns_of(&fan_in(), NodeAlign::Center), vec![0, 1, 2, 1]);
}

#[test]
fn circular_links_do_not_advance_columns() {
    let input = FlowGraph::from_links([
        ("a", "b", 1.0),
        ("b", "c", 1.0),
        ("c", "a", 1.0),
        ("c", "c", 1.0),
    ]);
    assert_eq!(columns_of(&input, NodeAlign::Justify), vec![0, 1, 2]);
}

#[test]
fn unlinked_nodes_share_column_zero() {
    let input = FlowGraph {
        nodes: ["x", "y", "z"].into_iter().map(eddy::FlowNode::new).collect(),
        links: Vec::new(),
    };
    for align in [
        NodeAlign::Left,
        NodeAlign::Right,
        NodeAlign::Justify,
        NodeAlign::Center,
    ] {
        assert_eq!(columns_of(&input, align), vec![0, 0, 0]);
    }
}

#[test]
fn node_align_parses_case_insensitively() {
    assert_eq!("Center".parse::<NodeAlign>(), Ok(NodeAlign::Center));
    assert_eq!(" right ".parse::<NodeAlign>(), Ok(NodeAlign::Right));
    assert!("middle".parse::<NodeAlign>().is_err());
}
