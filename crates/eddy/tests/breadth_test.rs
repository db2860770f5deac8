use eddy::breadth::{self, Margins};
use eddy::{Extent, FlowGraph, Graph, LayoutOptions, NodeAlign, NodePadding};
use eddy::{columns, cycles, graph};

const EPS: f64 = 1e-6;

fn prepared(input: &FlowGraph) -> Graph {
    let mut g = graph::build(input).unwrap();
    cycles::identify_circles(&mut g, false);
    g.compute_node_values();
    columns::assign_columns(&mut g, NodeAlign::Justify);
    cycles::select_circular_link_types(&mut g);
    g
}

fn split() -> FlowGraph {
    FlowGraph::from_links([("a", "b", 10.0), ("a", "c", 30.0)])
}

#[test]
fn scale_is_limited_by_the_tightest_column() {
    let g = prepared(&split());
    let columns = g.columns();
    let ky = breadth::compute_scale(&g, &columns, 400.0, 8.0);
    // Column 0 allows 400 / 40, column 1 only (400 - 8) / 40.
    assert!((ky - 9.8).abs() < EPS);
}

#[test]
fn zero_value_columns_do_not_constrain_the_scale() {
    let input = FlowGraph::from_links([("a", "b", 0.0), ("b", "c", 0.0)]);
    let g = prepared(&input);
    assert_eq!(breadth::compute_scale(&g, &g.columns(), 400.0, 8.0), 0.0);
}

#[test]
fn ratio_padding_uses_the_most_crowded_column() {
    let g = prepared(&split());
    let columns = g.columns();
    let p = breadth::resolve_padding(&columns, NodePadding::Ratio(0.3), 400.0);
    assert!((p - 400.0 * 0.3 / 3.0).abs() < EPS);
    assert_eq!(
        breadth::resolve_padding(&columns, NodePadding::Fixed(12.0), 400.0),
        12.0
    );
}

#[test]
fn margins_are_only_padded_on_used_sides() {
    let input = FlowGraph::from_links([("a", "b", 1.0), ("b", "c", 1.0), ("c", "a", 1.0)]);
    let mut g = prepared(&input);
    breadth::set_link_widths(&mut g, 4.0);
    let m = breadth::circle_margins(&g);
    assert_eq!(m.top, 0.0);
    assert_eq!(m.bottom, 4.0 + 35.0);
    assert_eq!(m.left, 4.0 + 35.0);
    assert_eq!(m.right, 4.0 + 35.0);
}

#[test]
fn scale_extent_shrinks_by_the_scaled_margins() {
    let outer = Extent::from_size(600.0, 400.0);
    let margins = Margins {
        top: 0.0,
        bottom: 40.0,
        left: 10.0,
        right: 0.0,
    };
    let (inner, ratio) = breadth::scale_extent(outer, &margins);
    assert!((ratio - 400.0 / 440.0).abs() < EPS);
    assert!((inner.x0 - 10.0 * 600.0 / 610.0).abs() < EPS);
    assert_eq!(inner.x1, 600.0);
    assert_eq!(inner.y0, 0.0);
    assert!((inner.y1 - (400.0 - 40.0 * 400.0 / 440.0)).abs() < EPS);
}

#[test]
fn node_breadths_are_proportional_and_separated() {
    let mut g = prepared(&split());
    let options = LayoutOptions::default();
    let state = breadth::compute_node_breadths(&mut g, &options);

    assert!((state.ky - 9.8 * 0.3).abs() < EPS);
    for n in &g.nodes {
        assert!((n.breadth() - n.value * state.ky).abs() < EPS, "{}", n.id);
    }
    let (b, c) = (&g.nodes[1], &g.nodes[2]);
    let (upper, lower) = if b.y0 < c.y0 { (b, c) } else { (c, b) };
    assert!(lower.y0 >= upper.y1 + state.padding - EPS);
    assert!(upper.y0 >= state.inner.y0 - EPS);
}

#[test]
fn nodes_are_banded_by_column_inside_the_inner_extent() {
    let input = FlowGraph::from_links([("a", "b", 1.0), ("b", "c", 1.0)]);
    let mut g = prepared(&input);
    let options = LayoutOptions {
        node_width: 20.0,
        extent: Extent::new(10.0, 0.0, 410.0, 300.0),
        ..Default::default()
    };
    let state = breadth::compute_node_breadths(&mut g, &options);
    let x0: Vec<f64> = g.nodes.iter().map(|n| n.x0).collect();
    assert_eq!(x0, vec![10.0, 200.0, 390.0]);
    assert_eq!(state.inner, options.extent);
    assert!(g.nodes.iter().all(|n| n.x1 - n.x0 == 20.0));
}

#[test]
fn fill_height_stretches_into_the_inner_extent() {
    let mut g = prepared(&split());
    let mut state = breadth::compute_node_breadths(&mut g, &LayoutOptions::default());
    let ky = state.ky;
    let ratio = breadth::fill_height(&mut g, &mut state).unwrap();
    assert!(ratio >= 1.0);
    assert!((state.ky - ky * ratio).abs() < EPS);

    let top = g.nodes.iter().map(|n| n.y0).fold(f64::INFINITY, f64::min);
    let bottom = g.nodes.iter().map(|n| n.y1).fold(f64::NEG_INFINITY, f64::max);
    assert!((top - state.inner.y0).abs() < EPS);
    assert!((bottom - state.inner.y1).abs() < EPS);
}
