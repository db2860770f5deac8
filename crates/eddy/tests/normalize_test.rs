use eddy::{Extent, FlowGraph, LayoutOptions, NodePadding, SankeyLayout};

const EPS: f64 = 1e-6;

fn nested_cycles() -> FlowGraph {
    FlowGraph::from_links([
        ("a", "b", 5.0),
        ("b", "c", 5.0),
        ("c", "d", 5.0),
        ("d", "a", 2.0),
        ("d", "b", 3.0),
    ])
}

fn fan_out() -> FlowGraph {
    FlowGraph::from_links(["a", "b", "c", "d", "e"].map(|leaf| ("s", leaf, 10.0)))
}

fn assert_columns_separated(layout: &SankeyLayout) {
    for column in layout.graph.columns() {
        let mut nodes: Vec<_> = column.iter().map(|&i| &layout.nodes()[i]).collect();
        nodes.sort_by(|a, b| a.y0.total_cmp(&b.y0));
        for pair in nodes.windows(2) {
            assert!(
                pair[1].y0 >= pair[0].y1 + layout.state.padding - EPS,
                "{} overlaps {} (gap {}, padding {})",
                pair[0].id,
                pair[1].id,
                pair[1].y0 - pair[0].y1,
                layout.state.padding
            );
        }
    }
}

fn classification(layout: &SankeyLayout) -> Vec<(bool, Option<usize>, usize)> {
    layout
        .links()
        .iter()
        .map(|l| {
            (
                l.circular,
                l.circular_link_id,
                layout.nodes()[l.source].column,
            )
        })
        .collect()
}

#[test]
fn update_refits_to_a_taller_extent() {
    let options = LayoutOptions::default();
    let mut layout = eddy::layout(&nested_cycles(), &options).unwrap();
    let before = classification(&layout);
    let ky = layout.state.ky;

    let taller = LayoutOptions {
        extent: Extent::from_size(600.0, 800.0),
        ..options
    };
    layout.update(&taller);

    assert_eq!(classification(&layout), before);
    assert_eq!(layout.state.outer, taller.extent);
    assert!(layout.state.ky > ky);
    for n in layout.nodes() {
        assert!((n.breadth() - n.value * layout.state.ky).abs() < EPS, "{}", n.id);
        assert!(n.y0 >= layout.state.inner.y0 - EPS);
        assert!(n.y1 <= layout.state.inner.y1 + EPS);
    }
    for l in layout.links() {
        assert!((l.width - l.value * layout.state.ky).abs() < EPS);
    }
}

#[test]
fn update_rebands_columns_for_a_new_node_width() {
    let options = LayoutOptions::default();
    let mut layout = eddy::layout(&nested_cycles(), &options).unwrap();
    layout.update(&LayoutOptions {
        node_width: 40.0,
        ..options
    });

    let inner = layout.state.inner;
    for n in layout.nodes() {
        assert!((n.x1 - n.x0 - 40.0).abs() < EPS);
    }
    let last = layout.node("d").unwrap();
    assert!((last.x1 - inner.x1).abs() < EPS);
    let first = layout.node("a").unwrap();
    assert!((first.x0 - inner.x0).abs() < EPS);
}

#[test]
fn update_widens_the_gap_between_nested_detours() {
    let options = LayoutOptions::default();
    let mut layout = eddy::layout(&nested_cycles(), &options).unwrap();
    let extent_gap = |layout: &SankeyLayout| {
        let outer = layout.links()[3].circular_path_data.unwrap();
        let inner = layout.links()[4].circular_path_data.unwrap();
        outer.vertical_full_extent - inner.vertical_full_extent
    };
    let narrow = extent_gap(&layout);

    layout.update(&LayoutOptions {
        circular_link_gap: 12.0,
        ..options
    });
    let (outer, inner) = (&layout.links()[3], &layout.links()[4]);
    let wide = extent_gap(&layout);
    assert!(wide > narrow);
    assert!(wide >= (outer.width + inner.width) / 2.0 + 12.0 - EPS);
}

#[test]
fn update_keeps_paths_attached_to_nodes() {
    let options = LayoutOptions::default();
    let mut layout = eddy::layout(&nested_cycles(), &options).unwrap();
    layout.update(&LayoutOptions {
        extent: Extent::new(0.0, 0.0, 900.0, 300.0),
        ..options
    });
    for l in layout.links() {
        let start = l.path.start().unwrap();
        let end = l.path.end().unwrap();
        assert_eq!(start.x, layout.nodes()[l.source].x1);
        assert_eq!(end.x, layout.nodes()[l.target].x0);
        assert_eq!((start.y, end.y), (l.y0, l.y1));
    }
}

#[test]
fn update_on_an_empty_layout_only_moves_the_extent() {
    let mut layout = eddy::layout(&FlowGraph::default(), &LayoutOptions::default()).unwrap();
    let options = LayoutOptions {
        extent: Extent::from_size(100.0, 50.0),
        ..Default::default()
    };
    layout.update(&options);
    assert_eq!(layout.state.outer, options.extent);
    assert!(layout.nodes().is_empty());
}

#[test]
fn update_to_a_shorter_extent_keeps_columns_padded() {
    let options = LayoutOptions {
        node_padding: NodePadding::Fixed(40.0),
        ..Default::default()
    };
    let mut layout = eddy::layout(&fan_out(), &options).unwrap();
    let before = layout.state.ky;

    let short = LayoutOptions {
        extent: Extent::from_size(600.0, 200.0),
        ..options
    };
    layout.update(&short);

    assert_eq!(layout.state.padding, 40.0);
    assert!(layout.state.ky < before);
    assert_columns_separated(&layout);
    let inner = layout.state.inner;
    for n in layout.nodes() {
        assert!((n.breadth() - n.value * layout.state.ky).abs() < EPS, "{}", n.id);
        assert!(n.y0 >= inner.y0 - EPS && n.y1 <= inner.y1 + EPS, "{}", n.id);
    }

    let fresh = eddy::layout(&fan_out(), &short).unwrap();
    assert_columns_separated(&fresh);
    let leaves = |layout: &SankeyLayout| {
        let a = layout.node("a").unwrap();
        a.breadth()
    };
    assert!(leaves(&layout) <= leaves(&fresh) * 1.5);
}

#[test]
fn update_to_a_larger_padding_keeps_columns_padded() {
    let options = LayoutOptions::default();
    let mut layout = eddy::layout(&fan_out(), &options).unwrap();
    assert_columns_separated(&layout);

    layout.update(&LayoutOptions {
        node_padding: NodePadding::Fixed(60.0),
        ..options
    });

    assert_eq!(layout.state.padding, 60.0);
    assert_columns_separated(&layout);
    let order: Vec<&str> = {
        let mut leaves: Vec<_> = layout.nodes()[1..].iter().collect();
        leaves.sort_by(|a, b| a.y0.total_cmp(&b.y0));
        leaves.iter().map(|n| n.id.as_str()).collect()
    };
    assert_eq!(order, ["a", "b", "c", "d", "e"]);
}
