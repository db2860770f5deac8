use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use eddy::{FlowGraph, FlowLink, FlowNode, LayoutOptions};
use std::hint::black_box;
use std::time::Duration;

/// Layered flow with a few back edges: `layers` columns of `width` nodes, each node feeding two
/// nodes of the next layer, and every fifth layer sending one link back to the first layer.
fn build_flow(layers: usize, width: usize) -> FlowGraph {
    let id = |layer: usize, i: usize| format!("l{layer}_n{i}");
    let mut graph = FlowGraph::default();
    for layer in 0..layers {
        for i in 0..width {
            graph.nodes.push(FlowNode::new(id(layer, i)));
        }
    }

    for layer in 0..layers.saturating_sub(1) {
        for i in 0..width {
            let value = 1.0 + ((layer * 7 + i * 3) % 11) as f64;
            graph
                .links
                .push(FlowLink::new(id(layer, i), id(layer + 1, i), value));
            graph.links.push(FlowLink::new(
                id(layer, i),
                id(layer + 1, (i + 1) % width),
                value / 2.0,
            ));
        }
        if layer > 0 && layer % 5 == 0 {
            graph
                .links
                .push(FlowLink::new(id(layer, 0), id(0, width - 1), 2.0));
        }
    }
    graph
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    group.measurement_time(Duration::from_secs(10));

    let cases = [
        ("flow_6x4", 6usize, 4usize),
        ("flow_12x8", 12usize, 8usize),
        ("flow_20x10", 20usize, 10usize),
    ];

    let options = LayoutOptions::default();
    for (name, layers, width) in cases {
        let input = build_flow(layers, width);
        group.bench_with_input(BenchmarkId::new("eddy::layout", name), &input, |b, input| {
            b.iter(|| {
                let layout = eddy::layout(black_box(input), &options);
                black_box(layout.map(|l| l.links().len()).unwrap_or(0));
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
