use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use roadmap_graph::{EdgePatch, Graph, GraphModel, NodePatch};
use roadmap_layout::LayoutEngine;
use std::hint::black_box;

/// Roadmap-shaped graph: a few roots fanning out, with some cross links
fn build_roadmap(node_count: usize) -> Graph {
    let mut model = GraphModel::new();
    for i in 0..node_count {
        model
            .apply_node(NodePatch::labelled(format!("n{i}"), format!("Concept {i}")))
            .expect("node");
    }
    for i in 1..node_count {
        let parent = (i - 1) / 3;
        model
            .apply_edge(EdgePatch::new(format!("t{i}"), format!("n{parent}"), format!("n{i}")))
            .expect("tree edge");
        if i % 7 == 0 && i + 5 < node_count {
            model
                .apply_edge(EdgePatch::new(format!("x{i}"), format!("n{i}"), format!("n{}", i + 5)))
                .expect("cross edge");
        }
    }
    model.snapshot()
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_compute");
    let engine = LayoutEngine::default();

    for &node_count in &[50usize, 200usize] {
        let graph = build_roadmap(node_count);
        group.bench_with_input(BenchmarkId::new("roadmap", node_count), &graph, |b, graph| {
            b.iter(|| black_box(engine.compute(black_box(graph)).crossings));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
