//! Benchmarks for the per-frame update/draw traversal
//!
//! Builds a tree shaped like the radar canvas (a polar grid of rings plus a
//! large detections node) and measures one frame against the recording backend.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector3;
use radarview_scene::{NodeKind, RecordingBackend, SceneGraph, SceneNode};

fn build_canvas_like_graph(backend: &mut RecordingBackend, rings: usize, detections: usize) -> SceneGraph {
    let mut graph = SceneGraph::new(SceneNode::new(backend, NodeKind::Group, 1).unwrap());
    let root = graph.root();
    graph.rotate_by(root, 90.0, Vector3::new(0.0, 0.0, 1.0)).unwrap();

    let grid = graph
        .add_child(root, "polar_grid", SceneNode::new(backend, NodeKind::PolarGrid, 2_000).unwrap())
        .unwrap();
    for i in 0..rings {
        let radius = 10.0 * (i + 1) as f32;
        let ring = SceneNode::new(backend, NodeKind::circle(radius), 500).unwrap();
        graph.add_child(grid, &format!("circle_{}", i), ring).unwrap();
    }
    graph
        .add_child(root, "detection_points", SceneNode::new(backend, NodeKind::Detections, detections).unwrap())
        .unwrap();
    graph
}

fn benchmark_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_frame");

    for &detections in &[1_000usize, 10_000, 50_000] {
        let mut backend = RecordingBackend::new();
        let mut graph = build_canvas_like_graph(&mut backend, 16, detections);

        group.bench_with_input(BenchmarkId::new("update_and_draw", detections), &detections, |b, _| {
            b.iter(|| {
                backend.clear();
                graph.update(&mut backend).unwrap();
                graph.draw(&mut backend).unwrap();
                black_box(backend.calls().len())
            })
        });
    }

    group.finish();
}

fn benchmark_world_transforms(c: &mut Criterion) {
    let mut backend = RecordingBackend::new();
    let mut graph = build_canvas_like_graph(&mut backend, 64, 10);
    let leaf = graph.lookup_child("circle_63").unwrap();

    c.bench_function("world_transform_after_invalidate", |b| {
        b.iter(|| {
            graph.translate_by(graph.root(), 0.0, 0.0, 0.0).unwrap();
            black_box(graph.compute_world_transform(leaf).unwrap())
        })
    });
}

criterion_group!(benches, benchmark_frame, benchmark_world_transforms);
criterion_main!(benches);
