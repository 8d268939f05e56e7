//! # K-D Tree Benchmark
//!
//! Compares nearest neighbour queries on a [`KdTree`] with a brute force scan over a closed loop
//! of points similar in size to a simulator track.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector2;

use util::kdtree::KdTree;

/// Number of points in the loop
const NUM_POINTS: usize = 10_902;

/// Build a loop of points around an ellipse
fn track_points() -> Vec<Vector2<f64>> {
    (0..NUM_POINTS)
        .map(|i| {
            let theta = i as f64 / NUM_POINTS as f64 * std::f64::consts::TAU;
            Vector2::new(1200.0 + 900.0 * theta.cos(), 1800.0 + 600.0 * theta.sin())
        })
        .collect()
}

fn brute_force(points: &[Vector2<f64>], query: &Vector2<f64>) -> usize {
    let mut best = 0;
    for (i, p) in points.iter().enumerate() {
        if (p - query).norm_squared() < (points[best] - query).norm_squared() {
            best = i;
        }
    }
    best
}

fn kdtree_benchmark(c: &mut Criterion) {
    let points = track_points();
    let query = Vector2::new(1148.56, 1184.65);

    c.bench_function("kdtree_build", |b| {
        b.iter(|| KdTree::new(black_box(points.clone())))
    });

    let tree = KdTree::new(points.clone()).expect("Track points are valid");

    c.bench_function("kdtree_nearest", |b| {
        b.iter(|| tree.nearest(black_box(&query)))
    });

    c.bench_function("brute_force_nearest", |b| {
        b.iter(|| brute_force(black_box(&points), black_box(&query)))
    });
}

criterion_group!(benches, kdtree_benchmark);
criterion_main!(benches);
