//! Layout pass and CPU picking benchmarks.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cubefield::layout::{compute_layout, LayoutParams, LayoutStrategy};
use cubefield::math::Ray;
use cubefield::scene::pick::pick_nearest;
use cubefield::scene::record::demo_records;
use glam::Vec3;

fn layout_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_layout");
    let params = LayoutParams {
        jitter_seed: Some(7),
        ..LayoutParams::default()
    };

    for count in [1_000, 10_000] {
        let records = demo_records(count);
        for strategy in LayoutStrategy::ALL {
            group.bench_function(format!("{strategy}/{count}"), |b| {
                b.iter(|| {
                    black_box(compute_layout(
                        black_box(&records),
                        strategy,
                        &params,
                    ))
                });
            });
        }
    }
    group.finish();
}

fn pick_benchmark(c: &mut Criterion) {
    let records = demo_records(10_000);
    let attributes =
        compute_layout(&records, LayoutStrategy::Grid, &LayoutParams::default());
    let Some(ray) = Ray::new(Vec3::new(0.0, 10.0, 200.0), Vec3::NEG_Z) else {
        return;
    };

    c.bench_function("pick_nearest/10000", |b| {
        b.iter(|| black_box(pick_nearest(black_box(&ray), &attributes, 1.5)));
    });
}

criterion_group!(benches, layout_benchmark, pick_benchmark);
criterion_main!(benches);
