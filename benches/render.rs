//! Rendering Benchmarks
//!
//! End-to-end cost of `Renderer::render`, from request to PNG bytes, for plots of one
//! and several series, for the diagnostic path, and for a batch of independent
//! requests rendered in parallel with `render_many`.
//!
//! ## Usage
//!
//! Run with: `cargo bench --bench render`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fnplot::{PlotRequest, Renderer};

fn benchmark_render(c: &mut Criterion) {
    let renderer = Renderer::default();
    let cases = [
        ("single", PlotRequest::new("sin(x)", -10.0, 10.0)),
        (
            "four_series",
            PlotRequest::new("sin(x); cos(x); x^2 / 10; exp(-x^2)", -10.0, 10.0),
        ),
        ("poles", PlotRequest::new("tan(x); 1/x; log(x)", -10.0, 10.0)),
        ("diagnostic", PlotRequest::new("y + 1", -10.0, 10.0)),
    ];

    let mut group = c.benchmark_group("Render");
    group.sample_size(20);

    for (name, request) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), request, |b, request| {
            b.iter(|| black_box(renderer.render(black_box(request))))
        });
    }

    group.finish();
}

fn benchmark_render_many(c: &mut Criterion) {
    let renderer = Renderer::default();
    let requests: Vec<PlotRequest> = (1..=16)
        .map(|i| PlotRequest::new("sin(x) * x; cos(x)", -(i as f64), i as f64))
        .collect();

    let mut group = c.benchmark_group("Render Many");
    group.sample_size(10);
    group.throughput(Throughput::Elements(requests.len() as u64));

    group.bench_function("sequential", |b| {
        b.iter(|| {
            black_box(
                requests
                    .iter()
                    .map(|request| renderer.render(request))
                    .collect::<Vec<_>>(),
            )
        })
    });
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(renderer.render_many(black_box(&requests))))
    });

    group.finish();
}

criterion_group!(benches, benchmark_render, benchmark_render_many);
criterion_main!(benches);
