//! Benchmarks for ray traversal over the raster index.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Point2;
use paddock_spatial::{PixelCoord, RasterIndex};

fn bench_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace");

    // A kilometer-long ray over empty space: pure tier skipping.
    let empty: RasterIndex<u32> = RasterIndex::new(50.0);
    group.bench_function("empty_1km", |b| {
        b.iter(|| {
            let trace = empty.trace(black_box(Point2::origin()), 0.0, 1000.0, |_| true);
            black_box(trace.range)
        });
    });

    // The same ray with a single obstacle near the far end.
    let mut sparse: RasterIndex<u32> = RasterIndex::new(50.0);
    sparse.insert(PixelCoord::new(45_000, 0), 1);
    group.bench_function("sparse_1km", |b| {
        b.iter(|| {
            let trace = sparse.trace(black_box(Point2::origin()), 0.0, 1000.0, |_| true);
            black_box(trace.hit)
        });
    });

    // A dense wall of pixels right across the ray: worst-case cell scans.
    let mut dense: RasterIndex<u32> = RasterIndex::new(50.0);
    for x in 0..500 {
        dense.insert(PixelCoord::new(x, 0), u32::try_from(x).unwrap_or(0));
    }
    group.bench_function("dense_10m", |b| {
        b.iter(|| {
            let trace = dense.trace(black_box(Point2::origin()), 0.0, 10.0, |v| *v > 400);
            black_box(trace.hit)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_trace);
criterion_main!(benches);
