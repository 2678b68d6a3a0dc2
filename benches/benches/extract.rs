//! Extraction benchmarks by downsample factor
//!
//! Run with: cargo bench --bench extract

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use imquery::*;

fn bench_extract_by_factor(c: &mut Criterion) {
    let mut group = c.benchmark_group("Extract by Factor");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.tif");

    let page = Image::filled(Dimensions::new(1024, 768), ColorChannels::RGB, &[40, 80, 120]).unwrap();
    write_pages(&path, &[page], WriterOptions::new().compression(Compression::None)).unwrap();

    for &factor in &consts::REDUCTION_FACTORS {
        group.bench_with_input(BenchmarkId::from_parameter(factor), &factor, |b, &factor| {
            let mut canvas = Image::new(Dimensions::new(1024, 768), ColorChannels::RGB).unwrap();
            b.iter(|| {
                let mut roi = canvas.as_roi_mut();
                extract(black_box(&path), &mut roi, factor, 0).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extract_by_factor);
criterion_main!(benches);
