//! Header query cost against full pixel decode
//!
//! Run with: cargo bench --bench query_vs_decode

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use imquery::*;
use std::path::Path;

fn create_test_page(width: u32, height: u32) -> Image {
    let mut image = Image::new(Dimensions::new(width, height), ColorChannels::RGB).unwrap();
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            image.data[idx] = ((x * 255) / width) as u8; // R
            image.data[idx + 1] = ((y * 255) / height) as u8; // G
            image.data[idx + 2] = 128; // B
        }
    }
    image
}

fn write_container(path: &Path, pages: usize, size: u32) {
    let images: Vec<_> = (0..pages).map(|_| create_test_page(size, size)).collect();
    write_pages(path, &images, WriterOptions::default()).unwrap();
}

fn bench_query_by_page_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query by Page Count");
    let dir = tempfile::tempdir().unwrap();

    for &pages in &[1usize, 10, 50] {
        let path = dir.path().join(format!("pages_{}.tif", pages));
        write_container(&path, pages, 256);

        group.throughput(Throughput::Elements(pages as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pages), &path, |b, path| {
            b.iter(|| Inspector::open(black_box(path)).page_count());
        });
    }

    group.finish();
}

fn bench_query_vs_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query vs Decode");
    let dir = tempfile::tempdir().unwrap();

    for &size in &[128u32, 512] {
        let path = dir.path().join(format!("size_{}.tif", size));
        write_container(&path, 10, size);
        let label = format!("10x{}x{}", size, size);

        group.bench_with_input(BenchmarkId::new("query", &label), &path, |b, path| {
            b.iter(|| {
                let inspector = Inspector::open(black_box(path));
                (0..inspector.page_count())
                    .map(|i| inspector.width(i).unwrap())
                    .sum::<u32>()
            });
        });

        group.bench_with_input(BenchmarkId::new("decode", &label), &path, |b, path| {
            b.iter(|| {
                read_all(black_box(path), ReadMode::unchanged())
                    .unwrap()
                    .iter()
                    .map(|page| page.width())
                    .sum::<u32>()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_query_by_page_count, bench_query_vs_decode);
criterion_main!(benches);
