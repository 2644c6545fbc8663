//! Performance benchmarks for flatcopy
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flatcopy::config::{Concurrency, FlattenConfig};
use flatcopy::core::FlattenEngine;
use flatcopy::fs::{flatten, split_extension, RelativePath};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Create a test file of the specified size, with parent directories
fn create_test_file(dir: &Path, relative: &str, size: usize) {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut file = File::create(&path).unwrap();
    let chunk: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
    file.write_all(&chunk).unwrap();
}

fn bench_flatten_names(c: &mut Criterion) {
    let paths: Vec<RelativePath> = (0..1000)
        .map(|i| RelativePath::new(format!("proj{}/src/module{}/sub/file_{}.rs", i % 7, i % 13, i)))
        .collect();

    c.bench_function("flatten_1000_paths", |b| {
        b.iter(|| {
            for path in &paths {
                black_box(flatten(path));
            }
        });
    });

    c.bench_function("split_extension", |b| {
        b.iter(|| black_box(split_extension(black_box("archive.tar.gz"))));
    });
}

fn bench_flatten_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten_tree");

    for workers in [1usize, 4, 16] {
        let src_dir = TempDir::new().unwrap();
        for i in 0..200 {
            create_test_file(src_dir.path(), &format!("d{}/e{}/file_{}.dat", i % 10, i % 3, i), 4096);
        }
        group.throughput(Throughput::Bytes(200 * 4096));

        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            b.iter(|| {
                let dst_dir = TempDir::new().unwrap();
                let config = FlattenConfig {
                    source: src_dir.path().to_path_buf(),
                    destination: dst_dir.path().to_path_buf(),
                    concurrency: Concurrency::Bounded(workers),
                    ..Default::default()
                };
                black_box(FlattenEngine::new(config).execute().unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flatten_names, bench_flatten_tree);
criterion_main!(benches);
