//! Filesystem implementation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use localdb_bench::utils::random_data;
use localdb_storage::{FileSystem, InMemoryFileSystem, OsFileSystem};
use std::path::Path;
use tempfile::TempDir;

/// Write a temp file and rename it over the destination, as a commit does.
fn replace(fs: &dyn FileSystem, dir: &Path, data: &[u8]) {
    let temp = dir.join("target~new");
    let dest = dir.join("target");
    fs.write(&temp, data).unwrap();
    fs.rename(&temp, &dest).unwrap();
}

/// Benchmark in-memory replacement.
fn bench_inmemory_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_replace");

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let fs = InMemoryFileSystem::new();
            fs.create_dir_all(Path::new("/bench")).unwrap();
            let data = random_data(size);

            b.iter(|| replace(&fs, Path::new("/bench"), black_box(&data)));
        });
    }
    group.finish();
}

/// Benchmark replacement on the host filesystem.
fn bench_os_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("os_replace");
    // Use larger sample size for file operations
    group.sample_size(50);

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let fs = OsFileSystem::new();
            let data = random_data(size);

            b.iter(|| replace(&fs, dir.path(), black_box(&data)));
        });
    }
    group.finish();
}

/// Benchmark directory listing.
fn bench_read_dir(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_dir");

    for count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let fs = InMemoryFileSystem::new();
            let dir = Path::new("/bench");
            fs.create_dir_all(dir).unwrap();
            for i in 0..count {
                fs.write(&dir.join(format!("file{i}")), b"x").unwrap();
            }

            b.iter(|| black_box(fs.read_dir(dir).unwrap().len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_inmemory_replace, bench_os_replace, bench_read_dir);
criterion_main!(benches);
