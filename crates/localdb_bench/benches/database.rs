//! Transaction and read path benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use localdb_bench::utils::{populate_instance, populated_store, random_data, random_record, Record};
use localdb_core::{Database, Guid};
use tempfile::TempDir;

/// Benchmark committing a payload replacement.
fn bench_commit_object(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_object");

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let db = Database::open_in_memory().unwrap();
            let mut instance = populate_instance(&db.root_group(), "Target", size, 0);
            let record = random_record(size);

            b.iter(|| {
                instance.open_transaction().unwrap();
                instance.write_object(black_box(&record)).unwrap();
                instance.commit_transaction().unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark a commit touching several blobs at once.
fn bench_commit_blobs(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_blobs");

    for count in [1, 8, 32].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let db = Database::open_in_memory().unwrap();
            let mut instance = populate_instance(&db.root_group(), "Target", 256, count);
            let data = random_data(256);

            b.iter(|| {
                instance.open_transaction().unwrap();
                for i in 0..count {
                    instance.write_data(&format!("blob{i}"), data.clone()).unwrap();
                }
                instance.commit_transaction().unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark queue compaction: repeated writes of the same blob.
fn bench_compaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("compaction");

    for repeats in [1, 16, 128].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(repeats), repeats, |b, &repeats| {
            let db = Database::open_in_memory().unwrap();
            let mut instance = populate_instance(&db.root_group(), "Target", 64, 1);
            let data = random_data(64);

            b.iter(|| {
                instance.open_transaction().unwrap();
                for _ in 0..repeats {
                    instance.write_data("blob0", data.clone()).unwrap();
                }
                instance.commit_transaction().unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark create, rename and remove on the host filesystem.
fn bench_lifecycle_on_disk(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifecycle_on_disk");
    group.sample_size(20);

    group.bench_function("create_rename_remove", |b| {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path()).unwrap();
        let root = db.root_group();
        let record = random_record(1024);

        b.iter(|| {
            let mut instance = root.create_instance("Fresh", Guid::new()).unwrap();
            instance.write_object(&record).unwrap();
            instance.write_data("thumb", vec![0u8; 256]).unwrap();
            instance.commit_transaction().unwrap();

            instance.open_transaction().unwrap();
            instance.set_name("Renamed").unwrap();
            instance.remove().unwrap();
            instance.commit_transaction().unwrap();
        });
    });
    group.finish();
}

/// Benchmark reading a payload.
fn bench_read_object(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_object");

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let db = Database::open_in_memory().unwrap();
            let instance = populate_instance(&db.root_group(), "Target", size, 1);

            b.iter(|| {
                let record: Record = instance.read_object().unwrap();
                black_box(record);
                black_box(instance.read_data("blob0").unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark listing a populated group.
fn bench_children(c: &mut Criterion) {
    let mut group = c.benchmark_group("children");

    for count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let db = populated_store(count, 64);
            let root = db.root_group();

            b.iter(|| {
                let children = root.children().unwrap();
                black_box(children.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_commit_object,
    bench_commit_blobs,
    bench_compaction,
    bench_lifecycle_on_disk,
    bench_read_object,
    bench_children,
);

criterion_main!(benches);
