//! Object encoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use localdb_bench::utils::{random_record, Record};
use localdb_codec::{decode, encode, Format};

/// Benchmark encoding in both formats.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for size in [64, 1024, 16384].iter() {
        let record = random_record(*size);
        group.throughput(Throughput::Bytes(*size as u64));
        for format in [Format::Binary, Format::Text] {
            group.bench_with_input(BenchmarkId::new(format.name(), size), &record, |b, record| {
                b.iter(|| {
                    let bytes = encode(black_box(record), format).unwrap();
                    black_box(bytes);
                });
            });
        }
    }
    group.finish();
}

/// Benchmark sniffing and decoding in both formats.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [64, 1024, 16384].iter() {
        let record = random_record(*size);
        group.throughput(Throughput::Bytes(*size as u64));
        for format in [Format::Binary, Format::Text] {
            let bytes = encode(&record, format).unwrap();
            group.bench_with_input(BenchmarkId::new(format.name(), size), &bytes, |b, bytes| {
                b.iter(|| {
                    let decoded: Record = decode(black_box(bytes)).unwrap();
                    black_box(decoded);
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
