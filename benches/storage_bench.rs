//! Benchmarks for Timeslicer storage operations

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;
use timeslicer::index::{decode, encode, IndexEntry};
use timeslicer::Engine;

fn codec_benchmarks(c: &mut Criterion) {
    let entry = IndexEntry {
        key: "2024-03-07".to_string(),
        data_offset: 1_048_576,
        data_length: 512,
        index_offset: 31_700,
    };
    let record = encode(&entry).unwrap();

    c.bench_function("index_encode", |b| b.iter(|| encode(black_box(&entry)).unwrap()));
    c.bench_function("index_decode", |b| b.iter(|| decode(black_box(&record)).unwrap()));
}

fn engine_benchmarks(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(temp_dir.path(), "bench").unwrap();
    let value = vec![b'x'; 256];

    // Includes both fsyncs per write
    c.bench_function("set_durable", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine.set(&format!("key_{}", i % 1000), value.clone()).unwrap();
            engine.flush().unwrap();
            i += 1;
        })
    });

    c.bench_function("set_queued", |b| {
        b.iter_batched(
            || value.clone(),
            |v| engine.set("queued", v).unwrap(),
            BatchSize::SmallInput,
        )
    });
    engine.flush().unwrap();

    c.bench_function("get_durable", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let value = engine.get(&format!("key_{}", i % 1000)).unwrap();
            i += 1;
            black_box(value)
        })
    });

    engine.close().unwrap();
}

criterion_group!(benches, codec_benchmarks, engine_benchmarks);
criterion_main!(benches);
