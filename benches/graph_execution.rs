//! Benchmarks for flowchart execution
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flowgraph_rs::{NodeId, NodeManager, NodeRegisterMap, Value};

/// Scale -> Scale x n -> Collect, built from the core register.
fn build_chain(len: usize) -> (NodeManager, Vec<NodeId>) {
    let mut manager = NodeManager::new(&NodeRegisterMap::with_core());
    let source = manager.create_node("Scale").unwrap();
    manager
        .set_input(&source, "in", Value::ScalarSeq((0..256).map(|i| i as f32).collect()))
        .unwrap();

    let mut ids = vec![source.clone()];
    let mut prev = source;
    for _ in 0..len {
        let id = manager.create_node("Scale").unwrap();
        manager.set_parameter(&id, "scale", "1.0001").unwrap();
        manager.connect(&prev, "out", &id, "in").unwrap();
        ids.push(id.clone());
        prev = id;
    }
    let sink = manager.create_node("Collect").unwrap();
    manager.connect(&prev, "out", &sink, "in").unwrap();
    ids.push(sink);
    (manager, ids)
}

fn bench_batch_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_all");

    for len in [10, 100, 1000].iter() {
        let (mut manager, _) = build_chain(*len);
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| black_box(manager.run_all().unwrap()))
        });
    }

    group.finish();
}

fn bench_incremental_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_from_tail");

    // Same chains, re-run from the last few nodes only
    for len in [10, 100, 1000].iter() {
        let (mut manager, ids) = build_chain(*len);
        manager.run_all().unwrap();
        let start = ids[ids.len() - 4].clone();
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| black_box(manager.run_from(&start).unwrap()))
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_compile");

    for len in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, &len| {
            b.iter_with_setup(
                || build_chain(len).0,
                |mut manager| black_box(manager.plan_stats().unwrap()),
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_batch_run,
    bench_incremental_run,
    bench_compile
);
criterion_main!(benches);
