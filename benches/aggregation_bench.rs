//! Aggregation throughput: summaries and phase tables per battle, sequential vs parallel batches.
//!
//! Run with: `cargo bench --bench aggregation`

use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fleetview::battle::{load_battle_file, phase_tables, summarize_battle, summarize_battles, BattleRecord};
use fleetview::data::{load_snapshot, NormalizedStore};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn inputs() -> (NormalizedStore, BattleRecord) {
    let store = load_snapshot(&fixture("snapshot.json")).unwrap_or_default();
    let battle = load_battle_file(&fixture("battles/7-2-M.json"))
        .expect("benchmark battle fixture should load");
    (store, battle)
}

fn bench_single_battle(c: &mut Criterion) {
    let (store, battle) = inputs();
    let mut group = c.benchmark_group("aggregation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("summarize_battle", |b| {
        b.iter(|| black_box(summarize_battle(black_box(&store), black_box(&battle))))
    });
    group.bench_function("phase_tables", |b| {
        b.iter(|| black_box(phase_tables(black_box(&store), black_box(&battle))))
    });
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let (store, battle) = inputs();
    let batch: Vec<BattleRecord> = (0..256)
        .map(|i| {
            let mut record = battle.clone();
            record.id = format!("bench-{i}");
            record
        })
        .collect();

    let mut group = c.benchmark_group("batch");
    group.sample_size(30);
    group.throughput(Throughput::Elements(batch.len() as u64));

    group.bench_function("sequential", |b| {
        b.iter(|| {
            black_box(
                batch
                    .iter()
                    .map(|record| summarize_battle(&store, record))
                    .collect::<Vec<_>>(),
            )
        })
    });
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(summarize_battles(&store, &batch)))
    });
    group.finish();
}

criterion_group!(benches, bench_single_battle, bench_batch);
criterion_main!(benches);
