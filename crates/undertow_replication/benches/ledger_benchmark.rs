//! # Spawn Bookkeeping Benchmark
//!
//! Measures the per-entity cost the orchestrator adds on top of the engine:
//! ledger lookups, pending queue churn, and a full walk against the mock
//! engine.
//!
//! Run with: `cargo bench --package undertow_replication`

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use undertow_replication::integration::mock::{MockEngine, MockSpawner};
use undertow_replication::{EntityOrchestrator, PendingDependencyQueue, ReplicationConfig, SpawnLedger, SpawnerRegistry};
use undertow_shared::{Entity, EntityId, Kind, Transform};

fn batch(count: u128) -> Vec<Entity> {
    (0..count)
        .map(|n| Entity::world(EntityId::from_u128(n), Kind::World, Transform::IDENTITY))
        .collect()
}

/// Benchmark: mark then look up every entity of a batch.
fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");

    for count in [100u128, 1_000, 10_000] {
        let entities = batch(count);

        group.bench_with_input(BenchmarkId::new("mark_and_check", count), &entities, |b, entities| {
            b.iter(|| {
                let mut ledger = SpawnLedger::new();
                for entity in entities {
                    ledger.mark_spawned(entity);
                }
                black_box(entities.iter().filter(|e| ledger.was_already_spawned(e)).count())
            });
        });
    }

    group.finish();
}

/// Benchmark: park children under a handful of parents, then drain them.
fn bench_pending(c: &mut Criterion) {
    let children: Vec<Entity> = (0..1_000u128)
        .map(|n| Entity::new(EntityId::from_u128(10_000 + n), Kind::InventoryItem).with_parent(EntityId::from_u128(n % 16)))
        .collect();

    c.bench_function("pending_enqueue_drain_1000", |b| {
        b.iter(|| {
            let mut pending = PendingDependencyQueue::new();
            for child in &children {
                let _ = pending.enqueue(child.clone());
            }
            let mut drained = 0;
            for parent in 0..16 {
                drained += pending.drain(EntityId::from_u128(parent)).len();
            }
            black_box(drained)
        });
    });
}

/// Benchmark: a whole walk, reversed so every entity but the root is parked first.
fn bench_reverse_chain_walk(c: &mut Criterion) {
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().enable_time().build() else {
        return;
    };

    let chain: Vec<Entity> = (0..200u128)
        .rev()
        .map(|n| {
            let entity = Entity::new(EntityId::from_u128(n), Kind::PrefabChild);
            if n == 0 {
                entity
            } else {
                entity.with_parent(EntityId::from_u128(n - 1))
            }
        })
        .collect();

    c.bench_function("walk_reverse_chain_200", |b| {
        b.iter(|| {
            let engine = Arc::new(MockEngine::new());
            let mut registry = SpawnerRegistry::new();
            registry.register(Kind::PrefabChild, MockSpawner::new(Arc::clone(&engine)).shared());
            let mut orchestrator = EntityOrchestrator::new(registry, engine.bindings(), ReplicationConfig::default());

            let result = runtime.block_on(orchestrator.spawn_all(chain.clone()));
            black_box((result, orchestrator.ledger().len()))
        });
    });
}

criterion_group!(benches, bench_ledger, bench_pending, bench_reverse_chain_walk);
criterion_main!(benches);
