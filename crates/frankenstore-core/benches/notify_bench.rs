//! Benchmarks for notify passes and subscription churn
//!
//! Performance budgets:
//! - Flat notify pass (64 listeners): < 5µs
//! - Subscribe + unsubscribe pair: < 200ns
//! - Chain propagation (16 levels): < 20µs
//!
//! Run with: cargo bench -p frankenstore-core --bench notify_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use frankenstore_core::equality::{same_value, shallow_equal};
use frankenstore_core::listener::ListenerList;
use frankenstore_core::store::ChangeSource;
use frankenstore_core::subscription::Subscription;
use frankenstore_harness::TestStore;
use std::cell::Cell;
use std::collections::HashMap;
use std::hint::black_box;
use std::rc::Rc;

// =============================================================================
// Flat listener fan-out
// =============================================================================

fn bench_notify_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener/notify");

    for n in [8usize, 64, 512] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("pass", n), &n, |b, &n| {
            let list = ListenerList::new();
            let hits = Rc::new(Cell::new(0u64));
            let mut guards = Vec::with_capacity(n);
            for _ in 0..n {
                let seen = Rc::clone(&hits);
                guards.push(list.subscribe(move || seen.set(seen.get() + 1)));
            }
            b.iter(|| {
                list.notify();
                black_box(hits.get());
            })
        });
    }

    group.finish();
}

fn bench_subscribe_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener/churn");

    // Pair cost against a list that already holds resident listeners.
    group.bench_function("subscribe_unsubscribe_pair_64_resident", |b| {
        let list = ListenerList::new();
        let residents: Vec<_> = (0..64).map(|_| list.subscribe(|| {})).collect();
        b.iter(|| {
            let guard = list.subscribe(|| {});
            drop(black_box(guard));
        });
        drop(residents);
    });

    group.bench_function("snapshot_ids_64", |b| {
        let list = ListenerList::new();
        let _guards: Vec<_> = (0..64).map(|_| list.subscribe(|| {})).collect();
        b.iter(|| black_box(list.ids()))
    });

    group.finish();
}

// =============================================================================
// Tree propagation
// =============================================================================

/// Standard consumer wiring, with a hit counter instead of a label log so
/// iteration does not accumulate allocations.
fn counting_root(source: Rc<dyn ChangeSource>, hits: &Rc<Cell<u64>>) -> Subscription {
    let node = Subscription::root(source);
    wire_counter(&node, hits);
    node.try_subscribe();
    node
}

fn counting_child(parent: &Subscription, hits: &Rc<Cell<u64>>) -> Subscription {
    let node = Subscription::nested(parent);
    wire_counter(&node, hits);
    node.try_subscribe();
    node
}

fn wire_counter(node: &Subscription, hits: &Rc<Cell<u64>>) {
    let seen = Rc::clone(hits);
    let fanout = node.downgrade();
    node.set_on_change(move || {
        seen.set(seen.get() + 1);
        if let Some(node) = fanout.upgrade() {
            node.notify_nested_subs();
        }
    });
}

fn bench_chain_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree/chain");

    for depth in [4usize, 16, 64] {
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("set_state", depth), &depth, |b, &depth| {
            let store = TestStore::new(0i32);
            let hits = Rc::new(Cell::new(0u64));
            let mut nodes = Vec::with_capacity(depth);
            nodes.push(counting_root(TestStore::source(&store), &hits));
            for level in 1..depth {
                let child = counting_child(&nodes[level - 1], &hits);
                nodes.push(child);
            }
            b.iter(|| {
                store.set_state(1);
                black_box(hits.get());
            })
        });
    }

    group.finish();
}

fn bench_fan_out_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree/fan_out");

    for width in [8usize, 64] {
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("set_state", width), &width, |b, &width| {
            let store = TestStore::new(0i32);
            let hits = Rc::new(Cell::new(0u64));
            let root = counting_root(TestStore::source(&store), &hits);
            let _leaves: Vec<_> = (0..width).map(|_| counting_child(&root, &hits)).collect();
            b.iter(|| {
                store.set_state(1);
                black_box(hits.get());
            })
        });
    }

    group.finish();
}

// =============================================================================
// Shallow equality
// =============================================================================

fn bench_shallow_equality(c: &mut Criterion) {
    let mut group = c.benchmark_group("equality/shallow");

    group.bench_function("same_value_f64", |b| {
        b.iter(|| black_box(same_value(black_box(&1.5f64), black_box(&1.5f64))))
    });

    group.throughput(Throughput::Elements(256));
    group.bench_function("vec_256_equal", |b| {
        let left: Vec<i64> = (0..256).collect();
        let right = left.clone();
        b.iter(|| black_box(shallow_equal(black_box(&left), black_box(&right))))
    });

    group.throughput(Throughput::Elements(32));
    group.bench_function("hashmap_32_equal", |b| {
        let left: HashMap<String, i64> = (0..32).map(|i| (format!("key{i}"), i)).collect();
        let right = left.clone();
        b.iter(|| black_box(shallow_equal(black_box(&left), black_box(&right))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_notify_pass,
    bench_subscribe_churn,
    bench_chain_propagation,
    bench_fan_out_propagation,
    bench_shallow_equality,
);
criterion_main!(benches);
