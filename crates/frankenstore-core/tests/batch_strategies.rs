//! Batch strategy behavior under replacement, suppression, and nesting.
//!
//! The strategy holder is process-global, so this file keeps every test
//! that installs a non-flushing or counting strategy in one binary (its
//! own process), serialized through a local mutex.

use frankenstore_core::batch::{self, BatchOverride, BatchStrategy};
use frankenstore_core::listener::ListenerList;
use frankenstore_harness::{NotifyLog, TestStore, chain};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A strategy that counts its invocations and still flushes.
fn counting_strategy() -> (Arc<AtomicUsize>, BatchStrategy) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let strategy = BatchStrategy::new(move |flush| {
        seen.fetch_add(1, Ordering::Relaxed);
        flush();
    });
    (calls, strategy)
}

#[test]
fn replacement_strategy_wraps_each_pass_exactly_once() {
    let _serial = serial();
    let list = ListenerList::new();
    let log = NotifyLog::new();
    let _a = list.subscribe(log.probe("a"));
    let _b = list.subscribe(log.probe("b"));

    let (calls, strategy) = counting_strategy();
    let _guard = BatchOverride::install(strategy);

    list.notify();
    assert_eq!(calls.load(Ordering::Relaxed), 1, "one pass, one strategy call");
    assert_eq!(log.events(), ["a", "b"], "all deliveries inside the wrapped flush");

    list.notify();
    assert_eq!(calls.load(Ordering::Relaxed), 2);
}

#[test]
fn pass_keeps_the_strategy_loaded_at_pass_start() {
    let _serial = serial();
    let list = ListenerList::new();
    let log = NotifyLog::new();
    let _a = list.subscribe(log.probe("a"));

    let (late_calls, late) = counting_strategy();
    // Swaps the holder mid-pass, then flushes. The in-flight pass must
    // still complete here; the swap only routes the next pass.
    let swapper = BatchStrategy::new(move |flush| {
        batch::set_strategy(late.clone());
        flush();
    });

    batch::set_strategy(swapper);
    list.notify();
    assert_eq!(log.events(), ["a"], "in-flight pass still flushes");
    assert_eq!(late_calls.load(Ordering::Relaxed), 0);

    list.notify();
    assert_eq!(late_calls.load(Ordering::Relaxed), 1);

    batch::reset_strategy();
}

#[test]
fn swallowing_strategy_drops_deliveries_but_keeps_registrations() {
    let _serial = serial();
    let list = ListenerList::new();
    let log = NotifyLog::new();
    let _a = list.subscribe(log.probe("a"));

    {
        let _guard = BatchOverride::install(BatchStrategy::new(|_flush| {
            // Deliberately never invokes the flush.
        }));
        list.notify();
        assert!(log.is_empty(), "suppressed pass must deliver nothing");
        assert_eq!(list.len(), 1, "suppression does not unsubscribe anyone");
    }

    list.notify();
    assert_eq!(log.events(), ["a"], "next pass under the restored strategy delivers");
}

#[test]
fn double_flush_reruns_the_pass_snapshot() {
    let _serial = serial();
    let list = ListenerList::new();
    let log = NotifyLog::new();
    let _a = list.subscribe(log.probe("a"));
    let _b = list.subscribe(log.probe("b"));

    let _guard = BatchOverride::install(BatchStrategy::new(|flush| {
        flush();
        flush();
    }));

    list.notify();
    assert_eq!(log.events(), ["a", "b", "a", "b"]);
}

#[test]
fn set_strategy_applies_until_reset() {
    let _serial = serial();
    let list = ListenerList::new();
    let log = NotifyLog::new();
    let _a = list.subscribe(log.probe("a"));

    let (calls, strategy) = counting_strategy();
    batch::set_strategy(strategy);
    list.notify();
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    batch::reset_strategy();
    list.notify();
    assert_eq!(calls.load(Ordering::Relaxed), 1, "reset stops routing through the old strategy");
    assert_eq!(log.events(), ["a", "a"]);
}

#[test]
fn every_collection_in_a_tree_pass_runs_under_the_strategy() {
    let _serial = serial();
    let store = TestStore::new(0);
    let log = NotifyLog::new();
    let nodes = chain(TestStore::source(&store), 3, &log);

    let (calls, strategy) = counting_strategy();
    let _guard = BatchOverride::install(strategy);

    store.set_state(1);

    // One strategy call per notified collection: the store's own fan-out
    // plus one per node in the chain (the leaf's empty collection included).
    assert_eq!(calls.load(Ordering::Relaxed), nodes.len() + 1);
    assert_eq!(log.events(), ["n0", "n1", "n2"]);
}
