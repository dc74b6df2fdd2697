#![forbid(unsafe_code)]

//! Process-wide batch strategy for notify passes.
//!
//! Every notify pass hands its listener invocations to the installed
//! strategy as a single flush closure. The default strategy runs the flush
//! immediately on the calling thread; an embedding runtime can install one
//! that wraps or coalesces the flush (frame batching, panic isolation,
//! instrumentation).
//!
//! # Design
//!
//! The holder is a process-wide atomic cell ([`arc_swap::ArcSwap`]), so
//! readers never lock and installs never tear. A pass loads the strategy
//! once at pass start; a swap during a pass affects the next pass, never
//! the one in flight. Strategies are `Send + Sync` because the holder is
//! global even though subscription trees themselves are single-threaded.
//!
//! # Invariants
//!
//! 1. The strategy observed by a pass is the one installed when the pass
//!    started.
//! 2. [`BatchOverride`] restores the previously installed strategy on drop,
//!    including during unwind.
//! 3. The default strategy invokes the flush exactly once, synchronously.
//!
//! # Failure Modes
//!
//! - **Swallowed flush**: a strategy that never invokes the flush drops
//!   every delivery of that pass. Listeners stay registered and the next
//!   pass is unaffected.
//! - **Double flush**: a strategy that invokes the flush twice re-runs the
//!   pass snapshot. Liveness is re-checked per invocation, so listeners
//!   removed by the first run are skipped by the second.
//!
//! # Example
//!
//! ```
//! use frankenstore_core::batch::{self, BatchOverride, BatchStrategy};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let passes = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&passes);
//! let _guard = BatchOverride::install(BatchStrategy::new(move |flush| {
//!     seen.fetch_add(1, Ordering::Relaxed);
//!     flush();
//! }));
//!
//! batch::current_strategy().run(&mut || {});
//! assert_eq!(passes.load(Ordering::Relaxed), 1);
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

#[cfg(feature = "tracing")]
use tracing::trace;

/// Signature of a raw batch strategy: receives the flush closure that
/// performs one notify pass and decides how to run it.
pub type BatchFn = dyn Fn(&mut dyn FnMut()) + Send + Sync;

/// A shareable batch strategy. Cloning is cheap (one `Arc` bump).
#[derive(Clone)]
pub struct BatchStrategy {
    run: Arc<BatchFn>,
}

impl BatchStrategy {
    /// Wraps a closure as a strategy.
    pub fn new(run: impl Fn(&mut dyn FnMut()) + Send + Sync + 'static) -> Self {
        Self { run: Arc::new(run) }
    }

    /// The default strategy: run the flush once, right now.
    #[must_use]
    pub fn immediate() -> Self {
        Self::new(|flush| flush())
    }

    /// Runs `flush` under this strategy.
    pub fn run(&self, flush: &mut dyn FnMut()) {
        (*self.run)(flush);
    }

    #[cfg(test)]
    fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.run, &other.run)
    }
}

impl fmt::Debug for BatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchStrategy").finish_non_exhaustive()
    }
}

static INSTALLED: LazyLock<ArcSwap<BatchStrategy>> =
    LazyLock::new(|| ArcSwap::from_pointee(BatchStrategy::immediate()));

/// Returns the strategy installed at this instant.
///
/// Notify passes call this once at pass start, so the returned handle keeps
/// working even if another thread swaps the holder mid-pass.
#[must_use]
pub fn current_strategy() -> BatchStrategy {
    let guard = INSTALLED.load();
    BatchStrategy::clone(&guard)
}

/// Installs `strategy` for all subsequent passes, process-wide.
pub fn set_strategy(strategy: BatchStrategy) {
    #[cfg(feature = "tracing")]
    trace!("batch strategy replaced");
    let _previous = INSTALLED.swap(Arc::new(strategy));
}

/// Restores the default immediate strategy.
pub fn reset_strategy() {
    set_strategy(BatchStrategy::immediate());
}

fn swap_strategy(strategy: BatchStrategy) -> BatchStrategy {
    let previous = INSTALLED.swap(Arc::new(strategy));
    BatchStrategy::clone(&previous)
}

/// Scoped strategy replacement.
///
/// Installs a strategy on construction and restores the one that was
/// current at install time when dropped. Overrides nest correctly when
/// dropped in reverse install order.
#[must_use = "the previous strategy is restored when the override is dropped"]
pub struct BatchOverride {
    previous: Option<BatchStrategy>,
}

impl BatchOverride {
    /// Swaps `strategy` in and remembers the displaced one.
    pub fn install(strategy: BatchStrategy) -> Self {
        Self {
            previous: Some(swap_strategy(strategy)),
        }
    }
}

impl Drop for BatchOverride {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let _displaced = swap_strategy(previous);
        }
    }
}

impl fmt::Debug for BatchOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOverride")
            .field("restores", &self.previous.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
//
// The holder is process-global and the test harness is multi-threaded, so
// every test here installs strategies that still flush synchronously. Tests
// that suppress or repeat the flush live in `tests/batch_strategies.rs`,
// which runs as its own process.

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Serializes the tests that install into the global holder.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> std::sync::MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn default_strategy_flushes_immediately() {
        let ran = AtomicUsize::new(0);
        BatchStrategy::immediate().run(&mut || {
            ran.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(ran.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn strategy_wraps_the_whole_flush() {
        let order = std::sync::Mutex::new(Vec::new());
        let strategy = BatchStrategy::new(|flush| {
            flush();
        });
        strategy.run(&mut || {
            order.lock().unwrap().push("inner");
        });
        assert_eq!(*order.lock().unwrap(), ["inner"]);
    }

    #[test]
    fn override_installs_and_restores() {
        let _serial = serial();
        let before = current_strategy();
        let wrapped = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&wrapped);
        {
            let _guard = BatchOverride::install(BatchStrategy::new(move |flush| {
                seen.fetch_add(1, Ordering::Relaxed);
                flush();
            }));
            current_strategy().run(&mut || {});
            assert!(wrapped.load(Ordering::Relaxed) >= 1);
        }
        // After the guard drops, the displaced strategy is back.
        assert!(current_strategy().ptr_eq(&before));
    }

    #[test]
    fn nested_overrides_unwind_in_reverse_order() {
        let _serial = serial();
        let base = current_strategy();
        {
            let _outer = BatchOverride::install(BatchStrategy::new(|flush| flush()));
            let outer_installed = current_strategy();
            {
                let _inner = BatchOverride::install(BatchStrategy::new(|flush| flush()));
                assert!(!current_strategy().ptr_eq(&outer_installed));
            }
            assert!(current_strategy().ptr_eq(&outer_installed));
        }
        assert!(current_strategy().ptr_eq(&base));
    }

    #[test]
    fn clone_shares_the_closure() {
        let strategy = BatchStrategy::immediate();
        let copy = strategy.clone();
        assert!(strategy.ptr_eq(&copy));
    }
}
