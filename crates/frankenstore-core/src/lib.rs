#![forbid(unsafe_code)]

//! Core: ordered change propagation from a mutable store to a tree of
//! consumers.
//!
//! # Role in FrankenStore
//! `frankenstore-core` is the propagation layer. It owns the subscription
//! tree between an external change source and the consumers reading from
//! it, and guarantees that parents always observe a change before their
//! children do.
//!
//! # Primary responsibilities
//! - **Subscription**: one node in the tree; roots register with the
//!   source, nested nodes with their parent's collection.
//! - **ListenerList**: the ordered fan-out primitive with O(1)
//!   subscribe/unsubscribe and safe reentrancy during passes.
//! - **StoreBinding**: mount lifecycle for a root node, including catch-up
//!   for changes applied while unmounted.
//! - **Batch strategy**: a process-wide, atomically replaceable hook that
//!   wraps each notify pass.
//! - **Equality helpers**: `SameValue`/`ShallowEq` change detection for
//!   memoized state selection.
//!
//! # How it fits in the system
//! Hosts implement [`ChangeSource`] (or the richer [`Store`]) over their
//! state container, hang a [`Subscription`] tree off it, and drive
//! re-evaluation from `on_change` callbacks. Everything is single-threaded
//! by design: `Rc`/`RefCell` plumbing, cooperative delivery, no locks on
//! the delivery path.
//!
//! # Feature flags
//! - `tracing`: structured events for subscription lifecycle and notify
//!   passes via the `tracing` crate. Off by default; zero overhead when
//!   disabled.

pub mod batch;
pub mod binding;
pub mod context;
pub mod equality;
pub mod listener;
pub mod store;
pub mod subscription;

pub use batch::{BatchFn, BatchOverride, BatchStrategy, current_strategy, reset_strategy, set_strategy};
pub use binding::StoreBinding;
pub use equality::{SameValue, ShallowEq, same_value, shallow_equal};
pub use listener::{ListenerId, ListenerList, Unsubscriber};
pub use store::{ChangeSource, Store};
pub use subscription::{Subscription, WeakSubscription};
