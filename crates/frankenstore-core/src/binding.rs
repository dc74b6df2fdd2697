#![forbid(unsafe_code)]

//! Store binding: a mounted root subscription plus the catch-up protocol.
//!
//! [`StoreBinding`] is the host-side companion of a root
//! [`Subscription`]: it wires the root's `on_change` to fan out to nested
//! consumers, activates the upstream registration, and closes the startup
//! race where the store changes between binding construction and mount.
//!
//! # Design
//!
//! - The binding tracks the store version it last observed. [`mount`]
//!   compares the live version against the tracked one and fires a single
//!   catch-up fan-out when they differ; the live delivery path keeps the
//!   tracked version current from then on.
//! - The installed `on_change` holds only a weak handle to the root node,
//!   so a binding that is never unmounted still cannot leak its tree
//!   through the callback slot.
//!
//! # Invariants
//!
//! 1. `mount` and `unmount` are idempotent; dropping the binding unmounts.
//! 2. After `mount` returns, every change applied before the call has
//!    either been delivered live or covered by the catch-up pass.
//! 3. `unmount` severs upstream delivery and clears `on_change`. Nested
//!    consumers keep their nodes and may re-attach after a remount.
//!
//! [`mount`]: StoreBinding::mount

use std::cell::Cell;
use std::rc::Rc;

use crate::store::{ChangeSource, Store};
use crate::subscription::Subscription;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Owns a root subscription over `S` and manages its mount lifecycle.
pub struct StoreBinding<S: Store> {
    store: Rc<S>,
    subscription: Subscription,
    seen_version: Rc<Cell<u64>>,
    mounted: Cell<bool>,
}

impl<S: Store + 'static> StoreBinding<S> {
    /// Builds an unmounted binding rooted at `store`.
    ///
    /// The current store version becomes the tracked snapshot, so changes
    /// applied after this call and before [`mount`](StoreBinding::mount)
    /// are caught up at mount time.
    #[must_use]
    pub fn new(store: Rc<S>) -> Self {
        let source: Rc<dyn ChangeSource> = store.clone();
        Self {
            subscription: Subscription::root(source),
            seen_version: Rc::new(Cell::new(store.version())),
            store,
            mounted: Cell::new(false),
        }
    }

    /// Activates the root registration and fans out one catch-up pass if
    /// the store changed since the tracked snapshot. Idempotent.
    pub fn mount(&self) {
        if self.mounted.get() {
            return;
        }
        let weak = self.subscription.downgrade();
        let store = Rc::clone(&self.store);
        let seen = Rc::clone(&self.seen_version);
        self.subscription.set_on_change(move || {
            seen.set(store.version());
            if let Some(root) = weak.upgrade() {
                root.notify_nested_subs();
            }
        });
        self.subscription.try_subscribe();
        self.mounted.set(true);

        let current = self.store.version();
        if current != self.seen_version.get() {
            self.seen_version.set(current);
            #[cfg(feature = "tracing")]
            debug!(version = current, "catching up change missed while unmounted");
            self.subscription.notify_nested_subs();
        }
    }
}

impl<S: Store> StoreBinding<S> {
    /// Severs upstream delivery and clears `on_change`. Idempotent.
    pub fn unmount(&self) {
        if !self.mounted.get() {
            return;
        }
        self.subscription.try_unsubscribe();
        self.subscription.clear_on_change();
        self.mounted.set(false);
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// The root node; attach nested subscriptions here.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    #[must_use]
    pub fn store(&self) -> &Rc<S> {
        &self.store
    }
}

impl<S: Store> Drop for StoreBinding<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<S: Store> std::fmt::Debug for StoreBinding<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBinding")
            .field("mounted", &self.is_mounted())
            .field("seen_version", &self.seen_version.get())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
