#![forbid(unsafe_code)]

//! In-memory reference store for exercising subscription trees.
//!
//! [`TestStore`] implements the full [`Store`] contract over a plain value:
//! every `set_state`/`update` bumps the version and synchronously notifies
//! registered callbacks in registration order. It also counts `subscribe`
//! calls, which is how tests assert the "exactly one upward registration"
//! property without reaching into engine internals.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use frankenstore_core::listener::{ListenerList, Unsubscriber};
use frankenstore_core::store::{ChangeSource, Store};

/// A store with observable bookkeeping.
///
/// Dispatch goes through a [`ListenerList`], so store-level fan-out obeys
/// the same ordering and reentrancy rules as node collections (and runs
/// under the installed batch strategy, which must therefore flush for
/// deliveries to happen).
pub struct TestStore<S> {
    state: RefCell<S>,
    version: Cell<u64>,
    listeners: ListenerList,
    subscribe_calls: Cell<usize>,
}

impl<S> TestStore<S> {
    #[must_use]
    pub fn new(initial: S) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(initial),
            version: Cell::new(0),
            listeners: ListenerList::new(),
            subscribe_calls: Cell::new(0),
        })
    }

    /// Replaces the state, bumps the version, and notifies.
    ///
    /// Always notifies, even when the new state equals the old one;
    /// change *detection* is the consumer's job.
    pub fn set_state(&self, next: S) {
        *self.state.borrow_mut() = next;
        self.commit();
    }

    /// Mutates the state in place, bumps the version, and notifies.
    pub fn update(&self, mutate: impl FnOnce(&mut S)) {
        mutate(&mut self.state.borrow_mut());
        self.commit();
    }

    fn commit(&self) {
        self.version.set(self.version.get() + 1);
        self.listeners.notify();
    }

    /// Total number of `subscribe` calls ever made on this store.
    #[must_use]
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.get()
    }

    /// Number of currently live registrations.
    #[must_use]
    pub fn live_listeners(&self) -> usize {
        self.listeners.len()
    }
}

impl<S: 'static> TestStore<S> {
    /// Upcasts a shared handle to the trait object roots are built over.
    #[must_use]
    pub fn source(store: &Rc<Self>) -> Rc<dyn ChangeSource> {
        Rc::clone(store) as Rc<dyn ChangeSource>
    }
}

impl<S> ChangeSource for TestStore<S> {
    fn subscribe(&self, callback: Box<dyn Fn()>) -> Unsubscriber {
        self.subscribe_calls.set(self.subscribe_calls.get() + 1);
        self.listeners.subscribe(callback)
    }
}

impl<S: Clone> Store for TestStore<S> {
    type State = S;

    fn state(&self) -> S {
        self.state.borrow().clone()
    }

    fn version(&self) -> u64 {
        self.version.get()
    }
}

impl<S: fmt::Debug> fmt::Debug for TestStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestStore")
            .field("state", &self.state.borrow())
            .field("version", &self.version.get())
            .field("live_listeners", &self.live_listeners())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_state_bumps_version_and_notifies() {
        let store = TestStore::new(0);
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let _guard = store.subscribe(Box::new(move || seen.set(seen.get() + 1)));

        store.set_state(7);
        assert_eq!(store.state(), 7);
        assert_eq!(store.version(), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn update_mutates_in_place() {
        let store = TestStore::new(vec![1, 2]);
        store.update(|items| items.push(3));
        assert_eq!(store.state(), vec![1, 2, 3]);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn equal_state_still_notifies() {
        let store = TestStore::new(5);
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let _guard = store.subscribe(Box::new(move || seen.set(seen.get() + 1)));

        store.set_state(5);
        assert_eq!(hits.get(), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn bookkeeping_tracks_registrations() {
        let store = TestStore::new(());
        assert_eq!(store.subscribe_calls(), 0);

        let mut guard = store.subscribe(Box::new(|| {}));
        assert_eq!(store.subscribe_calls(), 1);
        assert_eq!(store.live_listeners(), 1);

        guard.unsubscribe();
        assert_eq!(store.subscribe_calls(), 1, "calls are cumulative");
        assert_eq!(store.live_listeners(), 0);
    }
}
