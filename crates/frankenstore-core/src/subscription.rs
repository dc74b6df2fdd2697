#![forbid(unsafe_code)]

//! Subscription nodes: the tree between a change source and its consumers.
//!
//! A root node registers directly with an external [`ChangeSource`]; a
//! nested node registers with its parent's listener collection instead.
//! Parents therefore always observe a change before any of their children,
//! which lets each level re-evaluate (and possibly veto further work)
//! before its descendants run.
//!
//! # Design
//!
//! - A node is inactive until [`try_subscribe`](Subscription::try_subscribe).
//!   Activation installs exactly one upward registration and creates the
//!   node's own empty listener collection. Both live in a single enum, so
//!   "registered but collection missing" is unrepresentable.
//! - The upward registration captures a weak reference to the node. A
//!   parent's collection never keeps a dropped child alive; the child's
//!   drop glue unlinks the slot synchronously.
//! - [`add_nested_sub`](Subscription::add_nested_sub) activates the node
//!   first, so attaching consumers leaf-first still produces root-first
//!   registration order along the chain.
//! - The `on_change` callback lives in its own slot, read at delivery
//!   time. Swapping the callback reconfigures behavior without touching
//!   the upstream registration.
//!
//! # Invariants
//!
//! 1. An active node has exactly one upward registration, an inactive node
//!    none. `try_subscribe` and `try_unsubscribe` are idempotent.
//! 2. Deactivation first cancels the upward registration, then clears the
//!    collection. Unsubscribers handed to consumers earlier stay callable
//!    as permanent no-ops.
//! 3. Deactivating a parent severs delivery to its subtree but does not
//!    flip children to inactive; a child must cycle
//!    `try_unsubscribe`/`try_subscribe` itself to re-attach.
//! 4. Reactivation behaves like a first activation: fresh empty
//!    collection, new upward registration.
//!
//! # Example
//!
//! ```
//! use frankenstore_core::listener::{ListenerList, Unsubscriber};
//! use frankenstore_core::store::ChangeSource;
//! use frankenstore_core::subscription::Subscription;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! struct Ticker {
//!     listeners: ListenerList,
//! }
//!
//! impl ChangeSource for Ticker {
//!     fn subscribe(&self, callback: Box<dyn Fn()>) -> Unsubscriber {
//!         self.listeners.subscribe(callback)
//!     }
//! }
//!
//! let ticker = Rc::new(Ticker { listeners: ListenerList::new() });
//! let order = Rc::new(RefCell::new(Vec::new()));
//!
//! let root = Subscription::root(ticker.clone());
//! let seen = Rc::clone(&order);
//! let fanout = root.downgrade();
//! root.set_on_change(move || {
//!     seen.borrow_mut().push("root");
//!     if let Some(root) = fanout.upgrade() {
//!         root.notify_nested_subs();
//!     }
//! });
//! root.try_subscribe();
//!
//! let child = Subscription::nested(&root);
//! let seen = Rc::clone(&order);
//! child.set_on_change(move || seen.borrow_mut().push("child"));
//! child.try_subscribe();
//!
//! ticker.listeners.notify();
//! assert_eq!(*order.borrow(), ["root", "child"]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::listener::{ListenerId, ListenerList, Unsubscriber};
use crate::store::ChangeSource;

#[cfg(feature = "tracing")]
use tracing::trace;

/// What a node registers with when it activates.
enum Upstream {
    /// Root: the external change source itself.
    Source(Rc<dyn ChangeSource>),
    /// Nested: the parent node's listener collection.
    Node(Subscription),
}

/// Activation state. `Active` owns the upward cancel guard and the node's
/// own collection together, so they appear and disappear atomically.
enum Activation {
    Inactive,
    Active {
        cancel: Unsubscriber,
        listeners: ListenerList,
    },
}

struct SubscriptionInner {
    // Field order is load-bearing: `activation` must drop before
    // `upstream` so the cancel guard can still unlink from a parent
    // collection this node keeps alive.
    activation: RefCell<Activation>,
    on_change: RefCell<Option<Rc<dyn Fn()>>>,
    upstream: Upstream,
}

impl SubscriptionInner {
    /// Reads the `on_change` slot at call time and invokes it outside the
    /// borrow. Empty slot means the delivery is dropped here.
    fn invoke_on_change(&self) {
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// One node in the subscription tree.
///
/// Cloning a `Subscription` creates a new handle to the **same** node.
/// Dropping the last handle of an active node deactivates it: the upward
/// registration is cancelled by the guard's drop glue.
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

// Manual Clone: shares the same Rc.
impl Clone for Subscription {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Subscription {
    /// A node that will register directly with `source` on activation.
    #[must_use]
    pub fn root(source: Rc<dyn ChangeSource>) -> Self {
        Self::with_upstream(Upstream::Source(source))
    }

    /// A node that will register with `parent`'s collection on activation.
    #[must_use]
    pub fn nested(parent: &Subscription) -> Self {
        Self::with_upstream(Upstream::Node(parent.clone()))
    }

    fn with_upstream(upstream: Upstream) -> Self {
        Self {
            inner: Rc::new(SubscriptionInner {
                activation: RefCell::new(Activation::Inactive),
                on_change: RefCell::new(None),
                upstream,
            }),
        }
    }

    /// Activates the node if it is inactive; otherwise does nothing.
    ///
    /// Activating a nested node activates its parent first (recursively up
    /// to the root), so the upward chain is always registered root-first.
    pub fn try_subscribe(&self) {
        if self.is_subscribed() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let handler = move || {
            if let Some(inner) = weak.upgrade() {
                inner.invoke_on_change();
            }
        };
        let cancel = match &self.inner.upstream {
            Upstream::Source(source) => source.subscribe(Box::new(handler)),
            Upstream::Node(parent) => parent.add_nested_sub(handler),
        };
        *self.inner.activation.borrow_mut() = Activation::Active {
            cancel,
            listeners: ListenerList::new(),
        };
        #[cfg(feature = "tracing")]
        trace!(nested = self.is_nested(), "subscription activated");
    }

    /// Deactivates the node if it is active; otherwise does nothing.
    ///
    /// Cancels the upward registration first, then clears the collection.
    /// Children keep their own (now severed) state; see the module docs.
    pub fn try_unsubscribe(&self) {
        let previous =
            std::mem::replace(&mut *self.inner.activation.borrow_mut(), Activation::Inactive);
        if let Activation::Active { mut cancel, listeners } = previous {
            cancel.unsubscribe();
            listeners.clear();
            #[cfg(feature = "tracing")]
            trace!(nested = self.is_nested(), "subscription deactivated");
        }
    }

    /// Whether the node currently holds an upward registration.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        matches!(&*self.inner.activation.borrow(), Activation::Active { .. })
    }

    /// Registers `callback` in this node's collection, activating the node
    /// (and its ancestors) first if needed.
    pub fn add_nested_sub(&self, callback: impl Fn() + 'static) -> Unsubscriber {
        self.try_subscribe();
        match self.active_listeners() {
            Some(listeners) => listeners.subscribe(callback),
            None => Unsubscriber::inert(),
        }
    }

    /// Runs one notify pass over this node's collection. No-op when the
    /// node is inactive.
    pub fn notify_nested_subs(&self) {
        if let Some(listeners) = self.active_listeners() {
            listeners.notify();
        }
    }

    /// Delivers a change to this node now: reads the current `on_change`
    /// callback and invokes it if set.
    ///
    /// This is the same path the upward registration takes, exposed so a
    /// host can inject a synthetic delivery.
    pub fn handle_change(&self) {
        self.inner.invoke_on_change();
    }

    /// Installs `callback` as the node's change handler, replacing any
    /// previous one. Takes effect for the next delivery; the upstream
    /// registration is untouched.
    pub fn set_on_change(&self, callback: impl Fn() + 'static) {
        *self.inner.on_change.borrow_mut() = Some(Rc::new(callback));
    }

    /// Empties the `on_change` slot; deliveries become no-ops at this node.
    pub fn clear_on_change(&self) {
        self.inner.on_change.borrow_mut().take();
    }

    #[must_use]
    pub fn has_on_change(&self) -> bool {
        self.inner.on_change.borrow().is_some()
    }

    /// Number of live registrations in this node's collection.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.active_listeners().map_or(0, |listeners| listeners.len())
    }

    /// Ids of the live registrations, in registration order.
    #[must_use]
    pub fn listener_ids(&self) -> Vec<ListenerId> {
        self.active_listeners()
            .map_or_else(Vec::new, |listeners| listeners.ids())
    }

    /// Whether this node registers with a parent node rather than the
    /// external source.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(self.inner.upstream, Upstream::Node(_))
    }

    /// Whether two handles refer to the same node.
    #[must_use]
    pub fn same_node(&self, other: &Subscription) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A weak handle that does not keep the node alive. This is how a
    /// node's own `on_change` can fan out to its collection without
    /// creating a reference cycle.
    #[must_use]
    pub fn downgrade(&self) -> WeakSubscription {
        WeakSubscription {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn active_listeners(&self) -> Option<ListenerList> {
        match &*self.inner.activation.borrow() {
            Activation::Active { listeners, .. } => Some(listeners.clone()),
            Activation::Inactive => None,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("nested", &self.is_nested())
            .field("subscribed", &self.is_subscribed())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Weak counterpart of [`Subscription`].
#[derive(Clone)]
pub struct WeakSubscription {
    inner: Weak<SubscriptionInner>,
}

impl WeakSubscription {
    /// Recovers a strong handle if the node is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Subscription> {
        self.inner.upgrade().map(|inner| Subscription { inner })
    }
}

impl fmt::Debug for WeakSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSubscription")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
