#![forbid(unsafe_code)]

//! FrankenStore public facade and prelude.
//!
//! Re-exports the propagation engine from `frankenstore-core` under one
//! roof. Depend on this crate unless you need to pin engine internals;
//! `use frankenstore::prelude::*` pulls in the handful of types almost
//! every consumer touches.
//!
//! # Quick start
//!
//! ```
//! use frankenstore::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! struct Bus {
//!     listeners: ListenerList,
//! }
//!
//! impl ChangeSource for Bus {
//!     fn subscribe(&self, callback: Box<dyn Fn()>) -> Unsubscriber {
//!         self.listeners.subscribe(callback)
//!     }
//! }
//!
//! let bus = Rc::new(Bus { listeners: ListenerList::new() });
//! let root = Subscription::root(bus.clone());
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! root.set_on_change(move || log.borrow_mut().push("change"));
//! root.try_subscribe();
//!
//! bus.listeners.notify();
//! assert_eq!(*seen.borrow(), ["change"]);
//! ```

pub use frankenstore_core::{batch, binding, context, equality, listener, store, subscription};

pub use frankenstore_core::{
    BatchFn, BatchOverride, BatchStrategy, ChangeSource, ListenerId, ListenerList, SameValue,
    ShallowEq, Store, StoreBinding, Subscription, Unsubscriber, WeakSubscription,
    current_strategy, reset_strategy, same_value, set_strategy, shallow_equal,
};

/// The types almost every consumer needs.
pub mod prelude {
    pub use frankenstore_core::{
        ChangeSource, ListenerList, Store, StoreBinding, Subscription, Unsubscriber,
        same_value, shallow_equal,
    };
}
