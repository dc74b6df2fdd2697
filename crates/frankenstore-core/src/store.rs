#![forbid(unsafe_code)]

//! Contracts a change source must satisfy to drive a subscription tree.
//!
//! [`ChangeSource`] is deliberately minimal: register a callback, get back
//! a cancel guard. The engine never reads state through it, so anything
//! that can announce "something changed" qualifies. [`Store`] layers state
//! access and a monotonic version counter on top;
//! [`StoreBinding`](crate::binding::StoreBinding) uses the version to
//! detect changes applied while no registration was live.
//!
//! Callback contract for implementors: after a change is applied, every
//! callback registered at that instant must run synchronously on the
//! thread that applied the change. Registrations end only through the
//! returned guard.

use crate::listener::Unsubscriber;

/// Anything that can announce changes to registered callbacks.
pub trait ChangeSource {
    /// Registers `callback` to run after every applied change.
    fn subscribe(&self, callback: Box<dyn Fn()>) -> Unsubscriber;
}

/// A change source with readable state and a change counter.
pub trait Store: ChangeSource {
    /// Snapshot type handed to readers.
    type State;

    /// The current state.
    fn state(&self) -> Self::State;

    /// Monotonic change counter. Equal values from two reads mean no
    /// change was applied between them; the counter never decreases.
    fn version(&self) -> u64;
}
