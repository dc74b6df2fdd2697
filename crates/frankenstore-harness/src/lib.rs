#![forbid(unsafe_code)]

//! Test harness and reference fixtures for FrankenStore.
//!
//! # Role in FrankenStore
//! Everything here exists to make propagation behavior observable from the
//! outside: a reference [`TestStore`] with registration bookkeeping, a
//! [`NotifyLog`] for asserting delivery order, and prewired tree fixtures.
//!
//! Nothing in this crate is part of the engine; it is shared between the
//! core crate's integration tests, benches, and downstream consumers that
//! want ready-made fixtures for their own tests.

pub mod fixtures;
pub mod recorder;
pub mod store;

pub use fixtures::{chain, fan_out, labeled_child, labeled_root, wire_fanout};
pub use recorder::NotifyLog;
pub use store::TestStore;
