#![forbid(unsafe_code)]

//! Prewired subscription-tree fixtures.
//!
//! Every node built here follows the standard consumer wiring: its
//! `on_change` records the node's label in a [`NotifyLog`] and then fans
//! out to the node's own collection. The fan-out closure captures the node
//! weakly, so fixtures drop cleanly.

use std::rc::Rc;

use frankenstore_core::store::ChangeSource;
use frankenstore_core::subscription::Subscription;

use crate::recorder::NotifyLog;

/// Wires `node` to record `label` and then notify its own children.
pub fn wire_fanout(node: &Subscription, label: impl Into<String>, log: &NotifyLog) {
    let log = log.clone();
    let label = label.into();
    let fanout = node.downgrade();
    node.set_on_change(move || {
        log.record(label.clone());
        if let Some(node) = fanout.upgrade() {
            node.notify_nested_subs();
        }
    });
}

/// An active root node over `source`, wired with [`wire_fanout`].
#[must_use]
pub fn labeled_root(source: Rc<dyn ChangeSource>, label: impl Into<String>, log: &NotifyLog) -> Subscription {
    let node = Subscription::root(source);
    wire_fanout(&node, label, log);
    node.try_subscribe();
    node
}

/// An active child of `parent`, wired with [`wire_fanout`].
#[must_use]
pub fn labeled_child(parent: &Subscription, label: impl Into<String>, log: &NotifyLog) -> Subscription {
    let node = Subscription::nested(parent);
    wire_fanout(&node, label, log);
    node.try_subscribe();
    node
}

/// A root-to-leaf chain of `depth` nodes labeled `n0` (root) through
/// `n{depth-1}`. Returns the nodes root-first. `depth` must be at least 1.
#[must_use]
pub fn chain(source: Rc<dyn ChangeSource>, depth: usize, log: &NotifyLog) -> Vec<Subscription> {
    let mut nodes = Vec::with_capacity(depth);
    nodes.push(labeled_root(source, "n0", log));
    for level in 1..depth {
        let child = labeled_child(&nodes[level - 1], format!("n{level}"), log);
        nodes.push(child);
    }
    nodes
}

/// `count` children of `parent` labeled `{prefix}0` through
/// `{prefix}{count-1}`, attached in label order.
#[must_use]
pub fn fan_out(parent: &Subscription, count: usize, prefix: &str, log: &NotifyLog) -> Vec<Subscription> {
    (0..count)
        .map(|index| labeled_child(parent, format!("{prefix}{index}"), log))
        .collect()
}
