#![forbid(unsafe_code)]

//! Delivery-order recorder.
//!
//! [`NotifyLog`] is a cheap cloneable label sink. Fixtures and tests hand
//! out [`probe`](NotifyLog::probe) closures as listeners, then assert on
//! the recorded sequence.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared append-only log of delivery labels.
#[derive(Clone, Default)]
pub struct NotifyLog {
    events: Rc<RefCell<Vec<String>>>,
}

impl NotifyLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `label` now.
    pub fn record(&self, label: impl Into<String>) {
        self.events.borrow_mut().push(label.into());
    }

    /// A listener that appends `label` every time it fires.
    #[must_use]
    pub fn probe(&self, label: impl Into<String>) -> impl Fn() + 'static {
        let events = Rc::clone(&self.events);
        let label = label.into();
        move || events.borrow_mut().push(label.clone())
    }

    /// Everything recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Position of the first occurrence of `label`.
    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.events.borrow().iter().position(|event| event == label)
    }

    /// How many times `label` was recorded.
    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.as_str() == label)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl fmt::Debug for NotifyLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_records_every_firing() {
        let log = NotifyLog::new();
        let fire = log.probe("x");
        fire();
        fire();
        log.record("manual");

        assert_eq!(log.events(), ["x", "x", "manual"]);
        assert_eq!(log.count("x"), 2);
        assert_eq!(log.position("manual"), Some(2));
        assert_eq!(log.position("missing"), None);
    }

    #[test]
    fn clones_share_the_log() {
        let log = NotifyLog::new();
        let copy = log.clone();
        copy.record("a");
        assert_eq!(log.events(), ["a"]);

        log.clear();
        assert!(copy.is_empty());
    }
}
