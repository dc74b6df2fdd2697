#![forbid(unsafe_code)]

//! Ordered listener registry with stable slots.
//!
//! [`ListenerList`] is the fan-out primitive under every subscription node:
//! callbacks are invoked in subscription order, removal is O(1), and a
//! removed callback is never invoked again, not even by a pass that was
//! already running when it was removed.
//!
//! # Design
//!
//! - **Slot arena.** Each listener occupies a slot in a `Vec`; removal
//!   vacates the slot, bumps its generation, and pushes the index on a free
//!   list for reuse. A [`ListenerId`] is `(index, generation)`, so a stale
//!   id can never address a slot that was reused in the meantime.
//! - **Intrusive order links.** Subscription order is kept by a doubly
//!   linked list threaded through the slots. Append and unlink are O(1);
//!   a notify pass walks head to tail.
//! - **Snapshot passes.** `notify` records the live `(index, generation)`
//!   pairs at pass start, then re-checks each entry against the arena
//!   immediately before invoking it. No borrow is held while a callback
//!   runs, so callbacks may subscribe, unsubscribe, clear, or start nested
//!   passes on the same list.
//!
//! # Invariants
//!
//! 1. Invocation order equals subscription order among listeners that stay
//!    subscribed for the whole pass.
//! 2. A listener removed at any point before its turn in a pass is not
//!    invoked in that pass.
//! 3. A listener added during a pass is first invoked on the next pass.
//! 4. An [`Unsubscriber`] fires at most once; repeat calls and guards made
//!    stale by [`clear`](ListenerList::clear) are no-ops.
//! 5. Slot generations only grow. A guard or id minted before a `clear`
//!    can never affect a listener that later reuses the same slot.
//!
//! # Performance
//!
//! | Operation     | Complexity                     |
//! |---------------|--------------------------------|
//! | `subscribe()` | O(1) amortized                 |
//! | unsubscribe   | O(1)                           |
//! | `notify()`    | O(L) where L = live listeners  |
//! | `clear()`     | O(L)                           |
//!
//! # Failure Modes
//!
//! - **Panicking callback**: the panic propagates out of `notify` and the
//!   rest of that pass is skipped. The arena stays consistent (no borrow is
//!   held during the invocation), so the list remains usable and the next
//!   pass delivers normally.
//!
//! # Example
//!
//! ```
//! use frankenstore_core::listener::ListenerList;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let list = ListenerList::new();
//! let hits = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&hits);
//! let mut guard = list.subscribe(move || seen.set(seen.get() + 1));
//!
//! list.notify();
//! guard.unsubscribe();
//! list.notify();
//! assert_eq!(hits.get(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::batch;

#[cfg(feature = "tracing")]
use tracing::trace;

type Callback = Rc<dyn Fn()>;

/// Stable identity of one registration in a [`ListenerList`].
///
/// Ids are only meaningful against the list that minted them. Once the
/// registration is removed the id goes permanently dead; it never aliases
/// a later registration, even one that reuses the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId {
    index: usize,
    generation: u64,
}

/// One arena slot. `callback: None` marks a vacant slot awaiting reuse.
struct Slot {
    callback: Option<Callback>,
    generation: u64,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
struct ListState {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl ListState {
    /// Appends `callback` at the tail, reusing a vacant slot if one exists.
    fn insert(&mut self, callback: Callback) -> (usize, u64) {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.callback = Some(callback);
                slot.prev = self.tail;
                slot.next = None;
                index
            }
            None => {
                self.slots.push(Slot {
                    callback: Some(callback),
                    generation: 0,
                    prev: self.tail,
                    next: None,
                });
                self.slots.len() - 1
            }
        };
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        (index, self.slots[index].generation)
    }

    /// Unlinks and vacates the slot if `(index, generation)` is still live.
    ///
    /// Returns the displaced callback so the caller can drop it after
    /// releasing the cell borrow; callback destructors may re-enter here.
    fn vacate(&mut self, index: usize, generation: u64) -> Option<Callback> {
        let slot = self.slots.get(index)?;
        if slot.generation != generation || slot.callback.is_none() {
            return None;
        }
        let (prev, next) = (slot.prev, slot.next);
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[index];
        slot.prev = None;
        slot.next = None;
        slot.generation += 1;
        let callback = slot.callback.take();
        self.free.push(index);
        self.len -= 1;
        callback
    }

    /// Live `(index, generation)` pairs in subscription order.
    fn snapshot(&self) -> Vec<(usize, u64)> {
        let mut pass = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let slot = &self.slots[index];
            pass.push((index, slot.generation));
            cursor = slot.next;
        }
        pass
    }

    /// The callback at `(index, generation)`, if that registration is
    /// still live right now.
    fn live_callback(&self, index: usize, generation: u64) -> Option<Callback> {
        let slot = self.slots.get(index)?;
        if slot.generation == generation {
            slot.callback.clone()
        } else {
            None
        }
    }
}

/// An ordered collection of `Fn()` listeners.
///
/// Cloning a `ListenerList` creates a new handle to the **same** registry;
/// both handles see the same listeners.
pub struct ListenerList {
    state: Rc<RefCell<ListState>>,
}

// Manual Clone: shares the same Rc.
impl Clone for ListenerList {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl Default for ListenerList {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ListState::default())),
        }
    }

    /// Appends `callback` and returns the guard that removes it.
    ///
    /// The guard unsubscribes on drop; call
    /// [`forget`](Unsubscriber::forget) to keep the registration alive for
    /// the lifetime of the list instead.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Unsubscriber {
        let (index, generation) = self.state.borrow_mut().insert(Rc::new(callback));
        let weak = Rc::downgrade(&self.state);
        Unsubscriber::new(move || {
            let Some(state) = weak.upgrade() else { return };
            let displaced = state.borrow_mut().vacate(index, generation);
            drop(displaced);
        })
    }

    /// Runs one notify pass through the current batch strategy.
    ///
    /// The pass covers exactly the listeners live at this instant, in
    /// subscription order. Each entry is re-checked against the arena just
    /// before invocation, so removals that happen mid-pass (including from
    /// inside earlier callbacks) suppress the pending invocation.
    pub fn notify(&self) {
        let pass = self.state.borrow().snapshot();
        #[cfg(feature = "tracing")]
        trace!(listeners = pass.len(), "notify pass");
        let state = Rc::clone(&self.state);
        let mut flush = move || {
            for &(index, generation) in &pass {
                let callback = state.borrow().live_callback(index, generation);
                if let Some(callback) = callback {
                    callback();
                }
            }
        };
        batch::current_strategy().run(&mut flush);
    }

    /// Removes every listener at once.
    ///
    /// Outstanding guards and ids become permanent no-ops. An in-flight
    /// pass stops delivering from the point of the clear onward.
    pub fn clear(&self) {
        let displaced = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let mut displaced = Vec::with_capacity(state.len);
            let mut cursor = state.head;
            while let Some(index) = cursor {
                let slot = &mut state.slots[index];
                cursor = slot.next;
                slot.prev = None;
                slot.next = None;
                slot.generation += 1;
                if let Some(callback) = slot.callback.take() {
                    displaced.push(callback);
                }
                state.free.push(index);
            }
            state.head = None;
            state.tail = None;
            state.len = 0;
            displaced
        };
        // Dropped outside the borrow: callback destructors may re-enter.
        drop(displaced);
    }

    /// Number of live listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the live listeners in subscription order.
    #[must_use]
    pub fn ids(&self) -> Vec<ListenerId> {
        self.state
            .borrow()
            .snapshot()
            .into_iter()
            .map(|(index, generation)| ListenerId { index, generation })
            .collect()
    }

    /// Whether `id` still addresses a live registration.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.state
            .borrow()
            .live_callback(id.index, id.generation)
            .is_some()
    }
}

impl fmt::Debug for ListenerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unsubscriber
// ---------------------------------------------------------------------------

/// Single-shot removal guard for one registration.
///
/// Runs its removal action on the first [`unsubscribe`] call or on drop,
/// whichever comes first; every later call is a no-op. The guard holds only
/// a weak reference to its registry, so keeping a guard does not keep the
/// registry alive.
///
/// [`unsubscribe`]: Unsubscriber::unsubscribe
#[must_use = "dropping an Unsubscriber removes its listener immediately"]
pub struct Unsubscriber {
    action: Option<Box<dyn FnOnce()>>,
}

impl Unsubscriber {
    /// Wraps a removal action.
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// A guard that was never armed. Calling it is a no-op.
    #[must_use]
    pub fn inert() -> Self {
        Self { action: None }
    }

    /// Runs the removal action if it has not run yet.
    pub fn unsubscribe(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    /// Whether the action has already run (or never existed).
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.action.is_none()
    }

    /// Abandons the guard without running it, leaving the registration
    /// live for the lifetime of its registry.
    pub fn forget(mut self) {
        self.action = None;
    }
}

impl Drop for Unsubscriber {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Unsubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscriber")
            .field("spent", &self.is_spent())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
