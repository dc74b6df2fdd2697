#![forbid(unsafe_code)]

//! Thread-local root context registry.
//!
//! Hosts that cannot thread a store handle through every constructor can
//! install a default here once and recover it anywhere on the same thread.
//! The registry owns a root [`Subscription`] created inactive, so merely
//! installing a context registers nothing upstream.
//!
//! # Design
//!
//! - One slot per thread. Subscription trees are single-threaded (`Rc`
//!   plumbing throughout), so a process-wide registry would hand out
//!   handles that must not cross threads anyway.
//! - First install wins. Installing over an existing context keeps the
//!   existing one and returns it; replacing requires an explicit
//!   [`uninstall`] first. Accidental double-initialization is therefore an
//!   observable no-op rather than a silent store swap.
//! - Each context carries the crate version as a diagnostic tag so hosts
//!   that end up linking two copies of this crate can tell the two
//!   registries apart when debugging.
//!
//! # Invariants
//!
//! 1. [`current`] returns a handle to the node installed earlier on this
//!    thread, or `None`.
//! 2. `install` never replaces; `uninstall` removes and returns.
//! 3. An uninstalled context keeps working for holders of its handles; the
//!    registry only forgets it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::store::ChangeSource;
use crate::subscription::Subscription;

#[cfg(feature = "tracing")]
use tracing::warn;

const VERSION_TAG: &str = env!("CARGO_PKG_VERSION");

/// The per-thread default source and its root subscription node.
pub struct RootContext {
    source: Rc<dyn ChangeSource>,
    subscription: Subscription,
    version_tag: &'static str,
}

// Manual Clone: both fields are shared handles.
impl Clone for RootContext {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            subscription: self.subscription.clone(),
            version_tag: self.version_tag,
        }
    }
}

impl RootContext {
    /// The installed change source.
    #[must_use]
    pub fn source(&self) -> Rc<dyn ChangeSource> {
        Rc::clone(&self.source)
    }

    /// The root node owned by this context. Created inactive; attach and
    /// activate consumers as with any other root.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Version of the crate that minted this context.
    #[must_use]
    pub fn version_tag(&self) -> &'static str {
        self.version_tag
    }
}

impl fmt::Debug for RootContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootContext")
            .field("version_tag", &self.version_tag)
            .field("subscribed", &self.subscription.is_subscribed())
            .finish_non_exhaustive()
    }
}

thread_local! {
    static ROOT_CONTEXT: RefCell<Option<RootContext>> = const { RefCell::new(None) };
}

/// Installs `source` as this thread's default context.
///
/// First install wins: if a context already exists, it is kept and
/// returned unchanged.
pub fn install(source: Rc<dyn ChangeSource>) -> RootContext {
    ROOT_CONTEXT.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(existing) = &*slot {
            #[cfg(feature = "tracing")]
            warn!(
                version_tag = existing.version_tag,
                "root context already installed; keeping the existing one"
            );
            return existing.clone();
        }
        let context = RootContext {
            subscription: Subscription::root(Rc::clone(&source)),
            source,
            version_tag: VERSION_TAG,
        };
        *slot = Some(context.clone());
        context
    })
}

/// This thread's installed context, if any.
#[must_use]
pub fn current() -> Option<RootContext> {
    ROOT_CONTEXT.with(|slot| slot.borrow().clone())
}

/// Removes and returns this thread's context. Handles already handed out
/// keep working; only the registry slot is emptied.
pub fn uninstall() -> Option<RootContext> {
    ROOT_CONTEXT.with(|slot| slot.borrow_mut().take())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
