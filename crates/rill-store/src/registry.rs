#![forbid(unsafe_code)]

//! Ordered callback registry with per-consumer failure isolation.
//!
//! # Design
//!
//! The registry holds delivery callbacks in registration order, keyed by a
//! monotonically increasing [`SubscriberId`]. Broadcast never iterates the
//! live list directly: callers take a [`Registry::snapshot`] first, release
//! the borrow, and invoke the snapshot entries. A consumer may therefore
//! add or remove subscribers mid-broadcast without invalidating the
//! iteration; it will simply not affect the in-flight delivery round.
//!
//! # Invariants
//!
//! 1. Delivery order is registration order.
//! 2. `remove` is idempotent: removing an unknown or already-removed id is
//!    a no-op.
//! 3. A failing consumer never prevents delivery to subsequent consumers;
//!    its error is handed to the caller-supplied hook.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Fallible consumer returns `Err` | Passed to error hook, loop continues |
//! | Consumer removed mid-broadcast | Still receives the in-flight value |
//! | Consumer added mid-broadcast | First sees the *next* broadcast |

use std::rc::Rc;

use crate::error::ConsumerError;

/// A delivery callback receiving broadcast values by reference.
pub type Consumer<T> = Rc<dyn Fn(&T)>;

/// A delivery callback that can report failure, isolated at the broadcast
/// boundary.
pub type FallibleConsumer<T> = Rc<dyn Fn(&T) -> Result<(), ConsumerError>>;

/// Identity token for a registered consumer. Handed out by
/// [`Registry::add`]; used for idempotent removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Raw numeric value, for logging and diagnostics.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A registered delivery callback in one of its two flavors.
pub enum Subscriber<T> {
    /// Plain consumer; cannot report failure.
    Infallible(Consumer<T>),
    /// Consumer whose failures are routed to the error hook.
    Fallible(FallibleConsumer<T>),
}

// Manual Clone: `Rc` handles clone regardless of whether `T: Clone`.
impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Infallible(c) => Self::Infallible(Rc::clone(c)),
            Self::Fallible(c) => Self::Fallible(Rc::clone(c)),
        }
    }
}

impl<T> Subscriber<T> {
    /// Invoke the callback with a broadcast value.
    pub fn invoke(&self, value: &T) -> Result<(), ConsumerError> {
        match self {
            Self::Infallible(c) => {
                c(value);
                Ok(())
            }
            Self::Fallible(c) => c(value),
        }
    }
}

/// Ordered set of delivery callbacks.
pub struct Registry<T> {
    entries: Vec<(SubscriberId, Subscriber<T>)>,
    next_id: u64,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a subscriber at the end of the delivery order.
    pub fn add(&mut self, subscriber: Subscriber<T>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, subscriber));
        id
    }

    /// Remove a subscriber. Idempotent: unknown ids are ignored.
    pub fn remove(&mut self, id: SubscriberId) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot the current delivery list in registration order.
    ///
    /// Broadcast iterates the snapshot, never the live list, so re-entrant
    /// `add`/`remove` during delivery cannot invalidate the iteration.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(SubscriberId, Subscriber<T>)> {
        self.entries.clone()
    }
}

impl<T> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("subscriber_count", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let mut reg: Registry<i32> = Registry::new();
        let a = reg.add(Subscriber::Infallible(Rc::new(|_| {})));
        let b = reg.add(Subscriber::Infallible(Rc::new(|_| {})));
        assert!(a < b);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut reg: Registry<i32> = Registry::new();
        let id = reg.add(Subscriber::Infallible(Rc::new(|_| {})));
        reg.remove(id);
        assert!(reg.is_empty());
        // Second removal of the same id is a no-op.
        reg.remove(id);
        assert!(reg.is_empty());
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let mut reg: Registry<i32> = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ['a', 'b', 'c'] {
            let log = Rc::clone(&log);
            reg.add(Subscriber::Infallible(Rc::new(move |_| {
                log.borrow_mut().push(tag);
            })));
        }
        for (_, sub) in reg.snapshot() {
            sub.invoke(&0).unwrap();
        }
        assert_eq!(*log.borrow(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn fallible_subscriber_reports_error() {
        let sub: Subscriber<i32> = Subscriber::Fallible(Rc::new(|v| {
            if *v < 0 {
                Err(crate::ConsumerError::new("negative"))
            } else {
                Ok(())
            }
        }));
        assert!(sub.invoke(&1).is_ok());
        assert!(sub.invoke(&-1).is_err());
    }
}
