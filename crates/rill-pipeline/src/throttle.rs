#![forbid(unsafe_code)]

//! Throttling/coalescing operator: at most one delivery per scheduling
//! window, always carrying the freshest value.
//!
//! # Design
//!
//! Each input overwrites a private "latest" slot. If no delivery is pending,
//! one is scheduled; when the scheduler fires it, the pending flag is
//! cleared, the latest value is taken, and the inner consumer runs exactly
//! once. Intermediate values are coalesced away; the caller is never
//! blocked — inputs while a delivery is pending return immediately.
//!
//! The pending flag is cleared *before* the inner delivery runs. Clearing
//! it after would lose an input arriving re-entrantly from inside the
//! delivered consumer: the latest slot would refill with no scheduled task
//! left to drain it.
//!
//! # Invariants
//!
//! 1. At most one inner delivery per scheduling window.
//! 2. The delivered value is the most recently recorded input at firing
//!    time — never stale, never out of order.
//! 3. A scheduled delivery cannot be cancelled; it fires on the owner's
//!    next drain (and is a no-op if the latest slot is somehow empty).
//!
//! Two named instantiations cover the two runtime cadences:
//! [`effect_throttle`] (microtask queue, effect processing) and
//! [`render_throttle`] (frame queue, render processing). Both share this
//! single coalescing code path and differ only in the scheduler supplied.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use rill_store::Consumer;

use crate::scheduler::{FrameQueue, MicrotaskQueue, Scheduler};

/// Coalesce inputs into one latest-value delivery per window of `scheduler`.
pub fn throttle<T>(scheduler: Rc<dyn Scheduler>) -> impl Fn(Consumer<T>) -> Consumer<T>
where
    T: Clone + 'static,
{
    move |inner: Consumer<T>| {
        let scheduler = Rc::clone(&scheduler);
        let latest: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        let pending = Rc::new(Cell::new(false));
        let wrapped: Consumer<T> = Rc::new(move |value: &T| {
            *latest.borrow_mut() = Some(value.clone());
            if pending.get() {
                return;
            }
            pending.set(true);
            let latest = Rc::clone(&latest);
            let pending = Rc::clone(&pending);
            let inner = Rc::clone(&inner);
            scheduler.schedule(Box::new(move || {
                pending.set(false);
                let value = latest.borrow_mut().take();
                if let Some(value) = value {
                    trace!("delivering coalesced value");
                    inner(&value);
                }
            }));
        });
        wrapped
    }
}

/// Throttle bound to the microtask queue: the effect-processing cadence.
pub fn effect_throttle<T>(queue: &MicrotaskQueue) -> impl Fn(Consumer<T>) -> Consumer<T> + use<T>
where
    T: Clone + 'static,
{
    throttle(Rc::new(queue.clone()))
}

/// Throttle bound to the frame queue: the render-processing cadence.
pub fn render_throttle<T>(queue: &FrameQueue) -> impl Fn(Consumer<T>) -> Consumer<T> + use<T>
where
    T: Clone + 'static,
{
    throttle(Rc::new(queue.clone()))
}
