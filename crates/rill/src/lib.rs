#![forbid(unsafe_code)]

//! rill: a single-store reactive state/delivery core.
//!
//! One mutable-by-replacement state cell ([`Store`]), pure transition
//! functions lifted into [`Handler`]s, and a composable pipeline of consumer
//! operators ([`dedup`], [`throttle`], coeffect injection) chained fluently
//! against `subscribe` via [`subscribe_pipeline`].
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use rill::{Consumer, MicrotaskQueue, Store, dedup, effect_throttle, subscribe_pipeline};
//!
//! let store = Store::new(0i32);
//! let queue = MicrotaskQueue::new();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let seen_clone = Rc::clone(&seen);
//! let terminal: Consumer<i32> = Rc::new(move |v: &i32| seen_clone.borrow_mut().push(*v));
//!
//! subscribe_pipeline(&store)
//!     .with(dedup())
//!     .with(effect_throttle(&queue))
//!     .call(terminal);
//!
//! let set = store.create_handler(|_: &i32, v: i32| v);
//! set.call(1);
//! set.call(1); // Dropped by dedup.
//! set.call(2);
//! queue.run_until_idle();
//!
//! // Replay (0) passed dedup and entered the first window; 1 and 2 were
//! // coalesced into the fresh value at flush time.
//! assert_eq!(*seen.borrow(), vec![2]);
//! ```
//!
//! The model is single-threaded and cooperative: broadcasts are synchronous
//! and ordered, and the only deferral point is the [`Scheduler`] boundary.

pub use rill_pipeline::{
    BindingId, Coeffect, Configurable, FrameQueue, MicrotaskQueue, PairConsumer, Scheduler, dedup,
    dedup_by, effect_throttle, inject, render_throttle, subscribe_pipeline, throttle,
};
pub use rill_store::{
    Consumer, ConsumerError, FallibleConsumer, FallibleHandler, Handler, Store, SubscriberId,
};

/// Commonly used items, for glob import.
pub mod prelude {
    pub use rill_pipeline::{
        Coeffect, FrameQueue, MicrotaskQueue, Scheduler, dedup, dedup_by, effect_throttle, inject,
        render_throttle, subscribe_pipeline, throttle,
    };
    pub use rill_store::{Consumer, ConsumerError, Handler, Store, SubscriberId};
}
