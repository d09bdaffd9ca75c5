#![forbid(unsafe_code)]

//! Store: the single reactive state cell and its broadcast machinery.
//!
//! # Role in rill
//! `rill-store` owns the canonical application state and the registry of
//! delivery callbacks. Handlers lift pure transition functions into callables
//! that replace the state and broadcast the new snapshot synchronously, in
//! registration order. Everything downstream (dedup, throttling, coeffect
//! injection) lives in `rill-pipeline` and plugs in as wrapped consumers.
//!
//! # Primary responsibilities
//! - **Store**: exclusively owned, mutable-by-replacement state cell with
//!   replay-on-subscribe semantics.
//! - **Registry**: ordered subscriber list with per-consumer failure
//!   isolation.
//! - **Handlers**: pure `(State, Args) -> State` transitions bound to a
//!   store, with atomic commit-then-broadcast.
//!
//! # Concurrency model
//! Single-threaded, cooperative. All shared ownership is `Rc`/`RefCell`;
//! nothing here is `Send`. Correctness rests on two disciplines: the
//! subscriber list is snapshotted before iteration, and no `RefCell` borrow
//! is held across a subscriber call, so consumers may re-enter the store
//! (invoke handlers, subscribe, unsubscribe) mid-broadcast.

pub mod error;
pub mod registry;
pub mod store;

pub use error::ConsumerError;
pub use registry::{Consumer, FallibleConsumer, Registry, Subscriber, SubscriberId};
pub use store::{FallibleHandler, Handler, Store};
