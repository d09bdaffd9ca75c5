#![forbid(unsafe_code)]

//! Pipeline: consumer-wrapping operators for the rill store.
//!
//! # Role in rill
//! `rill-pipeline` adapts the store's raw stream of state snapshots to what
//! individual consumers actually need. Operators are plain functions mapping
//! a consumer of one shape to a consumer of another; each application owns
//! its private bookkeeping, so independent pipelines never share state.
//!
//! # Primary responsibilities
//! - **Schedulers**: the deferral boundary — microtask-style and
//!   frame-style task queues behind one [`Scheduler`] trait.
//! - **Dedup**: suppress deliveries equal to the immediately preceding one.
//! - **Throttle**: coalesce rapid deliveries into one latest-value delivery
//!   per scheduling window.
//! - **Coeffects**: inject externally-sourced, time-varying values into
//!   consumer tuples without storing them in canonical state.
//! - **Configurable builder**: chain operators fluently against
//!   `Store::subscribe` itself.
//!
//! # How it fits in the system
//! External event → handler → store broadcast → operator-wrapped consumers.
//! Effect consumers routed through [`throttle::effect_throttle`] may invoke
//! handlers again; the scheduler boundary keeps that feedback loop from
//! recursing unboundedly.

pub mod coeffect;
pub mod configurable;
pub mod dedup;
pub mod scheduler;
pub mod throttle;

pub use coeffect::{BindingId, Coeffect, PairConsumer, inject};
pub use configurable::{Configurable, subscribe_pipeline};
pub use dedup::{dedup, dedup_by};
pub use scheduler::{FrameQueue, MicrotaskQueue, Scheduler};
pub use throttle::{effect_throttle, render_throttle, throttle};
