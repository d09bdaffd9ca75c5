#![forbid(unsafe_code)]

//! Deferred-execution boundary: the [`Scheduler`] trait and its two
//! single-threaded queue implementations.
//!
//! # Design
//!
//! The throttling operator depends on exactly one external shape: something
//! that accepts a zero-argument task and runs it "soon". Two cadences are
//! provided, mirroring the platform queues they stand in for:
//!
//! - [`MicrotaskQueue`]: `run_until_idle` drains to a fixpoint — tasks
//!   scheduled *while* draining run in the same drain. This is the cadence
//!   for effect processing after each external event.
//! - [`FrameQueue`]: `advance_frame` runs only the tasks that were queued
//!   when the frame began; anything scheduled during the frame waits for the
//!   next one. This is the cadence for render processing.
//!
//! Both are cheap-clone `Rc` handles. A scheduled task cannot be cancelled:
//! once queued, it fires on the next drain.
//!
//! # Invariants
//!
//! 1. Tasks run in FIFO order within a drain.
//! 2. `MicrotaskQueue::run_until_idle` returns with the queue empty.
//! 3. `FrameQueue::advance_frame` runs at most the number of tasks queued
//!    at its start.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

/// A deferral point: accepts a task and guarantees it runs at most once,
/// on the owner's next drain.
pub trait Scheduler {
    /// Queue `task` for the next drain.
    fn schedule(&self, task: Box<dyn FnOnce()>);
}

type TaskQueue = Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>;

/// Microtask-style queue: draining runs newly scheduled tasks too, until
/// the queue is idle.
#[derive(Clone)]
pub struct MicrotaskQueue {
    tasks: TaskQueue,
}

impl Default for MicrotaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MicrotaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether no tasks are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run queued tasks until the queue is empty, including tasks scheduled
    /// by the tasks themselves. The queue borrow is released before each
    /// task runs, so tasks may schedule freely.
    pub fn run_until_idle(&self) {
        let mut ran = 0usize;
        loop {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            trace!(tasks = ran, "microtask queue drained");
        }
    }
}

impl Scheduler for MicrotaskQueue {
    fn schedule(&self, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// Animation-frame-style queue: each frame runs only the tasks queued
/// before it began.
#[derive(Clone)]
pub struct FrameQueue {
    tasks: TaskQueue,
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether no tasks are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run the tasks queued when this call began. Tasks scheduled while the
    /// frame runs stay queued for the next frame.
    pub fn advance_frame(&self) {
        let batch = self.tasks.borrow().len();
        for _ in 0..batch {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
        if batch > 0 {
            trace!(tasks = batch, "frame advanced");
        }
    }
}

impl Scheduler for FrameQueue {
    fn schedule(&self, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.len())
            .finish()
    }
}
