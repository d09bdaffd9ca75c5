#![forbid(unsafe_code)]

//! The single-store state cell: replay-on-subscribe, synchronous ordered
//! broadcast, and handler-driven transitions.
//!
//! # Design
//!
//! [`Store<S>`] is a cheap-clone handle (`Rc` to shared interior) owning the
//! canonical state. The state is replaced whole on each committed
//! transition, never mutated in place; exactly one canonical instance exists
//! at any time. Handlers lift pure `(State, Args) -> State` functions into
//! callables bound to the store: invoking one computes the next state,
//! commits it, bumps the version counter, and broadcasts the new snapshot to
//! every registered consumer — synchronously, in registration order, before
//! the call returns.
//!
//! # Invariants
//!
//! 1. `subscribe` delivers the current state to the new consumer exactly
//!    once, synchronously, before returning.
//! 2. Broadcast order is registration order; a broadcast delivers the state
//!    produced by its own transition to every subscriber in its snapshot.
//! 3. A failed transition (fallible handler returning `Err`) leaves state
//!    and version untouched and broadcasts nothing.
//! 4. A failing consumer is reported through the error hook and never stops
//!    delivery to subsequent consumers.
//! 5. The version counter advances by exactly 1 per committed transition.
//!
//! # Re-entrancy
//!
//! Consumers may invoke handlers, subscribe, or unsubscribe mid-broadcast.
//! A handler invoked from inside a broadcast runs a nested, fully
//! synchronous broadcast of its own; no `RefCell` borrow is held across a
//! consumer call, so arbitrary nesting depth is tolerated. Bounding that
//! recursion is deliberately not the store's job: route effect consumers
//! through the pipeline's throttling operator.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Transition returns `Err` | State unchanged, error to handler caller |
//! | Consumer fails mid-broadcast | Error hook fires, loop continues |
//! | Unsubscribe during broadcast | Consumer still sees in-flight value |
//! | Subscribe during broadcast | Replay only; next broadcast onward |

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::error::ConsumerError;
use crate::registry::{Consumer, FallibleConsumer, Registry, Subscriber, SubscriberId};

/// Hook receiving consumer failures during broadcast.
pub type ErrorHook = Rc<dyn Fn(SubscriberId, &ConsumerError)>;

struct StoreInner<S> {
    state: RefCell<S>,
    version: Cell<u64>,
    registry: RefCell<Registry<S>>,
    error_hook: RefCell<ErrorHook>,
}

/// A single reactive state cell with ordered change broadcast.
///
/// Cloning a `Store` creates a new handle to the **same** cell — both
/// handles see the same state and share subscribers.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

// Manual Clone: shares the same Rc.
impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.borrow())
            .field("version", &self.inner.version.get())
            .field("subscriber_count", &self.inner.registry.borrow().len())
            .finish()
    }
}

impl<S: Clone + 'static> Store<S> {
    /// Create a store owning `initial` as its canonical state.
    ///
    /// The default error hook logs consumer failures via `tracing::error!`.
    #[must_use]
    pub fn new(initial: S) -> Self {
        let hook: ErrorHook = Rc::new(|id, err| {
            error!(subscriber = id.raw(), %err, "consumer failed during broadcast");
        });
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(initial),
                version: Cell::new(0),
                registry: RefCell::new(Registry::new()),
                error_hook: RefCell::new(hook),
            }),
        }
    }

    /// Get a clone of the current state.
    #[must_use]
    pub fn get(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// Access the current state by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Number of committed transitions since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of currently registered consumers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Register a consumer and immediately replay the current state to it.
    ///
    /// The replay happens synchronously, exactly once, before `subscribe`
    /// returns; every subsequent committed transition is then forwarded.
    pub fn subscribe(&self, consumer: impl Fn(&S) + 'static) -> SubscriberId {
        self.subscribe_consumer(Rc::new(consumer))
    }

    /// [`subscribe`](Self::subscribe) taking an already-built consumer
    /// handle. Pipeline operators produce these.
    pub fn subscribe_consumer(&self, consumer: Consumer<S>) -> SubscriberId {
        let id = self
            .inner
            .registry
            .borrow_mut()
            .add(Subscriber::Infallible(Rc::clone(&consumer)));
        trace!(subscriber = id.raw(), "subscribed, replaying current state");
        // Clone the state out of the borrow before invoking: the consumer
        // may re-enter the store.
        let current = self.inner.state.borrow().clone();
        consumer(&current);
        id
    }

    /// Register a fallible consumer. Failures, including one during the
    /// replay delivery, are routed to the error hook.
    pub fn subscribe_fallible(
        &self,
        consumer: impl Fn(&S) -> Result<(), ConsumerError> + 'static,
    ) -> SubscriberId {
        let consumer: FallibleConsumer<S> = Rc::new(consumer);
        let id = self
            .inner
            .registry
            .borrow_mut()
            .add(Subscriber::Fallible(Rc::clone(&consumer)));
        let current = self.inner.state.borrow().clone();
        if let Err(err) = consumer(&current) {
            let hook = self.inner.error_hook.borrow().clone();
            hook(id, &err);
        }
        id
    }

    /// Remove a consumer. Idempotent: unknown or already-removed ids are
    /// ignored. A consumer removed mid-broadcast still receives the
    /// in-flight value (delivery iterates a snapshot).
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.registry.borrow_mut().remove(id);
    }

    /// Replace the hook receiving consumer failures.
    pub fn set_error_hook(&self, hook: impl Fn(SubscriberId, &ConsumerError) + 'static) {
        *self.inner.error_hook.borrow_mut() = Rc::new(hook);
    }

    /// Lift a pure transition function into a handler bound to this store.
    ///
    /// Invoking the handler computes `transition(&current, args)`, commits
    /// the result, and broadcasts it before returning. Broadcast is
    /// unconditional — equality-based suppression belongs to the dedup
    /// operator, not the store.
    pub fn create_handler<A: 'static>(
        &self,
        transition: impl Fn(&S, A) -> S + 'static,
    ) -> Handler<A> {
        let inner = Rc::clone(&self.inner);
        Handler {
            run: Rc::new(move |args: A| {
                let next = {
                    let state = inner.state.borrow();
                    transition(&state, args)
                };
                commit_and_broadcast(&inner, next);
            }),
        }
    }

    /// Lift a fallible transition into a handler. On `Err` the state and
    /// version are untouched, nothing is broadcast, and the error propagates
    /// to the caller of [`FallibleHandler::call`].
    pub fn create_fallible_handler<A: 'static, E: 'static>(
        &self,
        transition: impl Fn(&S, A) -> Result<S, E> + 'static,
    ) -> FallibleHandler<A, E> {
        let inner = Rc::clone(&self.inner);
        FallibleHandler {
            run: Rc::new(move |args: A| -> Result<(), E> {
                let next = {
                    let state = inner.state.borrow();
                    transition(&state, args)?
                };
                commit_and_broadcast(&inner, next);
                Ok(())
            }),
        }
    }
}

/// Commit a new state snapshot and broadcast it to the registry snapshot.
///
/// All borrows are released before any consumer runs, so consumers may
/// re-enter the store (nested handler invocations broadcast recursively).
fn commit_and_broadcast<S: Clone>(inner: &Rc<StoreInner<S>>, next: S) {
    inner.state.replace(next);
    inner.version.set(inner.version.get() + 1);
    debug!(version = inner.version.get(), "state committed");

    let snapshot = inner.registry.borrow().snapshot();
    let value = inner.state.borrow().clone();
    let hook = inner.error_hook.borrow().clone();
    for (id, subscriber) in &snapshot {
        if let Err(err) = subscriber.invoke(&value) {
            hook(*id, &err);
        }
    }
}

/// A callable advancing store state through a pure transition.
///
/// Created once at setup time via [`Store::create_handler`]; cheap to clone
/// and intended to live for the process lifetime.
pub struct Handler<A> {
    run: Rc<dyn Fn(A)>,
}

impl<A> Clone for Handler<A> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<A> Handler<A> {
    /// Run the transition with `args` and broadcast the committed state.
    pub fn call(&self, args: A) {
        (self.run)(args);
    }
}

impl<A> std::fmt::Debug for Handler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// A callable advancing store state through a fallible transition.
pub struct FallibleHandler<A, E> {
    run: Rc<dyn Fn(A) -> Result<(), E>>,
}

impl<A, E> Clone for FallibleHandler<A, E> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<A, E> FallibleHandler<A, E> {
    /// Run the transition with `args`. On `Ok` the new state was committed
    /// and broadcast; on `Err` nothing changed.
    pub fn call(&self, args: A) -> Result<(), E> {
        (self.run)(args)
    }
}

impl<A, E> std::fmt::Debug for FallibleHandler<A, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallibleHandler").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
