#![forbid(unsafe_code)]

//! Coeffect operator: inject externally-sourced, time-varying values into a
//! consumer's tuple without storing them in canonical state.
//!
//! # Design
//!
//! A [`Coeffect<T, S>`] couples a producer `Fn() -> S` with a list of
//! bindings. Wrapping a pair-consumer `Fn(&T, &S)` yields an upstream
//! consumer of plain `T`: on every upstream delivery it records the `T` in
//! the binding's own slot, produces a fresh `S`, and forwards the pair.
//! [`Coeffect::trigger`] redelivers out-of-band: it produces `S` **once**
//! and pairs it with each binding's own most recently recorded `T`.
//! Bindings wrapped at different times may legitimately hold different
//! values.
//!
//! A binding that has never seen an upstream value is skipped on trigger
//! (there is no valid `T` to pair with); the skip is logged at `trace!`
//! level. Buffering the `S` until the first `T` arrives was considered and
//! rejected as the less conservative choice.
//!
//! # Invariants
//!
//! 1. Each binding tracks its own last upstream value.
//! 2. `trigger` calls the producer exactly once per invocation.
//! 3. A trigger before any upstream delivery for a binding is a defined
//!    no-op for that binding (CoeffectSkip), not an error.
//! 4. `unbind` is idempotent and stops both recording and trigger
//!    deliveries for that binding; the binding list is snapshotted before
//!    trigger delivery, so an in-flight trigger still completes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use rill_store::Consumer;

/// A consumer of an upstream value paired with an injected coeffect value.
pub type PairConsumer<T, S> = Rc<dyn Fn(&T, &S)>;

/// Identity token for a coeffect binding, used for idempotent unbinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

struct Binding<T, S> {
    id: BindingId,
    /// Cleared by `unbind`; a dead binding neither records nor forwards.
    live: Rc<Cell<bool>>,
    /// This binding's own most recently seen upstream value.
    last: Rc<RefCell<Option<T>>>,
    consumer: PairConsumer<T, S>,
}

// Manual Clone: `Rc` handles clone regardless of `T: Clone`.
impl<T, S> Clone for Binding<T, S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            live: Rc::clone(&self.live),
            last: Rc::clone(&self.last),
            consumer: Rc::clone(&self.consumer),
        }
    }
}

struct CoeffectInner<T, S> {
    producer: Box<dyn Fn() -> S>,
    bindings: RefCell<Vec<Binding<T, S>>>,
    next_id: Cell<u64>,
}

/// A producer/trigger pair injecting values from outside canonical state.
///
/// Cloning a `Coeffect` creates a new handle to the **same** binding list.
pub struct Coeffect<T, S> {
    inner: Rc<CoeffectInner<T, S>>,
}

impl<T, S> Clone for Coeffect<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, S> std::fmt::Debug for Coeffect<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coeffect")
            .field("binding_count", &self.inner.bindings.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static, S: 'static> Coeffect<T, S> {
    /// Create a coeffect sourced from `producer`.
    #[must_use]
    pub fn new(producer: impl Fn() -> S + 'static) -> Self {
        Self {
            inner: Rc::new(CoeffectInner {
                producer: Box::new(producer),
                bindings: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Wrap a pair-consumer into an upstream consumer of plain `T`.
    ///
    /// Each upstream delivery records the `T` for this binding, produces a
    /// fresh `S`, and forwards the pair. Returns the upstream consumer and
    /// the binding's id for later [`unbind`](Self::unbind).
    pub fn wrap(&self, consumer: impl Fn(&T, &S) + 'static) -> (Consumer<T>, BindingId) {
        self.wrap_pair(Rc::new(consumer))
    }

    /// [`wrap`](Self::wrap) taking an already-built pair-consumer handle.
    pub fn wrap_pair(&self, consumer: PairConsumer<T, S>) -> (Consumer<T>, BindingId) {
        let id = BindingId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let live = Rc::new(Cell::new(true));
        let last: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        self.inner.bindings.borrow_mut().push(Binding {
            id,
            live: Rc::clone(&live),
            last: Rc::clone(&last),
            consumer: Rc::clone(&consumer),
        });

        let inner = Rc::clone(&self.inner);
        let upstream: Consumer<T> = Rc::new(move |value: &T| {
            if !live.get() {
                return;
            }
            *last.borrow_mut() = Some(value.clone());
            let injected = (inner.producer)();
            consumer(value, &injected);
        });
        (upstream, id)
    }

    /// Produce a fresh `S` once and redeliver it paired with each binding's
    /// own last upstream value. Bindings with no recorded value are
    /// skipped.
    pub fn trigger(&self) {
        // Snapshot first: a consumer may wrap or unbind re-entrantly.
        let snapshot: Vec<Binding<T, S>> = self.inner.bindings.borrow().clone();
        let injected = (self.inner.producer)();
        for binding in &snapshot {
            let value = binding.last.borrow().clone();
            match value {
                Some(value) => (binding.consumer)(&value, &injected),
                None => {
                    trace!(binding = binding.id.0, "coeffect trigger skipped: no upstream value yet");
                }
            }
        }
    }

    /// Remove a binding. Idempotent: unknown ids are ignored. The binding
    /// stops recording upstream values and receives no further trigger
    /// deliveries; a trigger already iterating its snapshot still completes.
    pub fn unbind(&self, id: BindingId) {
        let mut bindings = self.inner.bindings.borrow_mut();
        if let Some(pos) = bindings.iter().position(|b| b.id == id) {
            bindings[pos].live.set(false);
            bindings.remove(pos);
        }
    }

    /// Number of live bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.inner.bindings.borrow().len()
    }
}

/// Transformer form of [`Coeffect::wrap_pair`] for builder chaining: maps a
/// pair-consumer to an upstream consumer, registering the binding as a side
/// effect.
pub fn inject<T, S>(coeffect: &Coeffect<T, S>) -> impl Fn(PairConsumer<T, S>) -> Consumer<T> + use<T, S>
where
    T: Clone + 'static,
    S: 'static,
{
    let coeffect = coeffect.clone();
    move |consumer: PairConsumer<T, S>| coeffect.wrap_pair(consumer).0
}
