#![forbid(unsafe_code)]

//! Configurable pipeline builder: chain operators fluently against
//! `Store::subscribe` itself.
//!
//! # Design
//!
//! [`Configurable<A, B>`] is a small wrapper struct holding a callable —
//! never properties attached to a function value. `with(t)` precomposes:
//! `c -> f(t(c))`, re-wrapped so chains keep reading left to right.
//!
//! Applied to `subscribe` via [`subscribe_pipeline`], a chain such as
//!
//! ```ignore
//! subscribe_pipeline(&store)
//!     .with(dedup())
//!     .with(effect_throttle(&queue))
//!     .call(terminal_consumer);
//! ```
//!
//! reads "the terminal consumer is deduplicated, then throttled, before
//! actually subscribing": operators chained *earlier* sit *closer to the
//! store*, so incoming state passes dedup first, then the throttle, then the
//! terminal consumer.

use std::rc::Rc;

use rill_store::{Consumer, Store, SubscriberId};

/// A callable `A -> B` with a chainable precomposition method.
pub struct Configurable<A, B> {
    f: Rc<dyn Fn(A) -> B>,
}

impl<A, B> Clone for Configurable<A, B> {
    fn clone(&self) -> Self {
        Self {
            f: Rc::clone(&self.f),
        }
    }
}

impl<A, B> std::fmt::Debug for Configurable<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configurable").finish_non_exhaustive()
    }
}

impl<A: 'static, B: 'static> Configurable<A, B> {
    /// Wrap a callable.
    pub fn new(f: impl Fn(A) -> B + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    /// Invoke the underlying callable.
    pub fn call(&self, input: A) -> B {
        (self.f)(input)
    }

    /// Precompose with `transformer`: the result maps `c` to
    /// `self(transformer(c))` and can itself be chained again.
    pub fn with<C: 'static>(self, transformer: impl Fn(C) -> A + 'static) -> Configurable<C, B> {
        let f = self.f;
        Configurable::new(move |input: C| f(transformer(input)))
    }
}

/// Lift a store's `subscribe_consumer` into the builder so operator chains
/// terminate in a subscription.
pub fn subscribe_pipeline<S: Clone + 'static>(
    store: &Store<S>,
) -> Configurable<Consumer<S>, SubscriberId> {
    let store = store.clone();
    Configurable::new(move |consumer: Consumer<S>| store.subscribe_consumer(consumer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn call_invokes_wrapped_function() {
        let double = Configurable::new(|n: i32| n * 2);
        assert_eq!(double.call(21), 42);
    }

    #[test]
    fn with_precomposes() {
        let exclaim = Configurable::new(|s: String| format!("{s}!"));
        let shout = exclaim.with(|s: String| s.to_uppercase());
        assert_eq!(shout.call("hey".to_string()), "HEY!");
    }

    #[test]
    fn chained_with_applies_outermost_first() {
        // f(t1(t2(c))): the transformer chained first runs closest to f.
        let base = Configurable::new(|s: String| format!("f({s})"));
        let chained = base
            .with(|s: String| format!("t1({s})"))
            .with(|s: String| format!("t2({s})"));
        assert_eq!(chained.call("c".to_string()), "f(t1(t2(c)))");
    }

    #[test]
    fn operator_order_matches_chain_reading() {
        // Earlier-chained operators wrap *outside* later ones: state flows
        // through them first.
        let store = Store::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let tag = |name: &'static str, order: &Rc<RefCell<Vec<&'static str>>>| {
            let order = Rc::clone(order);
            move |inner: Consumer<i32>| {
                let order = Rc::clone(&order);
                let wrapped: Consumer<i32> = Rc::new(move |v: &i32| {
                    order.borrow_mut().push(name);
                    inner(v);
                });
                wrapped
            }
        };

        let order_clone = Rc::clone(&order);
        let terminal: Consumer<i32> = Rc::new(move |_: &i32| {
            order_clone.borrow_mut().push("terminal");
        });

        subscribe_pipeline(&store)
            .with(tag("first", &order))
            .with(tag("second", &order))
            .call(terminal);

        // Replay delivery traverses the chain: first, second, terminal.
        assert_eq!(*order.borrow(), vec!["first", "second", "terminal"]);
    }

    #[test]
    fn pipeline_terminates_in_subscription() {
        let store = Store::new(5);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let terminal: Consumer<i32> = Rc::new(move |v: &i32| seen_clone.borrow_mut().push(*v));

        let id = subscribe_pipeline(&store).call(terminal);
        assert_eq!(*seen.borrow(), vec![5]); // Replay.

        let set = store.create_handler(|_: &i32, v: i32| v);
        set.call(9);
        assert_eq!(*seen.borrow(), vec![5, 9]);

        store.unsubscribe(id);
        set.call(11);
        assert_eq!(*seen.borrow(), vec![5, 9]);
    }
}
