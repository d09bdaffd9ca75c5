#![forbid(unsafe_code)]

//! Deduplication operator: suppress deliveries equal to the immediately
//! preceding forwarded value.
//!
//! # Design
//!
//! [`dedup`] compares with `PartialEq` (structural equality, the same rule
//! the store's consumers see elsewhere); [`dedup_by`] makes the comparison
//! strategy an explicit configuration point for callers that want identity
//! semantics (`Rc::ptr_eq`) or field projections.
//!
//! # Invariants
//!
//! 1. The first delivery after wrapping is always forwarded.
//! 2. A value equal to the immediately preceding *forwarded* value is
//!    dropped; anything else is forwarded and becomes the new comparison
//!    baseline.
//! 3. Every application of the transformer owns an independent last-value
//!    slot — wrapping two consumers through the same `dedup()` call does not
//!    cross-contaminate their dedup state.
//!
//! The slot borrow is released before the inner consumer runs, so a
//! forwarded delivery may re-enter the pipeline.

use std::cell::RefCell;
use std::rc::Rc;

use rill_store::Consumer;

/// Suppress adjacent duplicates by structural (`PartialEq`) equality.
pub fn dedup<T>() -> impl Fn(Consumer<T>) -> Consumer<T>
where
    T: Clone + PartialEq + 'static,
{
    dedup_by(|prev: &T, next: &T| prev == next)
}

/// Suppress adjacent duplicates with an explicit comparison strategy.
///
/// `same(prev, next)` returning `true` drops `next`.
pub fn dedup_by<T>(same: impl Fn(&T, &T) -> bool + 'static) -> impl Fn(Consumer<T>) -> Consumer<T>
where
    T: Clone + 'static,
{
    let same = Rc::new(same);
    move |inner: Consumer<T>| {
        let same = Rc::clone(&same);
        // Independent per-wrap slot: the last forwarded value.
        let last: RefCell<Option<T>> = RefCell::new(None);
        let wrapped: Consumer<T> = Rc::new(move |value: &T| {
            let duplicate = {
                let mut last = last.borrow_mut();
                match last.as_ref() {
                    Some(prev) if same(prev, value) => true,
                    _ => {
                        *last = Some(value.clone());
                        false
                    }
                }
            };
            if !duplicate {
                inner(value);
            }
        });
        wrapped
    }
}
