//! End-to-end tests: store, operators, coeffects, and the builder wired
//! together the way an application would use them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rill::{
    Coeffect, Consumer, ConsumerError, FrameQueue, MicrotaskQueue, Store, dedup, effect_throttle,
    inject, render_throttle, subscribe_pipeline,
};

fn collector<T: Clone + 'static>() -> (Consumer<T>, Rc<RefCell<Vec<T>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = Rc::clone(&seen);
    let consumer: Consumer<T> = Rc::new(move |v: &T| seen_clone.borrow_mut().push(v.clone()));
    (consumer, seen)
}

#[test]
fn replay_then_forward_through_full_pipeline() {
    let store = Store::new(10);
    let queue = FrameQueue::new();
    let (terminal, seen) = collector::<i32>();

    subscribe_pipeline(&store)
        .with(dedup())
        .with(render_throttle(&queue))
        .call(terminal);

    // Replay entered the throttle window; nothing delivered until a frame.
    assert!(seen.borrow().is_empty());
    queue.advance_frame();
    assert_eq!(*seen.borrow(), vec![10]);

    let set = store.create_handler(|_: &i32, v: i32| v);
    set.call(11);
    set.call(11); // Suppressed by dedup before reaching the throttle.
    set.call(12);
    queue.advance_frame();
    assert_eq!(*seen.borrow(), vec![10, 12]);
}

#[test]
fn dedup_suppresses_identical_states_across_handlers() {
    #[derive(Clone, PartialEq, Debug)]
    struct App {
        count: i32,
        label: String,
    }

    let store = Store::new(App {
        count: 0,
        label: "idle".into(),
    });
    let (terminal, seen) = collector::<String>();

    // Project out the label, then dedup: count-only changes stay silent.
    let project = {
        move |inner: Consumer<String>| {
            let wrapped: Consumer<App> = Rc::new(move |app: &App| inner(&app.label));
            wrapped
        }
    };
    subscribe_pipeline(&store)
        .with(project)
        .with(dedup())
        .call(terminal);

    let bump = store.create_handler(|app: &App, (): ()| App {
        count: app.count + 1,
        ..app.clone()
    });
    let relabel = store.create_handler(|app: &App, label: String| App {
        label,
        ..app.clone()
    });

    bump.call(());
    bump.call(());
    relabel.call("busy".into());
    bump.call(());

    assert_eq!(*seen.borrow(), vec!["idle".to_string(), "busy".to_string()]);
}

#[test]
fn effect_feedback_loop_settles_without_unbounded_recursion() {
    // An effect consumer that keeps nudging the state toward a target. Routed
    // through the microtask throttle, each nudge lands in a fresh scheduler
    // window instead of recursing synchronously inside the broadcast.
    let store = Store::new(0);
    let queue = MicrotaskQueue::new();
    let nudge = store.create_handler(|state: &i32, (): ()| state + 1);

    let depth = Rc::new(Cell::new(0u32));
    let max_depth = Rc::new(Cell::new(0u32));

    let nudge_clone = nudge.clone();
    let depth_clone = Rc::clone(&depth);
    let max_depth_clone = Rc::clone(&max_depth);
    let effect: Consumer<i32> = Rc::new(move |v: &i32| {
        depth_clone.set(depth_clone.get() + 1);
        max_depth_clone.set(max_depth_clone.get().max(depth_clone.get()));
        if *v < 100 {
            nudge_clone.call(());
        }
        depth_clone.set(depth_clone.get() - 1);
    });

    subscribe_pipeline(&store)
        .with(effect_throttle(&queue))
        .call(effect);

    queue.run_until_idle();
    assert_eq!(store.get(), 100);
    // Every effect invocation ran from the queue, never nested.
    assert_eq!(max_depth.get(), 1);
}

#[test]
fn coeffect_clock_injects_without_polluting_state() {
    // "Current time" lives outside canonical state; a periodic trigger
    // redelivers it paired with each consumer's own last-seen state.
    let now = Rc::new(Cell::new(0u64));
    let now_clone = Rc::clone(&now);
    let clock: Coeffect<String, u64> = Coeffect::new(move || now_clone.get());

    let store = Store::new("booting".to_string());
    let (pairs, seen) = {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let consumer: rill::PairConsumer<String, u64> = Rc::new(move |state: &String, t: &u64| {
            seen_clone.borrow_mut().push((state.clone(), *t));
        });
        (consumer, seen)
    };

    subscribe_pipeline(&store).with(inject(&clock)).call(pairs);
    assert_eq!(*seen.borrow(), vec![("booting".to_string(), 0)]);

    let set = store.create_handler(|_: &String, v: String| v);
    now.set(5);
    set.call("ready".to_string());
    assert_eq!(seen.borrow().last(), Some(&("ready".to_string(), 5)));

    // Time advances with no state change: only the trigger redelivers.
    now.set(9);
    clock.trigger();
    assert_eq!(seen.borrow().last(), Some(&("ready".to_string(), 9)));
    assert_eq!(store.get(), "ready"); // Canonical state untouched by time.
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn coeffect_pairing_property() {
    // Feeding upstream "foo" then triggering twice yields two deliveries,
    // both ("foo", "X").
    let coeffect: Coeffect<String, &str> = Coeffect::new(|| "X");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = Rc::clone(&seen);
    let (upstream, _id) = coeffect.wrap(move |t: &String, s: &&str| {
        seen_clone.borrow_mut().push((t.clone(), *s));
    });

    upstream(&"foo".to_string());
    seen.borrow_mut().clear();
    coeffect.trigger();
    coeffect.trigger();

    assert_eq!(
        *seen.borrow(),
        vec![("foo".to_string(), "X"), ("foo".to_string(), "X")]
    );
}

#[test]
fn throwing_consumer_is_isolated_from_its_neighbors() {
    let store = Store::new(0);
    let failures = Rc::new(Cell::new(0u32));
    let failures_clone = Rc::clone(&failures);
    store.set_error_hook(move |_, _| failures_clone.set(failures_clone.get() + 1));

    store.subscribe_fallible(|v: &i32| {
        if *v % 2 == 1 {
            Err(ConsumerError::new("odd values unsupported"))
        } else {
            Ok(())
        }
    });
    let (healthy, seen) = collector::<i32>();
    store.subscribe_consumer(healthy);

    let set = store.create_handler(|_: &i32, v: i32| v);
    set.call(1);
    set.call(2);
    set.call(3);

    // The healthy consumer saw every broadcast despite its neighbor failing.
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
    assert_eq!(failures.get(), 2);
}

#[test]
fn failed_transition_is_invisible_to_late_subscribers() {
    let store = Store::new(vec![1, 2, 3]);
    let pop_checked = store.create_fallible_handler(|state: &Vec<i32>, (): ()| {
        let mut next = state.clone();
        next.pop().ok_or("empty")?;
        Ok(next)
    });

    pop_checked.call(()).unwrap();
    pop_checked.call(()).unwrap();
    pop_checked.call(()).unwrap();
    assert_eq!(pop_checked.call(()), Err("empty"));

    // A fresh subscription observes the last committed state.
    let (late, seen) = collector::<Vec<i32>>();
    store.subscribe_consumer(late);
    assert_eq!(*seen.borrow(), vec![Vec::<i32>::new()]);
    assert_eq!(store.version(), 3);
}

#[test]
fn render_and_effect_pipelines_coexist() {
    let store = Store::new(0);
    let effects_queue = MicrotaskQueue::new();
    let frames = FrameQueue::new();

    let (effect_sink, effect_seen) = collector::<i32>();
    let (render_sink, render_seen) = collector::<i32>();

    subscribe_pipeline(&store)
        .with(effect_throttle(&effects_queue))
        .call(effect_sink);
    subscribe_pipeline(&store)
        .with(dedup())
        .with(render_throttle(&frames))
        .call(render_sink);

    let set = store.create_handler(|_: &i32, v: i32| v);
    set.call(1);
    set.call(2);

    effects_queue.run_until_idle();
    assert_eq!(*effect_seen.borrow(), vec![2]);
    assert!(render_seen.borrow().is_empty()); // Frame has not run yet.

    frames.advance_frame();
    assert_eq!(*render_seen.borrow(), vec![2]);
}
