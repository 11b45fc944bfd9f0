//! `all` and `all_settled` end to end, including timer-driven inputs.

mod common;

use common::*;
use pledge::{
    assert_fulfilled, assert_rejected, test_complete, test_phase, Error, ErrorKind, Promise,
    PromiseState, Settled, Value,
};

#[test]
fn all_of_empty_list_fulfills_immediately() {
    init_test_logging();
    let (cx, queue) = fresh_cx();
    let p = Promise::all(&cx, Value::List(Vec::new()));
    assert_eq!(p.state(), PromiseState::Fulfilled);
    assert!(queue.is_empty());
    assert_fulfilled!(p, Value::List(Vec::new()));
}

#[test]
fn all_rejects_with_first_rejection() {
    init_test_logging();
    let (cx, queue) = fresh_cx();
    let p = Promise::all(
        &cx,
        vec![
            Value::from(Promise::resolve(&cx, 1)),
            Value::from(Promise::reject(&cx, "e")),
            Value::from(Promise::resolve(&cx, 3)),
        ],
    );
    drain(&queue);
    assert_rejected!(p, Value::from("e"));
}

#[test]
fn all_keeps_input_order_across_timers() {
    init_test_logging();
    test_phase!("all_keeps_input_order_across_timers");
    let host = pledge::test_utils::test_host();
    let cx = host.cx().clone();
    let log = EventLog::new();

    let p = Promise::all(
        &cx,
        vec![
            Value::from(Promise::resolve(&cx, 1)),
            Value::from(delayed_resolve(&host, 50, 2)),
            Value::from(Promise::resolve(&cx, 3)),
        ],
    )
    .then(log.recorder("all"));

    host.run().expect("lab run");
    assert_eq!(log.snapshot(), vec!["all:[1, 2, 3]"]);
    assert_fulfilled!(
        p,
        Value::from(vec![Value::from(1), Value::from(2), Value::from(3)])
    );
    test_complete!("all_keeps_input_order_across_timers");
}

#[test]
fn all_fails_fast_before_slow_inputs_finish() {
    init_test_logging();
    let host = pledge::test_utils::test_host();
    let cx = host.cx().clone();
    let p = Promise::all(
        &cx,
        vec![
            Value::from(delayed_resolve(&host, 100, "slow")),
            Value::from(delayed_reject(&host, 10, "fast failure")),
        ],
    );
    host.run_until(std::time::Duration::from_millis(20))
        .expect("lab run");
    assert_rejected!(p, Value::from("fast failure"));
    host.run().expect("lab run");
    assert_rejected!(p, Value::from("fast failure"));
}

#[test]
fn all_accepts_plain_values_and_thenables() {
    init_test_logging();
    let (cx, queue) = fresh_cx();
    let p = Promise::all(
        &cx,
        vec![
            Value::from("plain"),
            Value::thenable(|r| {
                r.resolve(2);
                Ok(())
            }),
        ],
    );
    drain(&queue);
    assert_fulfilled!(p, Value::from(vec![Value::from("plain"), Value::from(2)]));
}

#[test]
fn all_stays_pending_while_any_input_is_pending() {
    init_test_logging();
    let (cx, queue) = fresh_cx();
    let (never, _resolvers) = Promise::pending(&cx);
    let p = Promise::all(&cx, vec![Value::from(1), never.into()]);
    drain(&queue);
    assert_eq!(p.state(), PromiseState::Pending);
}

#[test]
fn aggregates_reject_non_list_input() {
    init_test_logging();
    let (cx, _queue) = fresh_cx();
    for input in [Value::from(1), Value::from("abc"), Value::Null] {
        let all = Promise::all(&cx, input.clone());
        let settled = Promise::all_settled(&cx, input);
        for p in [all, settled] {
            assert_eq!(
                rejection(&p).as_error().map(Error::kind),
                Some(ErrorKind::InvalidAggregateInput)
            );
        }
    }
}

#[test]
fn all_settled_reports_each_outcome_in_order() {
    init_test_logging();
    test_phase!("all_settled_reports_each_outcome_in_order");
    let host = pledge::test_utils::test_host();
    let cx = host.cx().clone();
    let log = EventLog::new();

    let p = Promise::all_settled(
        &cx,
        vec![
            Value::from(delayed_resolve(&host, 30, "Success")),
            Value::from(Promise::reject(&cx, "Fail")),
        ],
    )
    .then(log.recorder("settled"));

    host.run().expect("lab run");
    assert_eq!(
        log.snapshot(),
        vec!["settled:[{status: fulfilled, value: \"Success\"}, {status: rejected, reason: \"Fail\"}]"]
    );
    let descriptors = fulfillment(&p);
    let items = descriptors.as_list().expect("list");
    assert_eq!(
        items[0].as_outcome(),
        Some(&Settled::Fulfilled(Value::from("Success")))
    );
    assert_eq!(
        items[1].as_outcome(),
        Some(&Settled::Rejected(Value::from("Fail")))
    );
    test_complete!("all_settled_reports_each_outcome_in_order");
}

#[test]
fn all_settled_of_empty_list_fulfills_immediately() {
    init_test_logging();
    let (cx, _queue) = fresh_cx();
    assert_fulfilled!(Promise::all_settled(&cx, Value::List(Vec::new())), Value::List(Vec::new()));
}
