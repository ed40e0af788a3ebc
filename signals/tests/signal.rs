mod common;

use std::sync::Arc;

use common::{Counter, watcher};
use signal_cell::*;
use tokio_test::assert_ok;

#[test]
fn initial_value_can_be_read() {
    let signal = assert_ok!(create_signal(13, SignalOptions::new()));
    assert_eq!(*signal.read(), 13);
}

#[test]
fn updates_are_readable_and_observed() {
    let signal = assert_ok!(create_signal(13, SignalOptions::new()));
    let (watch, check) = watcher::<Arc<i32>>();
    let subscription = signal.event(watch);

    signal.update(42);
    assert_eq!(*signal.read(), 42);
    assert_eq!(check(), vec![Arc::new(42)]);

    subscription.cancel();
    signal.update(43);
    assert_eq!(*signal.read(), 43);
    assert!(check().is_empty());
}

#[test]
fn unchanged_values_are_not_dispatched() {
    let signal = assert_ok!(create_signal("a".to_string(), SignalOptions::new()));
    let (watch, check) = watcher::<Arc<String>>();
    signal.event(watch);

    signal.update("a".to_string());
    signal.update("b".to_string());
    signal.update("b".to_string());
    signal.update("a".to_string());
    assert_eq!(check().iter().map(|value| value.as_str().to_owned()).collect::<Vec<_>>(), vec!["b", "a"]);
}

#[test]
fn read_values_are_immutable_snapshots() {
    let signal = assert_ok!(create_signal(vec![1, 2, 3], SignalOptions::new()));
    let mut snapshot = signal.read();
    assert!(Arc::get_mut(&mut snapshot).is_none());

    // changing a copy leaves the stored value alone
    let mut copy = (*snapshot).clone();
    copy.push(4);
    assert_eq!(*signal.read(), vec![1, 2, 3]);

    signal.update(copy);
    assert_eq!(*snapshot, vec![1, 2, 3]);
    assert_eq!(*signal.read(), vec![1, 2, 3, 4]);
}

#[derive(Debug, Clone)]
struct Point {
    x: i32,
    y: i32,
}

#[test]
fn custom_equality() {
    let signal = assert_ok!(create_signal(Point { x: 1, y: 1 }, SignalOptions::with_equality(|a: &Point, b: &Point| a.x == b.x)));
    let (watch, check) = watcher::<Arc<Point>>();
    signal.event(watch);

    signal.update(Point { x: 1, y: 2 });
    assert!(check().is_empty());
    assert_eq!(signal.read().y, 1);

    signal.update(Point { x: 2, y: 2 });
    assert_eq!(check().len(), 1);
    assert_eq!(signal.read().x, 2);
}

#[test]
fn transform_applies_to_every_update() {
    let signal = assert_ok!(create_signal(1, SignalOptions::new().transform(|value: i32| value * 10)));
    assert_eq!(*signal.read(), 10);

    signal.update(4);
    assert_eq!(*signal.read(), 40);
}

#[test]
fn transform_output_is_compared() {
    let signal = assert_ok!(create_signal(1, SignalOptions::new().transform(|value: i32| value / 10)));
    let (watch, check) = watcher::<Arc<i32>>();
    signal.event(watch);

    signal.update(5);
    assert!(check().is_empty());
    signal.update(15);
    assert_eq!(check(), vec![Arc::new(1)]);
}

#[test]
fn input_follows_upstream() {
    let upstream = Cell::new(2.0);
    let signal = assert_ok!(create_signal(0.0, SignalOptions::new().input(upstream.clone())));
    assert_eq!(*signal.read(), 2.0);

    upstream.update(3.0);
    assert_eq!(*signal.read(), 3.0);
}

#[test]
fn input_pushes_once_subscribed() {
    let upstream = Cell::new(1);
    let signal = assert_ok!(create_signal(0, SignalOptions::new().input(upstream.clone()).transform(|value: i32| value + 100)));
    let (watch, check) = watcher::<Arc<i32>>();
    signal.event(watch);
    assert_eq!(upstream.subscriber_count(), 1);

    upstream.update(2);
    upstream.update(3);
    assert_eq!(check(), vec![Arc::new(102), Arc::new(103)]);
}

#[test]
fn updating_a_linked_signal_resyncs_from_upstream() {
    let upstream = Cell::new(5);
    let signal = assert_ok!(create_signal(0, SignalOptions::new().input(upstream.clone())));

    signal.update(99);
    assert_eq!(*signal.read(), 5);
}

#[test]
fn inputs_with_transform() {
    let a = Cell::new(2.0);
    let b = Cell::new(3.0);
    let options = SignalOptions::new().inputs([a.clone(), b.clone()], |sides: Vec<f64>| sides.iter().product::<f64>());
    let signal = assert_ok!(create_signal(0.0, options));
    assert_eq!(*signal.read(), 6.0);

    a.update(3.0);
    assert_eq!(*signal.read(), 9.0);

    let (watch, check) = watcher::<Arc<f64>>();
    signal.event(watch);
    b.update(4.0);
    assert_eq!(check(), vec![Arc::new(12.0)]);
}

#[test]
fn input_and_inputs_conflict() {
    let a = Cell::new(1);
    let options = SignalOptions::new().input(a.clone()).inputs([a], |values: Vec<i32>| values[0]);
    assert_eq!(create_signal(0, options).err(), Some(ConfigError::ConflictingInputs));
}

#[test]
fn subscribe_hooks() {
    let subscribed = Counter::new();
    let first_subscribed = Counter::new();
    let options = {
        let subscribed = subscribed.clone();
        let first_subscribed = first_subscribed.clone();
        SignalOptions::new()
            .on_subscribe(move |_: &Observer<Arc<i32>>| subscribed.increment())
            .on_first_subscribe(move |_: &Observer<Arc<i32>>| first_subscribed.increment())
    };
    let signal = assert_ok!(create_signal(0, options));
    assert_eq!(first_subscribed.get(), 0);

    let subscription = signal.event(|_: Arc<i32>| {});
    subscription.cancel();
    signal.event(|_: Arc<i32>| {});
    assert_eq!(subscribed.get(), 2);
    assert_eq!(first_subscribed.get(), 1);
}

#[test]
fn property_access() {
    let value = Cell::new(1);
    assert_eq!(*value.get(), 1);
    value.set(2);
    assert_eq!(value.get_cloned(), 2);

    let signal = assert_ok!(create_signal(String::from("x"), SignalOptions::new()));
    signal.set("y".to_string());
    assert_eq!(signal.get_cloned(), "y");
}

#[test]
fn event_guard_unsubscribes_on_drop() {
    let value = Cell::new(0);
    let (watch, check) = watcher::<Arc<i32>>();
    {
        let _guard = value.event_guard(watch);
        value.set(1);
    }
    value.set(2);
    assert_eq!(check(), vec![Arc::new(1)]);
    assert_eq!(value.subscriber_count(), 0);
}

#[test]
fn composed_decorators() {
    let a = Cell::new(1);
    let b = Cell::new(2);
    let sum = Cell::new(0).transform(|values: Vec<i32>| values.iter().sum::<i32>()).inputs([a.clone(), b.clone()]);
    let (watch, check) = watcher::<Arc<i32>>();
    sum.event(watch);

    a.set(10);
    assert_eq!(check(), vec![Arc::new(12)]);
}

#[test]
fn dropping_a_linked_signal_releases_upstream() {
    let upstream = Cell::new(1);
    let linked = Cell::new(0).input(upstream.clone());
    linked.event(|_: Arc<i32>| {});
    assert_eq!(upstream.subscriber_count(), 1);

    drop(linked);
    assert_eq!(upstream.subscriber_count(), 0);
}

#[test]
fn subscribing_to_a_composed_input_pulls_upstream() {
    let upstream = Cell::new(5);
    let linked = Cell::new(0).input(upstream.clone());
    let (watch, check) = watcher::<Arc<i32>>();
    linked.event(watch);

    assert_eq!(*linked.read(), 5);
    assert!(check().is_empty());

    upstream.set(6);
    assert_eq!(*linked.read(), 6);
    assert_eq!(check(), vec![Arc::new(6)]);
}

#[test]
fn subscribing_to_composed_inputs_pulls_upstreams() {
    let width = Cell::new(2.0);
    let height = Cell::new(3.0);
    let area = Cell::new(0.0).transform(|sides: Vec<f64>| sides[0] * sides[1]).inputs([width.clone(), height.clone()]);
    area.event(|_: Arc<f64>| {});

    assert_eq!(*area.read(), 6.0);
    height.set(4.0);
    assert_eq!(*area.read(), 8.0);
}

#[test]
fn upstream_change_before_first_subscribe_is_not_lost() {
    let upstream = Cell::new(1);
    let signal = assert_ok!(create_signal(0, SignalOptions::new().input(upstream.clone())));
    upstream.update(2);

    let (watch, check) = watcher::<Arc<i32>>();
    signal.event(watch);
    assert_eq!(*signal.read(), 2);
    assert!(check().is_empty());
}
