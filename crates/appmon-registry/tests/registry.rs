//! `Monitors<T>` create path and observer notification.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, OnceLock, Weak};
use std::thread;
use std::time::Duration;

use appmon_core::metric::Counter;
use appmon_core::{MonitorError, Reportable, ReportableObserver};
use appmon_registry::testing::RecordingObserver;
use appmon_registry::{Monitors, ObserverList};

fn registry() -> (Arc<Monitors<Arc<Counter>>>, Arc<RecordingObserver>) {
    let observers = Arc::new(ObserverList::new());
    let recorder = Arc::new(RecordingObserver::new());
    observers.add(recorder.clone());
    (Arc::new(Monitors::new(observers)), recorder)
}

#[test]
fn concurrent_get_or_create_constructs_once() {
    let (monitors, recorder) = registry();
    let factory_calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let monitors = Arc::clone(&monitors);
            let factory_calls = Arc::clone(&factory_calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                monitors.get_or_create("x", || {
                    factory_calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    Arc::new(Counter::new("x"))
                })
            })
        })
        .collect();

    let instances: Vec<Arc<Counter>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
    assert_eq!(instances.len(), 16);
    assert!(instances.iter().all(|c| Arc::ptr_eq(c, &instances[0])));
    assert_eq!(recorder.count_of("x"), 1);
}

#[test]
fn get_has_no_side_effect() {
    let (monitors, recorder) = registry();
    assert!(monitors.get("missing").is_none());
    assert!(monitors.is_empty());
    assert!(recorder.names().is_empty());
}

#[test]
fn failing_factory_leaves_key_absent() {
    let (monitors, recorder) = registry();
    let res = monitors.try_get_or_create("bad", || {
        Err::<Arc<Counter>, MonitorError>(MonitorError::Internal("boom".into()))
    });

    assert!(res.is_err());
    assert!(monitors.get("bad").is_none());
    assert!(!recorder.contains("bad"));

    let created = monitors
        .try_get_or_create("bad", || Ok::<_, MonitorError>(Arc::new(Counter::new("bad"))))
        .unwrap();
    assert_eq!(created.name(), "bad");
    assert_eq!(recorder.count_of("bad"), 1);
}

#[test]
fn put_overwrites_and_always_notifies() {
    let (monitors, recorder) = registry();
    let first = Arc::new(Counter::new("c"));
    let second = Arc::new(Counter::new("c"));

    assert!(monitors.put("c", Arc::clone(&first)).is_none());
    let previous = monitors.put("c", Arc::clone(&second)).unwrap();

    assert!(Arc::ptr_eq(&previous, &first));
    assert!(Arc::ptr_eq(&monitors.get("c").unwrap(), &second));
    assert_eq!(recorder.count_of("c"), 2);
}

#[test]
fn put_if_absent_keeps_existing() {
    let (monitors, recorder) = registry();
    let first = Arc::new(Counter::new("c"));
    first.increment_by(7);

    assert!(monitors.put_if_absent("c", Arc::clone(&first)).is_none());
    let existing = monitors.put_if_absent("c", Arc::new(Counter::new("c"))).unwrap();

    assert!(Arc::ptr_eq(&existing, &first));
    assert_eq!(monitors.get("c").unwrap().count(), 7);
    assert_eq!(recorder.count_of("c"), 1);
}

#[test]
fn names_and_values_are_sorted() {
    let (monitors, _) = registry();
    for name in ["b", "c", "a"] {
        monitors.get_or_create(name, || Arc::new(Counter::new(name)));
    }
    assert_eq!(monitors.names(), ["a", "b", "c"]);
    let names: Vec<String> = monitors.values().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    let kinds: Vec<&str> = monitors.reportables().iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, ["counter", "counter", "counter"]);
}

#[test]
fn removed_observer_is_not_notified() {
    let observers = Arc::new(ObserverList::new());
    let recorder = Arc::new(RecordingObserver::new());
    let handle: Arc<dyn ReportableObserver> = recorder.clone();
    assert!(observers.add(Arc::clone(&handle)));
    assert!(!observers.add(Arc::clone(&handle)));

    let monitors: Monitors<Arc<Counter>> = Monitors::new(Arc::clone(&observers));
    monitors.get_or_create("before", || Arc::new(Counter::new("before")));
    assert!(observers.remove(&handle));
    monitors.get_or_create("after", || Arc::new(Counter::new("after")));

    assert_eq!(recorder.names(), ["before"]);
}

/// Creates a second counter in the same registry from inside a notification.
struct Chained {
    target: OnceLock<Weak<Monitors<Arc<Counter>>>>,
}

impl ReportableObserver for Chained {
    fn add_new_reportable(&self, reportable: &Reportable) {
        if reportable.name() != "first" {
            return;
        }
        if let Some(monitors) = self.target.get().and_then(Weak::upgrade) {
            monitors.get_or_create("second", || Arc::new(Counter::new("second")));
        }
    }
}

#[test]
fn observer_may_reenter_the_registry() {
    let observers = Arc::new(ObserverList::new());
    let chained = Arc::new(Chained { target: OnceLock::new() });
    observers.add(chained.clone());

    let monitors = Arc::new(Monitors::new(observers));
    chained.target.set(Arc::downgrade(&monitors)).ok().unwrap();

    monitors.get_or_create("first", || Arc::new(Counter::new("first")));
    assert!(monitors.contains_key("second"));
    assert_eq!(monitors.len(), 2);
}
