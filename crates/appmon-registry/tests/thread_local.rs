//! Thread-local monitor overrides.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Barrier};
use std::thread;

use appmon_core::metric::StateValue;
use appmon_core::{EscapingKeyHandler, TransparentKeyHandler};
use appmon_registry::testing::{PluginCall, RecordingPlugin};
use appmon_registry::{CorePlugin, CoreSettings, InApplicationMonitor, Mode};

fn settings() -> CoreSettings {
    CoreSettings {
        builtin_state_values: false,
        ..CoreSettings::default()
    }
}

fn monitor() -> InApplicationMonitor {
    InApplicationMonitor::with_settings(settings())
}

#[test]
fn override_survives_a_concurrent_reinit() {
    let m = monitor();
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            m.set_thread_local_state();
            m.register_state_value(StateValue::from_fn("v", || Ok(110)))
                .unwrap();
            barrier.wait();
            barrier.wait();

            assert_eq!(m.mode(), Mode::ThreadLocal);
            let v = m.core_plugin().state_value("v").expect("private state value");
            assert_eq!(v.value().unwrap(), 110);
            m.reset_thread_local_state();
        });

        s.spawn(|| {
            barrier.wait();
            assert!(m.core_plugin().state_value("v").is_none());
            m.reset();
            m.init_instance(
                Arc::new(CorePlugin::with_settings(settings())),
                Arc::new(TransparentKeyHandler),
            );
            barrier.wait();
        });
    });

    assert_eq!(m.mode(), Mode::Explicit);
    assert!(m.core_plugin().state_value("v").is_none());
}

#[test]
fn other_threads_keep_the_shared_state() {
    let m = Arc::new(monitor());
    m.set_thread_local_state();
    m.increment_counter("local").unwrap();

    let shared = Arc::clone(&m);
    let (mode, seen) = thread::spawn(move || {
        shared.increment_counter("shared").unwrap();
        (shared.mode(), shared.core_plugin().counter("local").is_some())
    })
    .join()
    .unwrap();

    assert_eq!(mode, Mode::Default);
    assert!(!seen);
    assert!(m.core_plugin().counter("shared").is_none());

    m.reset_thread_local_state();
    assert!(m.core_plugin().counter("shared").is_some());
    assert!(m.core_plugin().counter("local").is_none());
}

#[test]
fn spawn_passes_the_override_to_the_child() {
    let m = Arc::new(monitor());
    m.set_thread_local_state();
    m.increment_counter("x").unwrap();

    let child = Arc::clone(&m);
    let mode = m
        .spawn(move || {
            child.increment_counter("x").unwrap();
            child.mode()
        })
        .join()
        .unwrap();

    assert_eq!(mode, Mode::ThreadLocal);
    assert_eq!(m.core_plugin().counter("x").unwrap().count(), 2);
    m.reset_thread_local_state();
}

#[test]
fn spawn_without_override_starts_on_shared_state() {
    let m = Arc::new(monitor());
    let child = Arc::clone(&m);
    let had_override = m.spawn(move || child.has_thread_local_state()).join().unwrap();
    assert!(!had_override);
}

#[test]
fn reset_drops_and_destroys_the_private_core() {
    let m = monitor();
    let shared = m.core_plugin();

    m.set_thread_local_state();
    assert!(m.has_thread_local_state());
    let private = m.core_plugin();
    assert!(!Arc::ptr_eq(&private, &shared));

    m.reset_thread_local_state();
    assert!(!m.has_thread_local_state());
    assert!(private.is_destroyed());
    assert!(!shared.is_destroyed());
    assert!(Arc::ptr_eq(&m.core_plugin(), &shared));

    // no override left: a second reset is a no-op
    m.reset_thread_local_state();
    assert!(!shared.is_destroyed());
}

#[test]
fn setting_again_replaces_the_private_core() {
    let m = monitor();
    m.set_thread_local_state();
    let first = m.core_plugin();
    m.set_thread_local_state();

    assert!(first.is_destroyed());
    assert!(!Arc::ptr_eq(&first, &m.core_plugin()));
    m.reset_thread_local_state();
}

#[test]
fn override_keeps_the_key_handler() {
    let m = monitor();
    m.init_instance(m.core_plugin(), Arc::new(EscapingKeyHandler));

    m.set_thread_local_state();
    m.increment_counter("a:b").unwrap();
    assert_eq!(m.core_plugin().counter("a_b").unwrap().count(), 1);
    m.reset_thread_local_state();

    assert!(m.core_plugin().counter("a_b").is_none());
}

#[test]
fn overrides_are_per_monitor() {
    let a = monitor();
    let b = monitor();
    a.set_thread_local_state();

    assert_eq!(a.mode(), Mode::ThreadLocal);
    assert_eq!(b.mode(), Mode::Default);
    a.reset_thread_local_state();
}

#[test]
fn plugins_registered_under_an_override_stay_private() {
    let m = monitor();
    let spy = Arc::new(RecordingPlugin::new("spy"));

    m.set_thread_local_state();
    assert!(m.register_plugin(spy.clone()));
    assert_eq!(m.plugins().len(), 2);
    m.increment_counter("c").unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            assert_eq!(m.plugins().len(), 1);
            m.increment_counter("from_other").unwrap();
        });
    });

    assert_eq!(spy.calls(), vec![PluginCall::IncrementCounter("c".into(), 1)]);
    assert_eq!(spy.registered_count(), 1);

    m.remove_all_plugins();
    assert_eq!(spy.removed_count(), 1);
    assert_eq!(m.plugins().len(), 1);
    m.reset_thread_local_state();
}

#[test]
fn removing_plugins_under_an_override_leaves_shared_ones() {
    let m = monitor();
    let shared = Arc::new(RecordingPlugin::new("shared"));
    m.register_plugin(shared.clone());

    m.set_thread_local_state();
    m.remove_all_plugins();
    m.reset_thread_local_state();

    assert_eq!(shared.removed_count(), 0);
    assert_eq!(m.plugins().len(), 2);
    m.increment_counter("c").unwrap();
    assert_eq!(shared.calls(), vec![PluginCall::IncrementCounter("c".into(), 1)]);
}

#[test]
fn clearing_an_override_notifies_its_private_plugins() {
    let m = monitor();
    let spy = Arc::new(RecordingPlugin::new("spy"));

    m.set_thread_local_state();
    m.register_plugin(spy.clone());
    m.reset_thread_local_state();

    assert_eq!(spy.removed_count(), 1);
    assert_eq!(m.plugins().len(), 1);
}
