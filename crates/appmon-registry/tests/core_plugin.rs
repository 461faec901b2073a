//! CorePlugin registrations, reporting, lifecycle and sync protocol.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use appmon_core::metric::{MultiValue, State, StateValue, Version};
use appmon_core::{MonitorError, Result};
use appmon_registry::obs::RegistrySnapshot;
use appmon_registry::plugin::{BUILTIN_UPTIME_KEY, BUILTIN_VERSION_KEY};
use appmon_registry::testing::RecordingObserver;
use appmon_registry::{CorePlugin, CoreSettings, Exposition, MonitorPlugin};

fn bare() -> CorePlugin {
    CorePlugin::with_settings(CoreSettings {
        builtin_state_values: false,
        ..CoreSettings::default()
    })
}

struct SpyExposition {
    shutdowns: AtomicUsize,
    fail: bool,
}

impl SpyExposition {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            shutdowns: AtomicUsize::new(0),
            fail,
        })
    }
}

impl Exposition for SpyExposition {
    fn name(&self) -> String {
        "exposition:appmon".into()
    }

    fn shutdown(&self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MonitorError::Exposition("server gone".into()));
        }
        Ok(())
    }
}

#[test]
fn counters_and_timers() {
    let core = bare();
    core.increment_counter("c", 2);
    core.increment_high_rate_counter("c", 3);
    assert_eq!(core.counter("c").unwrap().count(), 5);

    core.initialize_counter("c");
    assert_eq!(core.counter("c").unwrap().count(), 0);

    core.initialize_counter("fresh");
    assert_eq!(core.counter("fresh").unwrap().count(), 0);

    core.add_timer_measurement("t", 1);
    core.add_single_event_timer_measurement("t", 3);
    core.add_high_rate_timer_measurement("t", 5);
    let timer = core.timer("t").unwrap();
    assert_eq!(timer.count(), 3);
    assert!((timer.average() - 3.0).abs() < 1e-9);
    assert!((timer.std_dev() - 2.0).abs() < 1e-9);

    core.initialize_timer_measurement("t");
    assert_eq!(timer.count(), 0);
}

#[test]
fn builtins_are_seeded_by_default() {
    let core = CorePlugin::new();
    assert_eq!(
        core.version(BUILTIN_VERSION_KEY).unwrap().value(),
        env!("CARGO_PKG_VERSION")
    );
    assert!(core.state_value(BUILTIN_UPTIME_KEY).unwrap().value().unwrap() >= 0);

    assert!(bare().state_values().is_empty());
    assert!(bare().versions().is_empty());
}

#[test]
fn state_value_and_version_replace_and_notify() {
    let core = bare();
    let recorder = Arc::new(RecordingObserver::new());
    core.add_reportable_observer(recorder.clone());

    core.register_state_value(StateValue::from_fn("s", || Ok(1)));
    core.register_state_value(StateValue::from_fn("s", || Ok(2)));
    assert_eq!(core.state_value("s").unwrap().value().unwrap(), 2);
    assert_eq!(recorder.count_of("s"), 2);

    core.register_version(Version::new("build", "1"));
    core.register_version(Version::new("build", "2"));
    assert_eq!(core.version("build").unwrap().value(), "2");
    assert_eq!(recorder.count_of("build"), 2);
}

#[test]
fn historizable_list_uses_configured_size() {
    let core = CorePlugin::with_settings(CoreSettings {
        builtin_state_values: false,
        historizable_max_entries: 2,
        ..CoreSettings::default()
    });
    for v in ["a", "b", "c"] {
        core.add_historizable("h", v);
    }
    let list = core.historizable_list("h").unwrap();
    assert_eq!(list.size(), 2);
    assert_eq!(list.get(0).unwrap().value, "c");
    assert_eq!(list.get(1).unwrap().value, "b");
}

#[test]
fn observer_catches_up_then_sees_new_metrics() {
    let core = bare();
    core.increment_counter("x", 1);
    core.add_timer_measurement("t", 1);
    core.register_state_value(StateValue::from_fn("s", || Ok(0)));
    core.register_version(Version::new("v", "1"));
    core.add_historizable("h", "sample");

    let recorder = Arc::new(RecordingObserver::new());
    core.add_reportable_observer(recorder.clone());

    assert_eq!(
        recorder.notifications(),
        [
            ("x".to_string(), "counter"),
            ("t".to_string(), "timer"),
            ("s".to_string(), "state"),
            ("v".to_string(), "version"),
            ("h".to_string(), "historizable"),
        ]
    );

    core.increment_counter("y", 1);
    core.increment_counter("y", 1);
    assert_eq!(recorder.count_of("y"), 1);

    // same observer twice: no second replay
    core.add_reportable_observer(recorder.clone());
    assert_eq!(recorder.count_of("x"), 1);
}

#[test]
fn failing_state_provider_does_not_abort_report() {
    let core = bare();
    core.register_state_value(StateValue::from_fn("a.ok", || Ok(1)));
    core.register_state_value(StateValue::from_fn("b.broken", || {
        Err(MonitorError::Unavailable("pool closed".into()))
    }));
    core.register_state_value(StateValue::from_fn("c.ok", || Ok(3)));
    core.register_multi_value_provider(MultiValue::from_fn("pool", || vec![State::new("idle", 4)]));
    core.increment_counter("after", 1);

    let snapshot = RegistrySnapshot::capture(&core);
    assert_eq!(snapshot.states.len(), 2);
    assert_eq!(snapshot.states["a.ok"], 1);
    assert_eq!(snapshot.states["c.ok"], 3);
    assert!(!snapshot.states.contains_key("b.broken"));
    assert_eq!(snapshot.multi_values["pool"], vec![State::new("idle", 4)]);
    assert_eq!(snapshot.counters["after"], 1);
}

#[test]
fn unique_name_follows_exposition() {
    let spy = SpyExposition::new(false);
    let core = CorePlugin::with_settings(CoreSettings {
        exposition: Some(spy.clone() as Arc<dyn Exposition>),
        ..CoreSettings::default()
    });
    assert_eq!(core.unique_name(), "exposition:appmon");

    let a = bare();
    let b = bare();
    assert!(a.unique_name().starts_with("CorePlugin_"));
    assert_ne!(a.unique_name(), b.unique_name());
}

#[test]
fn destroy_is_idempotent() {
    let spy = SpyExposition::new(false);
    let core = CorePlugin::with_settings(CoreSettings {
        exposition: Some(spy.clone() as Arc<dyn Exposition>),
        ..CoreSettings::default()
    });

    assert!(!core.is_destroyed());
    core.destroy();
    core.destroy();
    assert!(core.is_destroyed());
    assert_eq!(spy.shutdowns.load(Ordering::SeqCst), 1);
}

#[test]
fn failing_exposition_shutdown_is_swallowed() {
    let spy = SpyExposition::new(true);
    let core = CorePlugin::with_settings(CoreSettings {
        exposition: Some(spy.clone() as Arc<dyn Exposition>),
        ..CoreSettings::default()
    });
    core.destroy();
    assert!(core.is_destroyed());
    assert_eq!(spy.shutdowns.load(Ordering::SeqCst), 1);
}

#[test]
fn sync_migrates_metrics_and_observers() {
    let old = Arc::new(bare());
    old.increment_counter("a", 3);
    old.add_timer_measurement("t", 4);
    old.register_version(Version::new("build", "1"));
    old.add_historizable("h", "x");
    old.register_multi_value_provider(MultiValue::from_fn("m", Vec::new));

    let recorder = Arc::new(RecordingObserver::new());
    old.add_reportable_observer(recorder.clone());
    recorder.clear();

    let new = Arc::new(bare());
    new.increment_counter("b", 1);
    new.sync_from(&old);

    assert_eq!(new.counter("a").unwrap().count(), 3);
    assert!(Arc::ptr_eq(&old.counter("a").unwrap(), &new.counter("a").unwrap()));
    assert_eq!(new.timer("t").unwrap().sum(), 4);
    assert_eq!(new.version("build").unwrap().value(), "1");
    assert_eq!(new.historizable_list("h").unwrap().size(), 1);
    assert!(new.multi_value("m").is_some());

    // the observer now watches the new plugin and was told about everything
    assert_eq!(new.observers().len(), 1);
    for name in ["a", "b", "t", "build", "h"] {
        assert!(recorder.contains(name), "missing {name}");
    }

    // creations reaching the old plugin still flow to the new one
    old.increment_counter("late", 2);
    assert_eq!(new.counter("late").unwrap().count(), 2);
}

#[test]
fn sync_never_overwrites_existing_metrics() {
    let old = Arc::new(bare());
    old.increment_counter("a", 3);
    old.register_version(Version::new("build", "old"));

    let new = Arc::new(bare());
    new.increment_counter("a", 10);
    new.register_version(Version::new("build", "new"));
    new.sync_from(&old);

    assert_eq!(new.counter("a").unwrap().count(), 10);
    assert_eq!(new.version("build").unwrap().value(), "new");
}

#[test]
fn sync_observer_released_with_old_plugin() {
    let old = Arc::new(bare());
    old.increment_counter("a", 1);

    let new = Arc::new(bare());
    assert!(!new.sync_observer_alive());
    new.sync_from(&old);
    assert!(new.sync_observer_alive());

    drop(old);
    assert!(!new.sync_observer_alive());
    assert_eq!(new.counter("a").unwrap().count(), 1);
}

#[test]
fn migration_helpers_are_not_inherited() {
    let first = Arc::new(bare());
    let second = Arc::new(bare());
    second.sync_from(&first);

    let third = Arc::new(bare());
    third.sync_from(&first);

    // creations on `third` must not leak into `second` through `first`
    third.increment_counter("only-third", 1);
    assert!(second.counter("only-third").is_none());
    assert!(first.counter("only-third").is_none());
}

#[test]
fn sync_with_itself_is_a_no_op() {
    let core = Arc::new(bare());
    core.increment_counter("a", 1);
    core.sync_from(&core);
    assert!(!core.sync_observer_alive());
    assert_eq!(core.counter("a").unwrap().count(), 1);
    assert!(core.observers().is_empty());
}
