use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use appmon_core::error::Result;
use appmon_core::metric::{
    Counter, Historizable, HistorizableList, MultiValue, StateValue, Timer, Version,
    DEFAULT_MAX_ENTRIES,
};
use appmon_core::{AsReportable, ReportVisitor, Reportable, ReportableObserver};

use super::sync::SyncObserver;
use super::MonitorPlugin;
use crate::registry::{Monitors, ObserverList};

/// Version stamp registered by default.
pub const BUILTIN_VERSION_KEY: &str = "appmon.core.version";
/// Seconds since the plugin was created, registered by default.
pub const BUILTIN_UPTIME_KEY: &str = "appmon.uptime.seconds";

/// Exposition resource owned by a `CorePlugin` (e.g. an MBean registration).
///
/// The adapter lives outside this crate; the plugin only names itself after
/// it and shuts it down on `destroy()`.
pub trait Exposition: Send + Sync {
    fn name(&self) -> String;
    fn shutdown(&self) -> Result<()>;
}

/// Construction options for [`CorePlugin`].
#[derive(Clone)]
pub struct CoreSettings {
    pub exposition: Option<Arc<dyn Exposition>>,
    pub historizable_max_entries: usize,
    pub builtin_state_values: bool,
    pub unique_name: Option<String>,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            exposition: None,
            historizable_max_entries: DEFAULT_MAX_ENTRIES,
            builtin_state_values: true,
            unique_name: None,
        }
    }
}

impl CoreSettings {
    /// Same settings without the exposition handle. Used for private and
    /// replacement cores that must not share an exposition they would shut down.
    pub fn without_exposition(&self) -> Self {
        Self {
            exposition: None,
            ..self.clone()
        }
    }
}

impl fmt::Debug for CoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreSettings")
            .field("exposition", &self.exposition.as_ref().map(|e| e.name()))
            .field("historizable_max_entries", &self.historizable_max_entries)
            .field("builtin_state_values", &self.builtin_state_values)
            .field("unique_name", &self.unique_name)
            .finish()
    }
}

/// The registry plugin: owns one `Monitors` per metric category and fans
/// every created metric out to its observers.
pub struct CorePlugin {
    unique_name: String,
    exposition: Option<Arc<dyn Exposition>>,
    historizable_max_entries: usize,

    observers: Arc<ObserverList>,
    counters: Monitors<Arc<Counter>>,
    timers: Monitors<Arc<Timer>>,
    state_values: Monitors<Arc<StateValue>>,
    versions: Monitors<Arc<Version>>,
    historizables: Monitors<Arc<HistorizableList>>,
    // Pulled by reporting only; creation is not announced to observers.
    multi_values: DashMap<String, Arc<MultiValue>>,

    sync_observer: Mutex<Option<Weak<SyncObserver>>>,
    destroyed: AtomicBool,
}

impl CorePlugin {
    pub fn new() -> Self {
        Self::with_settings(CoreSettings::default())
    }

    pub fn with_settings(settings: CoreSettings) -> Self {
        let unique_name = settings
            .unique_name
            .clone()
            .or_else(|| settings.exposition.as_ref().map(|e| e.name()))
            .unwrap_or_else(|| format!("CorePlugin_{}", Uuid::new_v4().simple()));

        let observers = Arc::new(ObserverList::new());
        let plugin = Self {
            unique_name,
            exposition: settings.exposition,
            historizable_max_entries: settings.historizable_max_entries,
            counters: Monitors::new(Arc::clone(&observers)),
            timers: Monitors::new(Arc::clone(&observers)),
            state_values: Monitors::new(Arc::clone(&observers)),
            versions: Monitors::new(Arc::clone(&observers)),
            historizables: Monitors::new(Arc::clone(&observers)),
            observers,
            multi_values: DashMap::new(),
            sync_observer: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        };

        if settings.builtin_state_values {
            plugin.register_builtins();
        }
        plugin
    }

    fn register_builtins(&self) {
        self.register_version(Version::new(BUILTIN_VERSION_KEY, env!("CARGO_PKG_VERSION")));
        let started = Instant::now();
        self.register_state_value(StateValue::from_fn(BUILTIN_UPTIME_KEY, move || {
            Ok(i64::try_from(started.elapsed().as_secs()).unwrap_or(i64::MAX))
        }));
    }

    pub fn historizable_max_entries(&self) -> usize {
        self.historizable_max_entries
    }

    // ---- counters / timers ----

    pub fn increment_counter(&self, name: &str, delta: i64) {
        self.counter_or_create(name).increment_by(delta);
    }

    pub fn increment_high_rate_counter(&self, name: &str, delta: i64) {
        self.increment_counter(name, delta);
    }

    /// Create the counter if needed, then reset it to zero.
    pub fn initialize_counter(&self, name: &str) {
        self.counter_or_create(name).initialize();
    }

    pub fn add_timer_measurement(&self, name: &str, duration: i64) {
        self.timer_or_create(name).add_measurement(duration);
    }

    pub fn add_single_event_timer_measurement(&self, name: &str, duration: i64) {
        self.add_timer_measurement(name, duration);
    }

    pub fn add_high_rate_timer_measurement(&self, name: &str, duration: i64) {
        self.add_timer_measurement(name, duration);
    }

    pub fn initialize_timer_measurement(&self, name: &str) {
        self.timer_or_create(name).initialize();
    }

    fn counter_or_create(&self, name: &str) -> Arc<Counter> {
        self.counters.get_or_create(name, || Arc::new(Counter::new(name)))
    }

    fn timer_or_create(&self, name: &str) -> Arc<Timer> {
        self.timers.get_or_create(name, || Arc::new(Timer::new(name)))
    }

    // ---- registrations ----

    /// Register or replace a state probe. Observers are notified either way.
    pub fn register_state_value(&self, state: StateValue) {
        let name = state.name().to_string();
        if self.state_values.put(&name, Arc::new(state)).is_some() {
            tracing::warn!(%name, "state value replaced by a new registration");
        }
    }

    /// Register or replace a version. Observers are notified either way.
    pub fn register_version(&self, version: Version) {
        let name = version.name().to_string();
        if let Some(previous) = self.versions.put(&name, Arc::new(version)) {
            tracing::warn!(%name, previous = %previous.value(), "version replaced by a new registration");
        }
    }

    pub fn register_multi_value_provider(&self, multi: MultiValue) {
        let name = multi.name().to_string();
        if self.multi_values.insert(name.clone(), Arc::new(multi)).is_some() {
            tracing::warn!(%name, "multi value provider replaced by a new registration");
        }
    }

    /// Append a timestamped sample to the named history.
    pub fn add_historizable(&self, name: &str, value: impl Into<String>) {
        let list = self.historizables.get_or_create(name, || {
            Arc::new(HistorizableList::new(name, self.historizable_max_entries))
        });
        list.add(Historizable::now(value));
    }

    // ---- reads ----

    pub fn counter(&self, name: &str) -> Option<Arc<Counter>> {
        self.counters.get(name)
    }

    pub fn timer(&self, name: &str) -> Option<Arc<Timer>> {
        self.timers.get(name)
    }

    pub fn state_value(&self, name: &str) -> Option<Arc<StateValue>> {
        self.state_values.get(name)
    }

    pub fn version(&self, name: &str) -> Option<Arc<Version>> {
        self.versions.get(name)
    }

    pub fn historizable_list(&self, name: &str) -> Option<Arc<HistorizableList>> {
        self.historizables.get(name)
    }

    pub fn multi_value(&self, name: &str) -> Option<Arc<MultiValue>> {
        self.multi_values.get(name).map(|e| Arc::clone(e.value()))
    }

    pub fn counters(&self) -> &Monitors<Arc<Counter>> {
        &self.counters
    }

    pub fn timers(&self) -> &Monitors<Arc<Timer>> {
        &self.timers
    }

    pub fn state_values(&self) -> &Monitors<Arc<StateValue>> {
        &self.state_values
    }

    pub fn versions(&self) -> &Monitors<Arc<Version>> {
        &self.versions
    }

    pub fn historizables(&self) -> &Monitors<Arc<HistorizableList>> {
        &self.historizables
    }

    /// Every observer-visible reportable, in replay order: counters, timers,
    /// state values, versions, historizable lists (each by name).
    pub fn reportables(&self) -> Vec<Reportable> {
        let mut out = self.counters.reportables();
        out.extend(self.timers.reportables());
        out.extend(self.state_values.reportables());
        out.extend(self.versions.reportables());
        out.extend(self.historizables.reportables());
        out
    }

    fn sorted_multi_values(&self) -> Vec<Arc<MultiValue>> {
        let mut values: Vec<Arc<MultiValue>> =
            self.multi_values.iter().map(|e| Arc::clone(e.value())).collect();
        values.sort_by(|a, b| a.name().cmp(b.name()));
        values
    }

    /// Full registry dump. Failing state probes are skipped, the pass goes on.
    pub fn report_into(&self, visitor: &mut dyn ReportVisitor) {
        self.counters.accept(visitor);
        self.timers.accept(visitor);
        self.state_values.accept(visitor);
        for multi in self.sorted_multi_values() {
            multi.as_reportable().accept(visitor);
        }
        self.historizables.accept(visitor);
        self.versions.accept(visitor);
    }

    // ---- observers ----

    /// Register an observer and replay every existing reportable to it before
    /// returning. Registering the same observer twice is a no-op.
    pub fn add_reportable_observer(&self, observer: Arc<dyn ReportableObserver>) {
        if !self.observers.add(Arc::clone(&observer)) {
            return;
        }
        self.replay(observer.as_ref());
    }

    /// Stops future notifications. Past ones are not retracted.
    pub fn remove_reportable_observer(&self, observer: &Arc<dyn ReportableObserver>) -> bool {
        self.observers.remove(observer)
    }

    pub fn observers(&self) -> Vec<Arc<dyn ReportableObserver>> {
        self.observers.snapshot()
    }

    fn replay(&self, observer: &dyn ReportableObserver) {
        for reportable in self.reportables() {
            observer.add_new_reportable(&reportable);
        }
    }

    // ---- sync protocol ----

    /// Inherit observers and metrics from the plugin this one replaces.
    ///
    /// 1. Every application observer of `previous` is registered here too.
    /// 2. A migration observer is registered on `previous`; its catch-up replay
    ///    copies every metric into this plugin with `put_if_absent`, so metrics
    ///    already created here win. Later creations on `previous` keep flowing.
    /// 3. Only a `Weak` handle to the migration observer is kept here.
    pub fn sync_from(self: &Arc<Self>, previous: &CorePlugin) {
        if std::ptr::eq(Arc::as_ptr(self), previous) {
            return;
        }

        for observer in previous.observers.snapshot() {
            self.add_reportable_observer(observer);
        }

        for entry in previous.multi_values.iter() {
            self.multi_values
                .entry(entry.key().clone())
                .or_insert_with(|| Arc::clone(entry.value()));
        }

        let sync = Arc::new(SyncObserver::new(Arc::downgrade(self)));
        *self.sync_observer.lock() = Some(Arc::downgrade(&sync));

        let observer: Arc<dyn ReportableObserver> = sync;
        if previous.observers.add_migrating(Arc::clone(&observer)) {
            previous.replay(observer.as_ref());
        }
        tracing::debug!(from = %previous.unique_name, to = %self.unique_name, "core plugin synced");
    }

    /// Whether the migration observer from the last `sync_from` is still
    /// reachable, i.e. the superseded plugin is still alive.
    pub fn sync_observer_alive(&self) -> bool {
        self.sync_observer
            .lock()
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Insert a reportable coming from a superseded plugin without
    /// overwriting anything this plugin already has.
    pub(crate) fn adopt(&self, reportable: &Reportable) {
        match reportable {
            Reportable::Counter(c) => {
                self.counters.put_if_absent(c.name(), Arc::clone(c));
            }
            Reportable::Timer(t) => {
                self.timers.put_if_absent(t.name(), Arc::clone(t));
            }
            Reportable::StateValue(s) => {
                self.state_values.put_if_absent(s.name(), Arc::clone(s));
            }
            Reportable::Version(v) => {
                self.versions.put_if_absent(v.name(), Arc::clone(v));
            }
            Reportable::HistorizableList(h) => {
                self.historizables.put_if_absent(h.name(), Arc::clone(h));
            }
            Reportable::MultiValue(m) => {
                self.multi_values
                    .entry(m.name().to_string())
                    .or_insert_with(|| Arc::clone(m));
            }
        }
    }

    // ---- lifecycle ----

    /// Release the exposition resource. Safe to call any number of times.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(exposition) = &self.exposition {
            if let Err(e) = exposition.shutdown() {
                tracing::warn!(plugin = %self.unique_name, error = %e, "exposition shutdown failed");
            }
        }
        tracing::debug!(plugin = %self.unique_name, "core plugin destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

impl Default for CorePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CorePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorePlugin")
            .field("unique_name", &self.unique_name)
            .field("counters", &self.counters.len())
            .field("timers", &self.timers.len())
            .field("state_values", &self.state_values.len())
            .field("versions", &self.versions.len())
            .field("historizables", &self.historizables.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl MonitorPlugin for CorePlugin {
    fn unique_name(&self) -> &str {
        &self.unique_name
    }

    fn initialize_counter(&self, name: &str) {
        CorePlugin::initialize_counter(self, name);
    }

    fn increment_counter(&self, name: &str, delta: i64) {
        CorePlugin::increment_counter(self, name, delta);
    }

    fn increment_high_rate_counter(&self, name: &str, delta: i64) {
        CorePlugin::increment_high_rate_counter(self, name, delta);
    }

    fn add_timer_measurement(&self, name: &str, duration: i64) {
        CorePlugin::add_timer_measurement(self, name, duration);
    }

    fn add_single_event_timer_measurement(&self, name: &str, duration: i64) {
        CorePlugin::add_single_event_timer_measurement(self, name, duration);
    }

    fn add_high_rate_timer_measurement(&self, name: &str, duration: i64) {
        CorePlugin::add_high_rate_timer_measurement(self, name, duration);
    }

    fn initialize_timer_measurement(&self, name: &str) {
        CorePlugin::initialize_timer_measurement(self, name);
    }

    fn after_removal_notification(&self) {
        self.destroy();
    }
}
