//! Process-wide access point to the active registry.
//!
//! `InApplicationMonitor` publishes an immutable `MonitorState` (active core
//! plugin, key handler, plugin list). Application threads clone the current
//! snapshot on every call; `init_instance`, `reset` and plugin registration
//! build a new snapshot under one mutex and swap it in.
//!
//! A thread may install a private state with `set_thread_local_state`. It is
//! invisible to other threads and survives global swaps performed elsewhere.

mod state;
mod thread_local;
mod timer_guard;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};

use appmon_core::error::Result;
use appmon_core::metric::{MultiValue, StateValue, Version};
use appmon_core::{KeyHandler, ReportVisitor, ReportableObserver, TransparentKeyHandler};

use crate::config::MonitorConfig;
use crate::plugin::{CorePlugin, CoreSettings, MonitorPlugin};

pub use state::Mode;
pub use timer_guard::TimerGuard;

use state::{same_plugin, MonitorState};

static GLOBAL: OnceLock<InApplicationMonitor> = OnceLock::new();
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub struct InApplicationMonitor {
    id: u64,
    active: AtomicBool,
    /// Settings for cores this monitor creates itself (default, reset,
    /// thread-local). Never carries an exposition.
    defaults: CoreSettings,
    init_lock: Mutex<()>,
    state: RwLock<Arc<MonitorState>>,
}

impl InApplicationMonitor {
    pub fn new() -> Self {
        Self::with_settings(CoreSettings::default())
    }

    /// Default-mode monitor whose cores are built from `settings`.
    pub fn with_settings(settings: CoreSettings) -> Self {
        let defaults = settings.without_exposition();
        let core = Arc::new(CorePlugin::with_settings(settings));
        let state = MonitorState::new(core, Arc::new(TransparentKeyHandler), Mode::Default);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            active: AtomicBool::new(true),
            defaults,
            init_lock: Mutex::new(()),
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// Explicit-mode monitor built from a loaded config.
    pub fn from_config(cfg: &MonitorConfig) -> Result<Self> {
        let monitor = Self::with_settings(cfg.monitor.core_settings());
        let key_handler = cfg.monitor.key_handler.build()?;
        let core = monitor.core_plugin();
        monitor.init_instance(core, key_handler);
        if !cfg.monitor.active {
            monitor.deactivate();
        }
        Ok(monitor)
    }

    /// The process-wide instance, created in default mode on first access.
    pub fn global() -> &'static InApplicationMonitor {
        GLOBAL.get_or_init(InApplicationMonitor::new)
    }

    fn current_state(&self) -> Arc<MonitorState> {
        thread_local::get(self.id).unwrap_or_else(|| Arc::clone(&self.state.read()))
    }

    // ---- activation ----

    pub fn is_monitor_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    /// Turn counter/timer/historizable traffic into no-ops. Registrations and
    /// initializations still take effect.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    // ---- state accessors ----

    pub fn mode(&self) -> Mode {
        self.current_state().mode
    }

    pub fn core_plugin(&self) -> Arc<CorePlugin> {
        Arc::clone(&self.current_state().core)
    }

    pub fn key_handler(&self) -> Arc<dyn KeyHandler> {
        Arc::clone(&self.current_state().key_handler)
    }

    pub fn plugins(&self) -> Vec<Arc<dyn MonitorPlugin>> {
        self.current_state().plugins.clone()
    }

    // ---- lifecycle ----

    /// Plugin list for a successor of `current` whose core is `core`: the new
    /// core first, then every other plugin of `current` except its core,
    /// deduped by unique name. Also returns the plugins that lost the dedupe.
    fn carry_plugins(
        current: &MonitorState,
        core: &Arc<CorePlugin>,
    ) -> (Vec<Arc<dyn MonitorPlugin>>, Vec<Arc<dyn MonitorPlugin>>) {
        let core = Arc::clone(core) as Arc<dyn MonitorPlugin>;
        let mut kept = vec![Arc::clone(&core)];
        let mut dropped = Vec::new();
        for plugin in &current.plugins {
            if current.is_core(plugin) || same_plugin(plugin, &core) {
                continue;
            }
            if kept.iter().any(|p| p.unique_name() == plugin.unique_name()) {
                dropped.push(Arc::clone(plugin));
            } else {
                kept.push(Arc::clone(plugin));
            }
        }
        (kept, dropped)
    }

    fn notify_removed(plugins: Vec<Arc<dyn MonitorPlugin>>) {
        for plugin in plugins {
            tracing::info!(plugin = %plugin.unique_name(), "plugin removed");
            plugin.after_removal_notification();
        }
    }

    /// Replace the active core plugin and key handler.
    ///
    /// The new core inherits the old one's observers and metrics (see
    /// [`CorePlugin::sync_from`]) before it is published. Plugins whose name
    /// collides with the new core are removed. The old core is destroyed after
    /// the swap, outside the lock, unless it is `core` itself.
    pub fn init_instance(&self, core: Arc<CorePlugin>, key_handler: Arc<dyn KeyHandler>) {
        let (previous, dropped) = {
            let _guard = self.init_lock.lock();
            let current = Arc::clone(&self.state.read());

            core.sync_from(&current.core);

            let (plugins, dropped) = Self::carry_plugins(&current, &core);
            let next = MonitorState {
                core: Arc::clone(&core),
                key_handler,
                plugins,
                mode: Mode::Explicit,
            };
            *self.state.write() = Arc::new(next);
            (Arc::clone(&current.core), dropped)
        };

        Self::notify_removed(dropped);
        if Arc::ptr_eq(&previous, &core) {
            return;
        }
        tracing::info!(
            from = %previous.unique_name(),
            to = %core.unique_name(),
            "monitor re-initialized"
        );
        previous.destroy();
    }

    /// Back to default mode with a fresh, empty core. Nothing is migrated;
    /// registered plugins other than the core are kept.
    /// Thread-local overrides held by other threads are unaffected.
    pub fn reset(&self) {
        let (previous, dropped) = {
            let _guard = self.init_lock.lock();
            let current = Arc::clone(&self.state.read());
            let core = Arc::new(CorePlugin::with_settings(self.defaults.clone()));
            let (plugins, dropped) = Self::carry_plugins(&current, &core);
            let next = MonitorState {
                core,
                key_handler: Arc::new(TransparentKeyHandler),
                plugins,
                mode: Mode::Default,
            };
            *self.state.write() = Arc::new(next);
            self.activate();
            (current, dropped)
        };
        Self::notify_removed(dropped);
        previous.core.destroy();
        tracing::debug!("monitor reset to default state");
    }

    // ---- plugins ----

    /// Run `update` against the state the calling thread sees: its override
    /// if it has one, otherwise the shared state under the init lock. A
    /// returned state replaces the one it was built from.
    fn update_state<R, F>(&self, update: F) -> R
    where
        F: FnOnce(&MonitorState) -> (Option<MonitorState>, R),
    {
        if let Some(local) = thread_local::get(self.id) {
            let (next, out) = update(&local);
            if let Some(next) = next {
                thread_local::set(self.id, Arc::new(next));
            }
            return out;
        }

        let _guard = self.init_lock.lock();
        let current = Arc::clone(&self.state.read());
        let (next, out) = update(&current);
        if let Some(next) = next {
            *self.state.write() = Arc::new(next);
        }
        out
    }

    /// Append a plugin unless one with the same unique name is present.
    /// Returns whether it was added. Under a thread-local override only the
    /// private plugin list changes.
    pub fn register_plugin(&self, plugin: Arc<dyn MonitorPlugin>) -> bool {
        let added = self.update_state(|current| {
            if current
                .plugins
                .iter()
                .any(|p| p.unique_name() == plugin.unique_name())
            {
                return (None, false);
            }
            let mut plugins = current.plugins.clone();
            plugins.push(Arc::clone(&plugin));
            (Some(current.with_plugins(plugins)), true)
        });
        if !added {
            tracing::debug!(plugin = %plugin.unique_name(), "plugin already registered");
            return false;
        }
        tracing::info!(plugin = %plugin.unique_name(), "plugin registered");
        plugin.register();
        true
    }

    /// Drop every plugin except the active core, which cannot be removed.
    pub fn remove_all_plugins(&self) {
        let removed = self.update_state(|current| {
            let core = Arc::clone(&current.core) as Arc<dyn MonitorPlugin>;
            let removed: Vec<Arc<dyn MonitorPlugin>> = current
                .plugins
                .iter()
                .filter(|p| !same_plugin(p, &core))
                .cloned()
                .collect();
            (Some(current.with_plugins(vec![core])), removed)
        });
        Self::notify_removed(removed);
    }

    // ---- fan-out ----

    fn fan_out<F>(&self, name: &str, call: F) -> Result<()>
    where
        F: Fn(&dyn MonitorPlugin, &str),
    {
        let state = self.current_state();
        let key = state.key_handler.handle(name)?;
        for plugin in &state.plugins {
            call(plugin.as_ref(), &key);
        }
        Ok(())
    }

    pub fn increment_counter(&self, name: &str) -> Result<()> {
        self.increment_counter_by(name, 1)
    }

    pub fn increment_counter_by(&self, name: &str, delta: i64) -> Result<()> {
        if !self.is_monitor_active() {
            return Ok(());
        }
        self.fan_out(name, |p, key| p.increment_counter(key, delta))
    }

    pub fn increment_high_rate_counter(&self, name: &str, delta: i64) -> Result<()> {
        if !self.is_monitor_active() {
            return Ok(());
        }
        self.fan_out(name, |p, key| p.increment_high_rate_counter(key, delta))
    }

    pub fn initialize_counter(&self, name: &str) -> Result<()> {
        self.fan_out(name, |p, key| p.initialize_counter(key))
    }

    pub fn add_timer_measurement(&self, name: &str, duration: i64) -> Result<()> {
        if !self.is_monitor_active() {
            return Ok(());
        }
        self.fan_out(name, |p, key| p.add_timer_measurement(key, duration))
    }

    /// Measurement from two millisecond timestamps.
    pub fn add_timer_measurement_between(&self, name: &str, start: i64, end: i64) -> Result<()> {
        self.add_timer_measurement(name, end.saturating_sub(start))
    }

    pub fn add_single_event_timer_measurement(&self, name: &str, duration: i64) -> Result<()> {
        if !self.is_monitor_active() {
            return Ok(());
        }
        self.fan_out(name, |p, key| p.add_single_event_timer_measurement(key, duration))
    }

    pub fn add_high_rate_timer_measurement(&self, name: &str, duration: i64) -> Result<()> {
        if !self.is_monitor_active() {
            return Ok(());
        }
        self.fan_out(name, |p, key| p.add_high_rate_timer_measurement(key, duration))
    }

    pub fn initialize_timer_measurement(&self, name: &str) -> Result<()> {
        self.fan_out(name, |p, key| p.initialize_timer_measurement(key))
    }

    /// Measure until the returned guard is dropped.
    pub fn start_timer(&self, name: impl Into<String>) -> TimerGuard<'_> {
        TimerGuard::new(self, name)
    }

    // ---- core-only registrations ----

    pub fn register_state_value(&self, state_value: StateValue) -> Result<()> {
        let state = self.current_state();
        let key = state.key_handler.handle(state_value.name())?;
        state.core.register_state_value(state_value.with_name(key));
        Ok(())
    }

    pub fn register_multi_value_provider(&self, multi: MultiValue) -> Result<()> {
        let state = self.current_state();
        let key = state.key_handler.handle(multi.name())?;
        state.core.register_multi_value_provider(multi.with_name(key));
        Ok(())
    }

    pub fn register_version(&self, name: &str, value: impl Into<String>) -> Result<()> {
        let state = self.current_state();
        let key = state.key_handler.handle(name)?;
        state.core.register_version(Version::new(key, value));
        Ok(())
    }

    pub fn add_historizable(&self, name: &str, value: impl Into<String>) -> Result<()> {
        if !self.is_monitor_active() {
            return Ok(());
        }
        let state = self.current_state();
        let key = state.key_handler.handle(name)?;
        state.core.add_historizable(&key, value);
        Ok(())
    }

    pub fn add_reportable_observer(&self, observer: Arc<dyn ReportableObserver>) {
        self.current_state().core.add_reportable_observer(observer);
    }

    pub fn remove_reportable_observer(&self, observer: &Arc<dyn ReportableObserver>) -> bool {
        self.current_state().core.remove_reportable_observer(observer)
    }

    pub fn report_into(&self, visitor: &mut dyn ReportVisitor) {
        self.current_state().core.report_into(visitor);
    }

    // ---- thread-local override ----

    /// Give the calling thread a private core plugin and plugin list. The
    /// current key handler is kept.
    pub fn set_thread_local_state(&self) {
        let key_handler = self.key_handler();
        let core = Arc::new(CorePlugin::with_settings(self.defaults.clone()));
        let state = MonitorState::new(core, key_handler, Mode::ThreadLocal);
        if let Some(previous) = thread_local::set(self.id, Arc::new(state)) {
            Self::discard_override(&previous);
        }
    }

    /// Drop the calling thread's override and return to the shared state.
    /// Plugins registered under the override are notified of their removal.
    pub fn reset_thread_local_state(&self) {
        if let Some(previous) = thread_local::clear(self.id) {
            Self::discard_override(&previous);
        }
    }

    fn discard_override(state: &MonitorState) {
        let private: Vec<Arc<dyn MonitorPlugin>> = state
            .plugins
            .iter()
            .filter(|p| !state.is_core(p))
            .cloned()
            .collect();
        Self::notify_removed(private);
        state.core.destroy();
    }

    pub fn has_thread_local_state(&self) -> bool {
        thread_local::get(self.id).is_some()
    }

    /// Spawn a thread that inherits the caller's thread-local override, if
    /// any. Plain `std::thread::spawn` starts without one.
    pub fn spawn<F, T>(&self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let id = self.id;
        let inherited = thread_local::get(id);
        std::thread::spawn(move || {
            if let Some(state) = inherited {
                thread_local::set(id, state);
            }
            f()
        })
    }
}

impl Default for InApplicationMonitor {
    fn default() -> Self {
        Self::new()
    }
}
