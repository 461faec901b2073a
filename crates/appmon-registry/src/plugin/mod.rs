//! Plugin contract and the built-in registry plugin.
//!
//! Every mutating monitor call is fanned out to all registered plugins in
//! registration order. `CorePlugin` is always one of them; exporters add
//! themselves next to it.

mod core_plugin;
mod sync;

pub use core_plugin::{CorePlugin, CoreSettings, Exposition, BUILTIN_UPTIME_KEY, BUILTIN_VERSION_KEY};

/// Receiver of every mutating monitor call (counter and timer traffic).
///
/// The high-rate and single-event variants carry no extra meaning at this
/// layer. They default to the plain call; exporters may override them to
/// sample or route differently.
pub trait MonitorPlugin: Send + Sync {
    /// Identity used to deduplicate plugin registration.
    fn unique_name(&self) -> &str;

    fn initialize_counter(&self, name: &str);

    fn increment_counter(&self, name: &str, delta: i64);

    fn increment_high_rate_counter(&self, name: &str, delta: i64) {
        self.increment_counter(name, delta);
    }

    fn add_timer_measurement(&self, name: &str, duration: i64);

    fn add_single_event_timer_measurement(&self, name: &str, duration: i64) {
        self.add_timer_measurement(name, duration);
    }

    fn add_high_rate_timer_measurement(&self, name: &str, duration: i64) {
        self.add_timer_measurement(name, duration);
    }

    fn initialize_timer_measurement(&self, name: &str);

    /// Called once after the plugin was added to a monitor.
    fn register(&self) {}

    /// Called once after the plugin was removed from a monitor.
    fn after_removal_notification(&self) {}
}
