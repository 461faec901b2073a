//! In-memory test doubles for the plugin and observer contracts.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use appmon_core::{Reportable, ReportableObserver};

use crate::plugin::MonitorPlugin;

/// Remembers the name of every reportable it was notified about, in order.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<(String, &'static str)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.seen.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// `(name, kind)` pairs, in notification order.
    pub fn notifications(&self) -> Vec<(String, &'static str)> {
        self.seen.lock().clone()
    }

    pub fn count_of(&self, name: &str) -> usize {
        self.seen.lock().iter().filter(|(n, _)| n == name).count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.count_of(name) > 0
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl ReportableObserver for RecordingObserver {
    fn add_new_reportable(&self, reportable: &Reportable) {
        self.seen
            .lock()
            .push((reportable.name().to_string(), reportable.kind()));
    }
}

/// One call received by a [`RecordingPlugin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginCall {
    InitializeCounter(String),
    IncrementCounter(String, i64),
    IncrementHighRateCounter(String, i64),
    AddTimerMeasurement(String, i64),
    AddSingleEventTimerMeasurement(String, i64),
    AddHighRateTimerMeasurement(String, i64),
    InitializeTimerMeasurement(String),
}

/// Spy plugin recording every call it receives.
pub struct RecordingPlugin {
    name: String,
    calls: Mutex<Vec<PluginCall>>,
    registered: AtomicUsize,
    removed: AtomicUsize,
}

impl RecordingPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
            registered: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<PluginCall> {
        self.calls.lock().clone()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn removed_count(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    fn record(&self, call: PluginCall) {
        self.calls.lock().push(call);
    }
}

impl MonitorPlugin for RecordingPlugin {
    fn unique_name(&self) -> &str {
        &self.name
    }

    fn initialize_counter(&self, name: &str) {
        self.record(PluginCall::InitializeCounter(name.to_string()));
    }

    fn increment_counter(&self, name: &str, delta: i64) {
        self.record(PluginCall::IncrementCounter(name.to_string(), delta));
    }

    fn increment_high_rate_counter(&self, name: &str, delta: i64) {
        self.record(PluginCall::IncrementHighRateCounter(name.to_string(), delta));
    }

    fn add_timer_measurement(&self, name: &str, duration: i64) {
        self.record(PluginCall::AddTimerMeasurement(name.to_string(), duration));
    }

    fn add_single_event_timer_measurement(&self, name: &str, duration: i64) {
        self.record(PluginCall::AddSingleEventTimerMeasurement(name.to_string(), duration));
    }

    fn add_high_rate_timer_measurement(&self, name: &str, duration: i64) {
        self.record(PluginCall::AddHighRateTimerMeasurement(name.to_string(), duration));
    }

    fn initialize_timer_measurement(&self, name: &str) {
        self.record(PluginCall::InitializeTimerMeasurement(name.to_string()));
    }

    fn register(&self) {
        self.registered.fetch_add(1, Ordering::SeqCst);
    }

    fn after_removal_notification(&self) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}
