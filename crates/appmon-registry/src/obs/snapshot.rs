//! Serializable point-in-time copy of a registry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use appmon_core::error::{MonitorError, Result};
use appmon_core::metric::{Counter, Historizable, HistorizableList, State, Timer, Version};
use appmon_core::ReportVisitor;

use crate::plugin::CorePlugin;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub count: i64,
    pub sum: i64,
    pub average: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub taken_at: DateTime<Utc>,
    pub counters: BTreeMap<String, i64>,
    pub timers: BTreeMap<String, TimerSnapshot>,
    pub states: BTreeMap<String, i64>,
    pub multi_values: BTreeMap<String, Vec<State>>,
    pub historizables: BTreeMap<String, Vec<Historizable>>,
    pub versions: BTreeMap<String, String>,
}

impl RegistrySnapshot {
    fn empty() -> Self {
        Self {
            taken_at: Utc::now(),
            counters: BTreeMap::new(),
            timers: BTreeMap::new(),
            states: BTreeMap::new(),
            multi_values: BTreeMap::new(),
            historizables: BTreeMap::new(),
            versions: BTreeMap::new(),
        }
    }

    pub fn capture(core: &CorePlugin) -> Self {
        let mut visitor = SnapshotVisitor::new();
        core.report_into(&mut visitor);
        visitor.into_snapshot()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MonitorError::Internal(format!("snapshot serialization failed: {e}")))
    }
}

/// Visitor that fills a [`RegistrySnapshot`].
pub struct SnapshotVisitor {
    snapshot: RegistrySnapshot,
}

impl SnapshotVisitor {
    pub fn new() -> Self {
        Self {
            snapshot: RegistrySnapshot::empty(),
        }
    }

    pub fn into_snapshot(self) -> RegistrySnapshot {
        self.snapshot
    }
}

impl Default for SnapshotVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportVisitor for SnapshotVisitor {
    fn report_counter(&mut self, counter: &Counter) {
        self.snapshot
            .counters
            .insert(counter.name().to_string(), counter.count());
    }

    fn report_timer(&mut self, timer: &Timer) {
        self.snapshot.timers.insert(
            timer.name().to_string(),
            TimerSnapshot {
                count: timer.count(),
                sum: timer.sum(),
                average: timer.average(),
                std_dev: timer.std_dev(),
            },
        );
    }

    fn report_state_value(&mut self, state: &State) {
        self.snapshot.states.insert(state.name.clone(), state.value);
    }

    fn report_multi_value(&mut self, name: &str, values: &[State]) {
        self.snapshot
            .multi_values
            .insert(name.to_string(), values.to_vec());
    }

    fn report_historizable_list(&mut self, list: &HistorizableList) {
        self.snapshot
            .historizables
            .insert(list.name().to_string(), list.snapshot());
    }

    fn report_version(&mut self, version: &Version) {
        self.snapshot
            .versions
            .insert(version.name().to_string(), version.value().to_string());
    }
}
