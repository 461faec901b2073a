//! Plain-text registry dump, one line per value.

use std::fmt::Write;

use appmon_core::metric::{Counter, HistorizableList, State, Timer, Version};
use appmon_core::ReportVisitor;

use crate::plugin::CorePlugin;

/// Helper to keep values on one line.
fn escape_value(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

#[derive(Default)]
pub struct TextReport {
    out: String,
}

impl TextReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a full dump of `core`.
    pub fn render(core: &CorePlugin) -> String {
        let mut report = Self::new();
        core.report_into(&mut report);
        report.finish()
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl ReportVisitor for TextReport {
    fn report_counter(&mut self, counter: &Counter) {
        let _ = writeln!(self.out, "counter {} {}", counter.name(), counter.count());
    }

    fn report_timer(&mut self, timer: &Timer) {
        let _ = writeln!(
            self.out,
            "timer {} count={} sum={} avg={:.3} stddev={:.3}",
            timer.name(),
            timer.count(),
            timer.sum(),
            timer.average(),
            timer.std_dev()
        );
    }

    fn report_state_value(&mut self, state: &State) {
        let _ = writeln!(self.out, "state {} {}", state.name, state.value);
    }

    fn report_multi_value(&mut self, name: &str, values: &[State]) {
        for leaf in values {
            let _ = writeln!(self.out, "multi {}.{} {}", name, leaf.name, leaf.value);
        }
    }

    fn report_historizable_list(&mut self, list: &HistorizableList) {
        for entry in list.snapshot() {
            let _ = writeln!(
                self.out,
                "historizable {} {} {}",
                list.name(),
                entry.timestamp.to_rfc3339(),
                escape_value(&entry.value)
            );
        }
    }

    fn report_version(&mut self, version: &Version) {
        let _ = writeln!(self.out, "version {} {}", version.name(), escape_value(version.value()));
    }
}
