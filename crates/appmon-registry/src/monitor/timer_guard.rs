use std::time::Instant;

use super::InApplicationMonitor;

/// Records the elapsed milliseconds as a timer measurement when dropped.
#[must_use = "the measurement is recorded when the guard is dropped"]
pub struct TimerGuard<'a> {
    monitor: &'a InApplicationMonitor,
    name: String,
    start: Instant,
}

impl<'a> TimerGuard<'a> {
    pub(crate) fn new(monitor: &'a InApplicationMonitor, name: impl Into<String>) -> Self {
        Self {
            monitor,
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Record now instead of at scope end. The measurement is written by
    /// `Drop`.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        let elapsed = i64::try_from(self.start.elapsed().as_millis()).unwrap_or(i64::MAX);
        if let Err(e) = self.monitor.add_timer_measurement(&self.name, elapsed) {
            tracing::warn!(name = %self.name, error = %e, "timer measurement dropped");
        }
    }
}
