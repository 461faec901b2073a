use crate::metric::{Counter, HistorizableList, State, Timer, Version};

/// Pull-style registry dump (double dispatch via [`super::Reportable::accept`]).
///
/// Every method defaults to a no-op so a visitor only handles what it needs.
pub trait ReportVisitor {
    fn report_counter(&mut self, _counter: &Counter) {}

    fn report_timer(&mut self, _timer: &Timer) {}

    /// Resolved value of a state probe. Probes that failed are not reported.
    fn report_state_value(&mut self, _state: &State) {}

    fn report_multi_value(&mut self, _name: &str, _values: &[State]) {}

    fn report_historizable_list(&mut self, _list: &HistorizableList) {}

    fn report_version(&mut self, _version: &Version) {}
}
