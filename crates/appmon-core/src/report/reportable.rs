use std::sync::Arc;

use crate::metric::{Counter, HistorizableList, MultiValue, State, StateValue, Timer, Version};

use super::ReportVisitor;

/// Any metric kind that can be observed or visited.
#[derive(Debug, Clone)]
pub enum Reportable {
    Counter(Arc<Counter>),
    Timer(Arc<Timer>),
    StateValue(Arc<StateValue>),
    Version(Arc<Version>),
    HistorizableList(Arc<HistorizableList>),
    MultiValue(Arc<MultiValue>),
}

impl Reportable {
    pub fn name(&self) -> &str {
        match self {
            Reportable::Counter(c) => c.name(),
            Reportable::Timer(t) => t.name(),
            Reportable::StateValue(s) => s.name(),
            Reportable::Version(v) => v.name(),
            Reportable::HistorizableList(h) => h.name(),
            Reportable::MultiValue(m) => m.name(),
        }
    }

    /// Short kind label, stable for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Reportable::Counter(_) => "counter",
            Reportable::Timer(_) => "timer",
            Reportable::StateValue(_) => "state",
            Reportable::Version(_) => "version",
            Reportable::HistorizableList(_) => "historizable",
            Reportable::MultiValue(_) => "multi",
        }
    }

    /// Dispatch to the matching visitor method.
    ///
    /// State probes are resolved here. A probe returning an error is skipped
    /// with a warning so one bad provider cannot abort a reporting pass.
    pub fn accept(&self, visitor: &mut dyn ReportVisitor) {
        match self {
            Reportable::Counter(c) => visitor.report_counter(c),
            Reportable::Timer(t) => visitor.report_timer(t),
            Reportable::StateValue(s) => match s.value() {
                Ok(value) => visitor.report_state_value(&State::new(s.name(), value)),
                Err(e) => {
                    tracing::warn!(name = %s.name(), error = %e, "state value provider failed, skipped");
                }
            },
            Reportable::Version(v) => visitor.report_version(v),
            Reportable::HistorizableList(h) => visitor.report_historizable_list(h),
            Reportable::MultiValue(m) => visitor.report_multi_value(m.name(), &m.values()),
        }
    }
}

/// Conversion used by the registry to notify observers about stored values.
pub trait AsReportable {
    fn as_reportable(&self) -> Reportable;
}

macro_rules! as_reportable {
    ($($ty:ident),*) => {
        $(
            impl AsReportable for Arc<$ty> {
                fn as_reportable(&self) -> Reportable {
                    Reportable::$ty(Arc::clone(self))
                }
            }
        )*
    };
}

as_reportable!(Counter, Timer, StateValue, Version, HistorizableList, MultiValue);
