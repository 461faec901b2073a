use super::Reportable;

/// Push notification of metric creation.
///
/// Called at least once for every reportable that exists when the observer is
/// registered and for every reportable created afterwards. Implementations
/// must tolerate repeated notifications for the same metric.
pub trait ReportableObserver: Send + Sync {
    fn add_new_reportable(&self, reportable: &Reportable);
}
