use std::sync::Weak;

use appmon_core::{Reportable, ReportableObserver};

use super::CorePlugin;

/// Migration helper registered on a superseded `CorePlugin`.
///
/// Owned only by the old plugin's observer list; the successor keeps a
/// `Weak` handle to it. Dropping the old plugin therefore drops the helper.
pub(crate) struct SyncObserver {
    target: Weak<CorePlugin>,
}

impl SyncObserver {
    pub(crate) fn new(target: Weak<CorePlugin>) -> Self {
        Self { target }
    }
}

impl ReportableObserver for SyncObserver {
    fn add_new_reportable(&self, reportable: &Reportable) {
        if let Some(target) = self.target.upgrade() {
            target.adopt(reportable);
        }
    }
}
