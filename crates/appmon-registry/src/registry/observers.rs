use std::sync::Arc;

use parking_lot::RwLock;

use appmon_core::{Reportable, ReportableObserver};

struct Entry {
    observer: Arc<dyn ReportableObserver>,
    /// Migration helpers are never carried over to a successor registry.
    migrates: bool,
}

/// Observers shared by every category registry of one plugin.
#[derive(Default)]
pub struct ObserverList {
    entries: RwLock<Vec<Entry>>,
}

pub(crate) fn same_observer(a: &Arc<dyn ReportableObserver>, b: &Arc<dyn ReportableObserver>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the observer is already registered.
    pub fn add(&self, observer: Arc<dyn ReportableObserver>) -> bool {
        self.insert(observer, false)
    }

    pub(crate) fn add_migrating(&self, observer: Arc<dyn ReportableObserver>) -> bool {
        self.insert(observer, true)
    }

    fn insert(&self, observer: Arc<dyn ReportableObserver>, migrates: bool) -> bool {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| same_observer(&e.observer, &observer)) {
            return false;
        }
        entries.push(Entry { observer, migrates });
        true
    }

    pub fn remove(&self, observer: &Arc<dyn ReportableObserver>) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| !same_observer(&e.observer, observer));
        entries.len() != before
    }

    /// Application observers, excluding migration helpers.
    pub fn snapshot(&self) -> Vec<Arc<dyn ReportableObserver>> {
        self.entries
            .read()
            .iter()
            .filter(|e| !e.migrates)
            .map(|e| Arc::clone(&e.observer))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every observer. The list is copied first so observers may
    /// register further observers without deadlocking.
    pub fn notify(&self, reportable: &Reportable) {
        let observers: Vec<Arc<dyn ReportableObserver>> =
            self.entries.read().iter().map(|e| Arc::clone(&e.observer)).collect();
        for observer in observers {
            observer.add_new_reportable(reportable);
        }
    }
}
