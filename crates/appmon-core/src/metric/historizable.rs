use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Default ring size of a [`HistorizableList`].
pub const DEFAULT_MAX_ENTRIES: usize = 5;

/// One timestamped textual sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Historizable {
    pub timestamp: DateTime<Utc>,
    pub value: String,
}

impl Historizable {
    pub fn new(timestamp: DateTime<Utc>, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    /// Sample stamped with the current wall clock.
    pub fn now(value: impl Into<String>) -> Self {
        Self::new(Utc::now(), value)
    }
}

/// Bounded, most-recent-first history of samples for one name.
///
/// Size and indexed reads go through the same lock, so a `size()` observed by
/// a reader is never larger than what `get` could serve at that moment. Use
/// [`HistorizableList::snapshot`] when both are needed together.
#[derive(Debug)]
pub struct HistorizableList {
    name: String,
    max_entries: usize,
    entries: Mutex<VecDeque<Historizable>>,
}

impl HistorizableList {
    pub fn new(name: impl Into<String>, max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            name: name.into(),
            max_entries,
            entries: Mutex::new(VecDeque::with_capacity(max_entries)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Insert at the front, evicting the oldest sample when full.
    pub fn add(&self, entry: Historizable) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.max_entries);
    }

    pub fn size(&self) -> usize {
        self.entries.lock().len()
    }

    /// `get(0)` is the newest sample.
    pub fn get(&self, index: usize) -> Option<Historizable> {
        self.entries.lock().get(index).cloned()
    }

    /// Consistent copy, newest first.
    pub fn snapshot(&self) -> Vec<Historizable> {
        self.entries.lock().iter().cloned().collect()
    }
}
