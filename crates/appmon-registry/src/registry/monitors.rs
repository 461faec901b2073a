use std::convert::Infallible;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::ReentrantMutex;

use appmon_core::{AsReportable, ReportVisitor, Reportable};

use super::ObserverList;

/// Concurrent name -> metric map for one metric category.
///
/// Creation is memoized: for a given key the factory runs at most once and
/// every caller gets the same instance. Observers are notified once per
/// inserted instance, inside the create lock, after the value is visible in
/// the map. The lock is re-entrant so an observer may touch this registry
/// again from the notifying thread.
pub struct Monitors<T> {
    entries: DashMap<String, T>,
    create_lock: ReentrantMutex<()>,
    observers: Arc<ObserverList>,
}

impl<T> Monitors<T>
where
    T: AsReportable + Clone,
{
    pub fn new(observers: Arc<ObserverList>) -> Self {
        Self {
            entries: DashMap::new(),
            create_lock: ReentrantMutex::new(()),
            observers,
        }
    }

    /// Lookup without side effects.
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn get_or_create<F>(&self, key: &str, factory: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self.try_get_or_create(key, || Ok::<T, Infallible>(factory())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Get or create with a fallible factory. On error nothing is inserted.
    pub fn try_get_or_create<F, E>(&self, key: &str, factory: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }

        let _guard = self.create_lock.lock();
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }

        let value = factory()?;
        self.entries.insert(key.to_string(), value.clone());
        self.observers.notify(&value.as_reportable());
        Ok(value)
    }

    /// Unconditional overwrite. Observers are notified even when replacing.
    pub fn put(&self, key: &str, value: T) -> Option<T> {
        let _guard = self.create_lock.lock();
        let previous = self.entries.insert(key.to_string(), value.clone());
        self.observers.notify(&value.as_reportable());
        previous
    }

    /// Insert only if absent. Returns the existing value when there is one.
    pub fn put_if_absent(&self, key: &str, value: T) -> Option<T> {
        if let Some(existing) = self.get(key) {
            return Some(existing);
        }

        let _guard = self.create_lock.lock();
        if let Some(existing) = self.get(key) {
            return Some(existing);
        }
        self.entries.insert(key.to_string(), value.clone());
        self.observers.notify(&value.as_reportable());
        None
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in ascending order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Values ordered by key.
    pub fn values(&self) -> Vec<T> {
        let mut entries: Vec<(String, T)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, v)| v).collect()
    }

    pub fn reportables(&self) -> Vec<Reportable> {
        self.values().iter().map(AsReportable::as_reportable).collect()
    }

    pub fn accept(&self, visitor: &mut dyn ReportVisitor) {
        for reportable in self.reportables() {
            reportable.accept(visitor);
        }
    }
}
