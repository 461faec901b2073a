use std::sync::atomic::{AtomicI64, Ordering};

/// Named monotonic counter.
#[derive(Debug)]
pub struct Counter {
    name: String,
    count: AtomicI64,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: AtomicI64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Increment by 1.
    pub fn increment(&self) {
        self.increment_by(1);
    }

    /// Increment by an arbitrary delta.
    pub fn increment_by(&self, delta: i64) {
        self.count.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Reset to zero. The counter stays registered.
    pub fn initialize(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}
