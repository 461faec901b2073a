use std::sync::atomic::{AtomicI64, Ordering};

/// Named timer accumulating count, sum and sum of squares of measurements.
///
/// The three fields are updated by independent atomic adds. A reader racing
/// with writers may see them mutually inconsistent for a moment; exporters
/// only consume them statistically.
#[derive(Debug)]
pub struct Timer {
    name: String,
    count: AtomicI64,
    sum: AtomicI64,
    sum_of_squares: AtomicI64,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: AtomicI64::new(0),
            sum: AtomicI64::new(0),
            sum_of_squares: AtomicI64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record one measurement (milliseconds by convention).
    pub fn add_measurement(&self, duration: i64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(duration, Ordering::Relaxed);
        self.sum_of_squares
            .fetch_add(duration.wrapping_mul(duration), Ordering::Relaxed);
    }

    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> i64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn sum_of_squares(&self) -> i64 {
        self.sum_of_squares.load(Ordering::Relaxed)
    }

    /// Mean of all measurements, 0 when empty.
    pub fn average(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.sum() as f64 / count as f64
    }

    /// Sample standard deviation (n - 1 denominator), 0 for fewer than two
    /// measurements.
    pub fn std_dev(&self) -> f64 {
        let n = self.count();
        if n <= 1 {
            return 0.0;
        }
        let n = n as f64;
        let sum = self.sum() as f64;
        let variance = (self.sum_of_squares() as f64 - sum * sum / n) / (n - 1.0);
        // A torn read can push the variance slightly negative.
        if variance <= 0.0 {
            0.0
        } else {
            variance.sqrt()
        }
    }

    /// Reset all accumulated values.
    pub fn initialize(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.sum.store(0, Ordering::Relaxed);
        self.sum_of_squares.store(0, Ordering::Relaxed);
    }
}
