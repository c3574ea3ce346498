use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond timestamps that never repeat or go backwards within a process.
///
/// Each call returns `max(now, previous + 1)`.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(previous + 1);
            match self
                .last
                .compare_exchange_weak(previous, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }

    /// Make later calls return values strictly greater than `millis`
    pub fn observe(&self, millis: i64) {
        self.last.fetch_max(millis, Ordering::AcqRel);
    }
}
