use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::{Middleware, Next};
use crate::message::{Request, Response};

/// Middleware for collecting request metrics
///
/// Tracks request counts, latency and response status classes.
/// All counters use atomic operations for thread-safe updates without locks.
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    status_classes: [AtomicUsize; 5],
    failures: AtomicUsize,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            status_classes: Default::default(),
            failures: AtomicUsize::new(0),
        }
    }
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses seen with a status in `class`xx (1..=5).
    #[must_use]
    pub fn status_class_count(&self, class: u16) -> usize {
        match class {
            1..=5 => self.status_classes[usize::from(class - 1)].load(Ordering::Relaxed),
            _ => 0,
        }
    }

    /// Requests where an inner stage returned an error instead of a response.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Passive: never blocks requests, only observes and records.
impl Middleware for MetricsMiddleware {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let result = next.run(req);
        let latency = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(latency, Ordering::Relaxed);

        match &result {
            Ok(res) => {
                let class = res.status / 100;
                if (1..=5).contains(&class) {
                    self.status_classes[usize::from(class - 1)].fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }
}
