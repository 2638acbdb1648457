use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::{Middleware, Next};
use crate::context::DispatchContext;
use crate::http::Response;

/// Middleware counting dispatches, failures and latency.
///
/// All counters use atomic operations, so one instance can be shared by
/// every route and thread. A dispatch counts as an error when the rest of
/// the chain fails or answers with a 5xx status.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    error_count: AtomicUsize,
    total_latency_ns: AtomicU64,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
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
}

impl Middleware for MetricsMiddleware {
    fn handle(&self, ctx: &mut DispatchContext, next: Next<'_>) -> anyhow::Result<Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let result = next.run(ctx);
        self.total_latency_ns.fetch_add(
            u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        match &result {
            Ok(response) if response.status < 500 => {}
            _ => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    fn name(&self) -> &str {
        "metrics"
    }
}
