use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::{Middleware, Next};
use crate::context::DispatchContext;
use crate::http::Response;

/// Short-circuits every dispatch with `503 Service Unavailable` while
/// enabled. Toggling is lock-free and takes effect on the next dispatch.
#[derive(Debug)]
pub struct MaintenanceMiddleware {
    enabled: AtomicBool,
    retry_after_secs: Option<u32>,
}

impl Default for MaintenanceMiddleware {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MaintenanceMiddleware {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            retry_after_secs: None,
        }
    }

    /// Advertise a `Retry-After` delay on maintenance responses.
    #[must_use]
    pub fn retry_after(mut self, seconds: u32) -> Self {
        self.retry_after_secs = Some(seconds);
        self
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Middleware for MaintenanceMiddleware {
    fn handle(&self, ctx: &mut DispatchContext, next: Next<'_>) -> anyhow::Result<Response> {
        if !self.is_enabled() {
            return next.run(ctx);
        }
        debug!(request_id = %ctx.request_id, path = %ctx.request.path, "Maintenance mode short-circuit");
        let mut response = Response::error(503, "Service Unavailable");
        if let Some(secs) = self.retry_after_secs {
            response.set_header("Retry-After", secs.to_string());
        }
        Ok(response)
    }

    fn name(&self) -> &str {
        "maintenance"
    }
}
