use std::time::Instant;

use tracing::{field, info_span};

use super::{Middleware, Next};
use crate::context::DispatchContext;
use crate::http::Response;

/// Opens one `dispatch` span around the rest of the chain and records the
/// resulting status and latency on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, ctx: &mut DispatchContext, next: Next<'_>) -> anyhow::Result<Response> {
        let span = info_span!(
            "dispatch",
            request_id = %ctx.request_id,
            method = %ctx.request.method,
            path = %ctx.request.path,
            route_name = ctx.route_name.as_deref().unwrap_or(""),
            status = field::Empty,
            duration_us = field::Empty,
        );
        let _entered = span.enter();
        let start = Instant::now();

        let result = next.run(ctx);

        span.record(
            "duration_us",
            u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
        );
        if let Ok(response) = &result {
            span.record("status", response.status);
        }
        result
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
