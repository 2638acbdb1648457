//! # Middleware Module
//!
//! Chain-of-responsibility pipeline that wraps a route's handler.
//!
//! Each [`Middleware`] receives the dispatch context and a [`Next`]
//! continuation. Calling [`Next::run`] continues with the remaining entries
//! and finally the handler; returning without calling it short-circuits the
//! chain. Entries are either instances or names resolved through a
//! [`MiddlewareFactory`]; names that do not resolve are skipped with a
//! warning.
//!
//! Router-wide middleware (registered on the dispatcher) runs before a
//! route's own middleware.
//!
//! ## Built-in middleware
//!
//! - [`TracingMiddleware`]: one `dispatch` span per request
//! - [`MetricsMiddleware`]: request/error counters and average latency
//! - [`CorsMiddleware`]: origin validation, preflight answers, CORS headers
//! - [`MaintenanceMiddleware`]: `503` while maintenance mode is on
//!
//! [`BuiltinMiddleware`] resolves these by name for route tables loaded from
//! configuration.

mod builtin;
mod core;
mod cors;
mod maintenance;
mod metrics;
mod pipeline;
mod tracing;

pub use self::core::{
    middleware_fn, FnMiddleware, Middleware, MiddlewareEntry, MiddlewareFactory, Next, Terminal,
};
pub use builtin::BuiltinMiddleware;
pub use cors::{CorsConfigError, CorsMiddleware, CorsMiddlewareBuilder, OriginValidation};
pub use maintenance::MaintenanceMiddleware;
pub use metrics::MetricsMiddleware;
pub use pipeline::MiddlewarePipeline;
pub use self::tracing::TracingMiddleware;
