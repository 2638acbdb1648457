use std::sync::Arc;

use super::{
    CorsMiddleware, MaintenanceMiddleware, MetricsMiddleware, Middleware, MiddlewareFactory,
    TracingMiddleware,
};

/// Factory resolving the built-in middleware by name: `tracing`, `metrics`,
/// `cors` and `maintenance` (case-insensitive).
///
/// Each name maps to one shared instance, so counters and toggles are
/// visible through the accessors below.
#[derive(Debug, Clone)]
pub struct BuiltinMiddleware {
    tracing: Arc<TracingMiddleware>,
    metrics: Arc<MetricsMiddleware>,
    cors: Arc<CorsMiddleware>,
    maintenance: Arc<MaintenanceMiddleware>,
}

impl Default for BuiltinMiddleware {
    fn default() -> Self {
        Self::new(CorsMiddleware::default())
    }
}

impl BuiltinMiddleware {
    #[must_use]
    pub fn new(cors: CorsMiddleware) -> Self {
        Self {
            tracing: Arc::new(TracingMiddleware),
            metrics: Arc::new(MetricsMiddleware::new()),
            cors: Arc::new(cors),
            maintenance: Arc::new(MaintenanceMiddleware::default()),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsMiddleware {
        &self.metrics
    }

    #[must_use]
    pub fn maintenance(&self) -> &MaintenanceMiddleware {
        &self.maintenance
    }

    /// Names this factory resolves.
    #[must_use]
    pub fn names() -> &'static [&'static str] {
        &["tracing", "metrics", "cors", "maintenance"]
    }
}

impl MiddlewareFactory for BuiltinMiddleware {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        let middleware: Arc<dyn Middleware> = match name.to_ascii_lowercase().as_str() {
            "tracing" => Arc::clone(&self.tracing) as Arc<dyn Middleware>,
            "metrics" => Arc::clone(&self.metrics) as Arc<dyn Middleware>,
            "cors" => Arc::clone(&self.cors) as Arc<dyn Middleware>,
            "maintenance" => Arc::clone(&self.maintenance) as Arc<dyn Middleware>,
            _ => return None,
        };
        Some(middleware)
    }
}
