mod builder;
mod error;

pub use builder::CorsMiddlewareBuilder;
pub use error::CorsConfigError;

use std::sync::Arc;

use http::Method;
use regex::Regex;
use tracing::{debug, warn};

use super::{Middleware, Next};
use crate::context::DispatchContext;
use crate::http::Response;

/// Origin validation strategy
#[derive(Clone)]
pub enum OriginValidation {
    /// Exact string matching
    Exact(Vec<String>),
    /// Wildcard (allow all origins)
    Wildcard,
    /// Regex pattern matching
    Regex(Vec<Regex>),
    /// Custom validation function
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl std::fmt::Debug for OriginValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginValidation::Exact(origins) => f.debug_tuple("Exact").field(origins).finish(),
            OriginValidation::Wildcard => write!(f, "Wildcard"),
            OriginValidation::Regex(patterns) => f
                .debug_tuple("Regex")
                .field(&patterns.iter().map(Regex::as_str).collect::<Vec<_>>())
                .finish(),
            OriginValidation::Custom(_) => write!(f, "Custom(<function>)"),
        }
    }
}

impl OriginValidation {
    fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginValidation::Exact(origins) => origins.iter().any(|o| o == origin),
            OriginValidation::Wildcard => true,
            OriginValidation::Regex(patterns) => patterns.iter().any(|re| re.is_match(origin)),
            OriginValidation::Custom(validator) => validator(origin),
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, OriginValidation::Wildcard)
    }
}

/// CORS (Cross-Origin Resource Sharing) middleware
///
/// Requests without an `Origin` header pass through untouched. A preflight
/// (`OPTIONS` carrying `Access-Control-Request-Method`) is answered with
/// `204 No Content` without reaching the handler. Other cross-origin
/// requests run the rest of the chain and get CORS headers added to the
/// response. Origins that fail validation are refused with `403`.
///
/// ```rust,ignore
/// use trailhead::middleware::CorsMiddlewareBuilder;
/// use http::Method;
///
/// let cors = CorsMiddlewareBuilder::new()
///     .allowed_origins(&["https://example.com"])
///     .allowed_methods(&[Method::GET, Method::POST])
///     .allow_credentials(true)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    pub(crate) origin_validation: OriginValidation,
    pub(crate) allowed_headers: Vec<String>,
    pub(crate) allowed_methods: Vec<Method>,
    pub(crate) allow_credentials: bool,
    pub(crate) expose_headers: Vec<String>,
    pub(crate) max_age: Option<u32>,
}

impl Default for CorsMiddleware {
    /// Secure default: no origin is allowed.
    fn default() -> Self {
        Self {
            origin_validation: OriginValidation::Exact(vec![]),
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: default_methods(),
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }
}

pub(crate) fn default_methods() -> Vec<Method> {
    vec![
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]
}

impl CorsMiddleware {
    /// Allow every origin, without credentials.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            origin_validation: OriginValidation::Wildcard,
            ..Self::default()
        }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when refused.
    fn validate_origin(&self, origin: &str) -> Option<String> {
        if !self.origin_validation.is_allowed(origin) {
            return None;
        }
        if self.origin_validation.is_wildcard() {
            Some("*".to_string())
        } else {
            Some(origin.to_string())
        }
    }

    fn handle_preflight(&self, ctx: &DispatchContext, allow_origin: String) -> Response {
        let requested = ctx
            .request
            .header("access-control-request-method")
            .unwrap_or_default();
        let method_allowed = Method::from_bytes(requested.trim().to_ascii_uppercase().as_bytes())
            .map(|m| self.allowed_methods.contains(&m))
            .unwrap_or(false);
        if !method_allowed {
            warn!(requested_method = %requested, "CORS preflight: method not allowed");
            return Response::error(403, "CORS method not allowed");
        }

        if let Some(requested_headers) = ctx.request.header("access-control-request-headers") {
            let allow_all = self.allowed_headers.iter().any(|h| h == "*");
            let rejected = requested_headers
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .find(|h| !allow_all && !self.allowed_headers.iter().any(|a| a.eq_ignore_ascii_case(h)));
            if let Some(header) = rejected {
                warn!(header = %header, "CORS preflight: header not allowed");
                return Response::error(403, "CORS header not allowed");
            }
        }

        let mut response = Response::new(204, Default::default(), serde_json::Value::Null);
        response.set_header("access-control-allow-origin", allow_origin);
        response.set_header(
            "access-control-allow-methods",
            self.allowed_methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        response.set_header("access-control-allow-headers", self.allowed_headers.join(", "));
        if self.allow_credentials {
            response.set_header("access-control-allow-credentials", "true");
        }
        if let Some(age) = self.max_age {
            response.set_header("access-control-max-age", age.to_string());
        }
        response.set_header("vary", "Origin");
        response
    }

    fn decorate(&self, response: &mut Response, allow_origin: String) {
        response.set_header("access-control-allow-origin", allow_origin);
        if self.allow_credentials {
            response.set_header("access-control-allow-credentials", "true");
        }
        if !self.expose_headers.is_empty() {
            response.set_header("access-control-expose-headers", self.expose_headers.join(", "));
        }
        response.set_header("vary", "Origin");
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: &mut DispatchContext, next: Next<'_>) -> anyhow::Result<Response> {
        let Some(origin) = ctx.request.header("origin").map(str::to_string) else {
            return next.run(ctx);
        };
        let Some(allow_origin) = self.validate_origin(&origin) else {
            warn!(origin = %origin, request_id = %ctx.request_id, "CORS origin rejected");
            return Ok(Response::error(403, "CORS origin not allowed"));
        };

        let is_preflight = ctx.request.method == Method::OPTIONS
            && ctx.request.header("access-control-request-method").is_some();
        if is_preflight {
            debug!(origin = %origin, "CORS preflight short-circuit");
            return Ok(self.handle_preflight(ctx, allow_origin));
        }

        let mut response = next.run(ctx)?;
        self.decorate(&mut response, allow_origin);
        Ok(response)
    }

    fn name(&self) -> &str {
        "cors"
    }
}
