//! Router core: route registration, lookup and reverse routing.

use http::Method;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::matcher::{Candidate, Matcher, RouteMatch};
use super::route::Route;
use crate::error::RouteError;
use crate::handler::Target;
use crate::http::{Request, METHOD_OVERRIDE_HEADER};
use crate::middleware::MiddlewareEntry;
use crate::pattern::{MatchTypes, PatternCache};
use crate::url::{self, ParamSource};

/// Matches slower than this are logged as warnings.
const SLOW_MATCH: Duration = Duration::from_millis(1);

/// Router-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    /// Methods accepted by routes registered with an empty method list
    pub default_methods: Vec<Method>,
    /// Header whose value overrides the transport method; `None` disables
    /// overriding
    pub method_override_header: Option<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            default_methods: vec![Method::GET, Method::POST],
            method_override_header: Some(METHOD_OVERRIDE_HEADER.to_string()),
        }
    }
}

/// Per-route settings given at registration.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub middleware: Vec<MiddlewareEntry>,
}

impl RouteOptions {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    #[must_use]
    pub fn middleware(mut self, entry: impl Into<MiddlewareEntry>) -> Self {
        self.middleware.push(entry.into());
        self
    }
}

/// Ordered route table.
///
/// Routes are tested in registration order and the first one accepting
/// both method and path wins. The router is immutable while dispatching and
/// can be shared across threads behind an `Arc` (or swapped wholesale
/// through `ArcSwap` on reload).
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    types: Arc<MatchTypes>,
    cache: Arc<PatternCache>,
    options: RouterOptions,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Router using the process-wide match-type registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_match_types(MatchTypes::global())
    }

    /// Router with its own match-type registry.
    #[must_use]
    pub fn with_match_types(types: Arc<MatchTypes>) -> Self {
        Self {
            routes: Vec::new(),
            types,
            cache: Arc::new(PatternCache::new()),
            options: RouterOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    #[must_use]
    pub fn match_types(&self) -> &Arc<MatchTypes> {
        &self.types
    }

    /// Register a route and return it for further configuration.
    ///
    /// An empty `methods` slice means the router's default methods.
    /// Compilation is deferred until the route is first matched (see
    /// [`Router::compile_all`] to surface template errors eagerly).
    pub fn register_route(
        &mut self,
        methods: &[Method],
        template: &str,
        target: impl Into<Target>,
        options: RouteOptions,
    ) -> &mut Route {
        let methods = if methods.is_empty() {
            self.options.default_methods.clone()
        } else {
            methods.to_vec()
        };
        let mut route = Route::new(
            methods,
            template,
            target.into(),
            Arc::clone(&self.types),
            Arc::clone(&self.cache),
        );
        if let Some(name) = &options.name {
            route.name(name);
        }
        if let Some(namespace) = &options.namespace {
            route.namespace(namespace);
        }
        for entry in options.middleware {
            route.middleware(entry);
        }

        debug!(
            template = %template,
            methods = ?route.methods(),
            target = %route.target(),
            route_name = ?route.display_name(),
            "Route registered"
        );
        self.routes.push(route);
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }

    pub fn get(&mut self, template: &str, target: impl Into<Target>) -> &mut Route {
        self.register_route(&[Method::GET], template, target, RouteOptions::default())
    }

    pub fn post(&mut self, template: &str, target: impl Into<Target>) -> &mut Route {
        self.register_route(&[Method::POST], template, target, RouteOptions::default())
    }

    pub fn put(&mut self, template: &str, target: impl Into<Target>) -> &mut Route {
        self.register_route(&[Method::PUT], template, target, RouteOptions::default())
    }

    pub fn delete(&mut self, template: &str, target: impl Into<Target>) -> &mut Route {
        self.register_route(&[Method::DELETE], template, target, RouteOptions::default())
    }

    /// Register a route accepting every standard method.
    pub fn any(&mut self, template: &str, target: impl Into<Target>) -> &mut Route {
        self.register_route(
            &[
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::HEAD,
                Method::OPTIONS,
            ],
            template,
            target,
            RouteOptions::default(),
        )
    }

    /// Register a match type on this router's registry.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Compile`] when the rule is not a valid regex.
    pub fn register_match_type(&self, tag: &str, rule: &str) -> Result<(), RouteError> {
        self.types.register(tag, rule)
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Mutable access for reconfiguring a registered route.
    pub fn route_mut(&mut self, index: usize) -> Option<&mut Route> {
        self.routes.get_mut(index)
    }

    /// First route registered under `name`.
    #[must_use]
    pub fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.display_name() == Some(name))
    }

    /// Method used for matching `req`, honouring the override header.
    #[must_use]
    pub fn effective_method(&self, req: &Request) -> Method {
        req.effective_method(self.options.method_override_header.as_deref())
    }

    /// Every candidate route for `req`, in registration order.
    pub fn candidates<'r, 'p>(&'r self, req: &'p Request) -> Matcher<'r, 'p> {
        Matcher::new(&self.routes, self.effective_method(req), &req.path)
    }

    /// Find the route that would handle `req` without dispatching it.
    ///
    /// Routes whose templates fail to compile are skipped.
    #[must_use]
    pub fn find(&self, req: &Request) -> Option<RouteMatch<'_>> {
        let method = self.effective_method(req);
        debug!(method = %method, path = %req.path, "Route match attempt");

        let start = Instant::now();
        let found = self.candidates(req).find_map(|candidate| match candidate {
            Candidate::Matched(m) => Some(m),
            Candidate::Broken { route, error, .. } => {
                warn!(
                    route_pattern = %route.template(),
                    error = %error,
                    "Skipping route with invalid template"
                );
                None
            }
        });
        let duration = start.elapsed();

        match &found {
            Some(m) if duration > SLOW_MATCH => warn!(
                method = %method,
                path = %req.path,
                route_pattern = %m.route.template(),
                route_name = ?m.route.display_name(),
                duration_us = duration.as_micros() as u64,
                "Slow route matching detected"
            ),
            Some(m) => info!(
                method = %method,
                path = %req.path,
                route_pattern = %m.route.template(),
                route_name = ?m.route.display_name(),
                captures = m.captures.len(),
                duration_us = duration.as_micros() as u64,
                "Route matched"
            ),
            None => warn!(
                method = %method,
                path = %req.path,
                duration_us = duration.as_micros() as u64,
                "No route matched"
            ),
        }
        found
    }

    /// Reverse-route the route named `name`.
    ///
    /// # Errors
    ///
    /// [`RouteError::UnknownRoute`] when no route has that name, or
    /// [`RouteError::Compile`] when its template does not compile.
    pub fn build_uri<P, K, V>(
        &self,
        name: &str,
        params: &P,
        root: &str,
        query: &[(K, V)],
    ) -> Result<String, RouteError>
    where
        P: ParamSource + ?Sized,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let route = self
            .route_by_name(name)
            .ok_or_else(|| RouteError::UnknownRoute {
                name: name.to_string(),
            })?;
        let pattern = route.pattern()?;
        Ok(url::build_uri(pattern, params, root, query))
    }

    /// Compile every route now and report the failures with their position
    /// in the table.
    #[must_use]
    pub fn compile_all(&self) -> Vec<(usize, RouteError)> {
        self.routes
            .iter()
            .enumerate()
            .filter_map(|(index, route)| route.pattern().err().map(|e| (index, e)))
            .collect()
    }
}
