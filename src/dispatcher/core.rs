//! Dispatcher core: the per-request lifecycle.
//!
//! For the first route accepting a request: resolve its target, run its
//! before-hooks, run the middleware pipeline with the bound handler as the
//! terminal stage, store the response on the context and run the
//! after-hooks. Any failure along the way is handed to the route's error
//! hooks; without error hooks it is returned to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::binder::{self, BindingPolicy};
use crate::context::DispatchContext;
use crate::error::RouteError;
use crate::handler::{Handler, Target};
use crate::http::{Request, Response};
use crate::middleware::{MiddlewareEntry, MiddlewareFactory, MiddlewarePipeline};
use crate::registry::HandlerRegistry;
use crate::router::{Candidate, Matcher, Route, Router};

/// Result of a dispatch that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A route handled the request (possibly through its error hooks)
    Matched {
        /// Display name of the route, when it has one
        route: Option<String>,
        response: Response,
    },
    /// No route accepted the method and path
    NotFound,
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, DispatchOutcome::Matched { .. })
    }

    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            DispatchOutcome::Matched { response, .. } => Some(response),
            DispatchOutcome::NotFound => None,
        }
    }

    /// The response to send; `NotFound` becomes a `404`.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self {
            DispatchOutcome::Matched { response, .. } => response,
            DispatchOutcome::NotFound => Response::not_found(),
        }
    }
}

/// Dispatcher settings, usually loaded from the route-table file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherOptions {
    #[serde(default)]
    pub binding: BindingPolicy,
    /// Router-wide middleware names, run before route middleware
    #[serde(default)]
    pub middleware: Vec<String>,
}

/// What happened to one candidate route.
enum RouteRun {
    Done(Response),
    /// The route could not be used; try the next one
    Skipped(RouteError),
}

/// Runs matched routes.
///
/// Holds the handler registry, router-wide middleware and the binding
/// policy. It never mutates itself while dispatching, so one instance can
/// serve many threads.
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    pipeline: MiddlewarePipeline,
    binding: BindingPolicy,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .field("binding", &self.binding)
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Apply the binding policy and router-wide middleware from `options`.
    #[must_use]
    pub fn with_options(mut self, options: DispatcherOptions) -> Self {
        self.binding = options.binding;
        for name in options.middleware {
            self.pipeline.push(name);
        }
        self
    }

    /// Factory used for named middleware, router-wide and per route.
    #[must_use]
    pub fn with_middleware_factory(mut self, factory: Arc<dyn MiddlewareFactory>) -> Self {
        self.pipeline = self.pipeline.with_factory(factory);
        self
    }

    #[must_use]
    pub fn with_binding_policy(mut self, policy: BindingPolicy) -> Self {
        self.binding = policy;
        self
    }

    /// Register a handler for named targets `controller@action`.
    /// Namespaced routes look up `namespace::controller`.
    pub fn register_handler(&mut self, controller: &str, action: &str, handler: Arc<dyn Handler>) {
        self.registry.register(controller, action, handler);
    }

    /// Add router-wide middleware. Runs before any route middleware.
    pub fn use_middleware(&mut self, entry: impl Into<MiddlewareEntry>) -> &mut Self {
        self.pipeline.push(entry);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn binding_policy(&self) -> BindingPolicy {
        self.binding
    }

    /// Dispatch `req` through `router`.
    ///
    /// # Errors
    ///
    /// Returns the failure of the selected route when it has no error hooks,
    /// or the first compile/resolution error of a skipped route when no
    /// other route matched. A route whose template does not compile is only
    /// considered after every other route, and only for paths starting with
    /// its literal prefix; with error hooks it is recovered there instead.
    pub fn dispatch(&self, router: &Router, req: Request) -> Result<DispatchOutcome, RouteError> {
        self.dispatch_with_args(router, req, Vec::new())
    }

    /// Like [`Dispatcher::dispatch`], appending `extra` to the argument bag
    /// after the captured values.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn dispatch_with_args(
        &self,
        router: &Router,
        req: Request,
        extra: Vec<Value>,
    ) -> Result<DispatchOutcome, RouteError> {
        let start = Instant::now();
        let method = router.effective_method(&req);
        let path = req.path.clone();
        let mut ctx = DispatchContext::new(req, extra);
        // First route that could not be used, kept until every candidate
        // has had its chance.
        let mut deferred: Option<(&Route, RouteError)> = None;

        for candidate in Matcher::new(router.routes(), method.clone(), &path) {
            let (route, run) = match candidate {
                Candidate::Matched(m) => {
                    ctx.captures = m.captures;
                    ctx.route_name = m.route.display_name().map(str::to_string);
                    (m.route, self.run_route(m.route, &mut ctx))
                }
                Candidate::Broken { route, error, .. } => (route, Ok(RouteRun::Skipped(error))),
            };

            match run {
                Ok(RouteRun::Done(response)) => {
                    info!(
                        request_id = %ctx.request_id,
                        method = %method,
                        path = %path,
                        route_name = ?ctx.route_name,
                        route_pattern = %route.template(),
                        status = response.status,
                        duration_us = start.elapsed().as_micros() as u64,
                        "Dispatch complete"
                    );
                    return Ok(DispatchOutcome::Matched {
                        route: ctx.route_name,
                        response,
                    });
                }
                Ok(RouteRun::Skipped(err)) => {
                    warn!(
                        request_id = %ctx.request_id,
                        route_pattern = %route.template(),
                        kind = %err.kind(),
                        error = %err,
                        "Route skipped"
                    );
                    ctx.captures = Default::default();
                    ctx.route_name = None;
                    if deferred.is_none() {
                        deferred = Some((route, err));
                    }
                }
                Err(err) => {
                    error!(
                        request_id = %ctx.request_id,
                        method = %method,
                        path = %path,
                        route_pattern = %route.template(),
                        kind = %err.kind(),
                        error = %err,
                        duration_us = start.elapsed().as_micros() as u64,
                        "Dispatch failed"
                    );
                    return Err(err);
                }
            }
        }

        if let Some((route, err)) = deferred {
            if route.hooks().has_error_hooks() {
                ctx.route_name = route.display_name().map(str::to_string);
                let response = route.hooks().recover(route, &mut ctx, &err);
                info!(
                    request_id = %ctx.request_id,
                    method = %method,
                    path = %path,
                    route_pattern = %route.template(),
                    kind = %err.kind(),
                    status = response.status,
                    "Unusable route recovered by error hooks"
                );
                return Ok(DispatchOutcome::Matched {
                    route: ctx.route_name,
                    response,
                });
            }
            error!(
                request_id = %ctx.request_id,
                method = %method,
                path = %path,
                kind = %err.kind(),
                error = %err,
                "No usable route"
            );
            return Err(err);
        }

        debug!(
            request_id = %ctx.request_id,
            method = %method,
            path = %path,
            duration_us = start.elapsed().as_micros() as u64,
            "Dispatch found no route"
        );
        Ok(DispatchOutcome::NotFound)
    }

    /// A route that accepted the request but cannot run: recover through its
    /// error hooks or skip it.
    fn unusable_route(
        &self,
        route: &Route,
        ctx: &mut DispatchContext,
        err: RouteError,
    ) -> Result<RouteRun, RouteError> {
        if route.hooks().has_error_hooks() {
            ctx.route_name = route.display_name().map(str::to_string);
            Ok(RouteRun::Done(route.hooks().recover(route, ctx, &err)))
        } else {
            Ok(RouteRun::Skipped(err))
        }
    }

    fn run_route(&self, route: &Route, ctx: &mut DispatchContext) -> Result<RouteRun, RouteError> {
        let handler = match self.resolve(route) {
            Ok(handler) => handler,
            Err(err) => return self.unusable_route(route, ctx, err),
        };

        match self.run_lifecycle(route, handler.as_ref(), ctx) {
            Ok(response) => Ok(RouteRun::Done(response)),
            Err(err) if route.hooks().has_error_hooks() => {
                debug!(
                    request_id = %ctx.request_id,
                    kind = %err.kind(),
                    error = %err,
                    "Routing failure to error hooks"
                );
                Ok(RouteRun::Done(route.hooks().recover(route, ctx, &err)))
            }
            Err(err) => Err(err),
        }
    }

    fn resolve(&self, route: &Route) -> Result<Arc<dyn Handler>, RouteError> {
        match route.target() {
            Target::Handler(handler) => Ok(Arc::clone(handler)),
            Target::Named(reference) => {
                let qualified = reference.qualified(route.namespace_prefix());
                self.registry
                    .resolve(&qualified)
                    .ok_or_else(|| RouteError::UnresolvedTarget {
                        target: qualified.to_string(),
                    })
            }
        }
    }

    fn run_lifecycle(
        &self,
        route: &Route,
        handler: &dyn Handler,
        ctx: &mut DispatchContext,
    ) -> Result<Response, RouteError> {
        route.hooks().run_before(route, ctx)?;

        let mut pipeline = self.pipeline.clone();
        pipeline.extend(route.middleware_entries());

        let policy = self.binding;
        let terminal = |ctx: &mut DispatchContext| -> anyhow::Result<Response> {
            let args = binder::bind(handler.name(), handler.signature(), ctx.argument_bag(), policy)?;
            debug!(
                request_id = %ctx.request_id,
                handler = handler.name(),
                args = args.len(),
                "Handler execution start"
            );
            handler.call(ctx, args)
        };

        let response = pipeline
            .run(ctx, Some(&terminal))
            .map_err(RouteError::from_pipeline)?;
        ctx.response = response;

        route.hooks().run_after(route, ctx)?;
        Ok(std::mem::take(&mut ctx.response))
    }
}
