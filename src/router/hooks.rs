use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

use super::route::Route;
use crate::context::DispatchContext;
use crate::error::{HookStage, RouteError};
use crate::http::Response;

/// Before/after hook. Receives the route and the dispatch context, which
/// carries the extra arguments and (for after-hooks) the response.
pub type RouteHook = Arc<dyn Fn(&Route, &mut DispatchContext) -> anyhow::Result<()> + Send + Sync>;

/// Error hook. Returning `Some(response)` supplies the response for the
/// failed dispatch.
pub type ErrorHook = Arc<
    dyn Fn(&Route, &mut DispatchContext, &RouteError) -> anyhow::Result<Option<Response>>
        + Send
        + Sync,
>;

/// Lifecycle hooks of a route.
///
/// Before and after hooks run in registration order. Error hooks form a
/// stack: the most recently pushed runs first.
#[derive(Clone, Default)]
pub struct Hooks {
    before: Vec<RouteHook>,
    after: Vec<RouteHook>,
    error: Vec<ErrorHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("error", &self.error.len())
            .finish()
    }
}

impl Hooks {
    pub fn push_before(&mut self, hook: RouteHook) {
        self.before.push(hook);
    }

    pub fn push_after(&mut self, hook: RouteHook) {
        self.after.push(hook);
    }

    pub fn push_error(&mut self, hook: ErrorHook) {
        self.error.push(hook);
    }

    #[must_use]
    pub fn before_count(&self) -> usize {
        self.before.len()
    }

    #[must_use]
    pub fn after_count(&self) -> usize {
        self.after.len()
    }

    #[must_use]
    pub fn has_error_hooks(&self) -> bool {
        !self.error.is_empty()
    }

    pub(crate) fn run_before(&self, route: &Route, ctx: &mut DispatchContext) -> Result<(), RouteError> {
        run_stage(&self.before, HookStage::Before, route, ctx)
    }

    pub(crate) fn run_after(&self, route: &Route, ctx: &mut DispatchContext) -> Result<(), RouteError> {
        run_stage(&self.after, HookStage::After, route, ctx)
    }

    /// Run the error stack for `err`.
    ///
    /// Every hook runs, newest first. The first `Some` response wins; when no
    /// hook supplies one the result is a `500`. Errors raised by the hooks
    /// themselves are logged and dropped.
    pub(crate) fn recover(&self, route: &Route, ctx: &mut DispatchContext, err: &RouteError) -> Response {
        let mut recovered: Option<Response> = None;
        for (depth, hook) in self.error.iter().rev().enumerate() {
            match hook(route, ctx, err) {
                Ok(Some(response)) if recovered.is_none() => recovered = Some(response),
                Ok(_) => {}
                Err(hook_err) => error!(
                    route = %route.template(),
                    request_id = %ctx.request_id,
                    depth,
                    error = %hook_err,
                    original_error = %err,
                    "Error hook failed"
                ),
            }
        }

        debug!(
            route = %route.template(),
            kind = %err.kind(),
            recovered = recovered.is_some(),
            "Error hooks completed"
        );
        recovered.unwrap_or_else(|| internal_error(err))
    }
}

fn run_stage(
    hooks: &[RouteHook],
    stage: HookStage,
    route: &Route,
    ctx: &mut DispatchContext,
) -> Result<(), RouteError> {
    for hook in hooks {
        hook(route, ctx).map_err(|source| RouteError::Hook { stage, source })?;
    }
    Ok(())
}

/// `500` body used when no error hook supplies a response.
pub(crate) fn internal_error(err: &RouteError) -> Response {
    Response::json(
        500,
        serde_json::json!({
            "error": "Internal Server Error",
            "kind": err.kind().as_str(),
        }),
    )
}
