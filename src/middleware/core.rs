use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::context::DispatchContext;
use crate::http::Response;

/// A stage of the dispatch pipeline.
///
/// Implementations either produce a response themselves (short-circuit) or
/// call [`Next::run`] to continue with the rest of the chain and the
/// handler. `Next` is consumed by the call, so the rest of the chain runs
/// at most once.
pub trait Middleware: Send + Sync {
    /// # Errors
    ///
    /// Errors are reported as handler failures of the route being dispatched.
    fn handle(&self, ctx: &mut DispatchContext, next: Next<'_>) -> anyhow::Result<Response>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Middleware backed by a closure. See [`middleware_fn`].
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut DispatchContext, Next<'_>) -> anyhow::Result<Response> + Send + Sync,
{
    fn handle(&self, ctx: &mut DispatchContext, next: Next<'_>) -> anyhow::Result<Response> {
        (self.f)(ctx, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as middleware.
pub fn middleware_fn<F>(name: &str, f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut DispatchContext, Next<'_>) -> anyhow::Result<Response> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware {
        name: name.to_string(),
        f,
    })
}

/// Resolves named middleware entries at run time.
pub trait MiddlewareFactory: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Middleware>>;
}

impl<F> MiddlewareFactory for F
where
    F: Fn(&str) -> Option<Arc<dyn Middleware>> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        self(name)
    }
}

/// One element of a middleware chain.
#[derive(Clone)]
pub enum MiddlewareEntry {
    Instance(Arc<dyn Middleware>),
    /// Resolved through the [`MiddlewareFactory`] each time the chain runs
    Named(String),
}

impl MiddlewareEntry {
    /// Identity used for de-duplication: names compare by value, instances
    /// by pointer.
    #[must_use]
    pub fn same_as(&self, other: &MiddlewareEntry) -> bool {
        match (self, other) {
            (MiddlewareEntry::Named(a), MiddlewareEntry::Named(b)) => a == b,
            (MiddlewareEntry::Instance(a), MiddlewareEntry::Instance(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    fn resolve(&self, factory: Option<&dyn MiddlewareFactory>) -> Option<Arc<dyn Middleware>> {
        match self {
            MiddlewareEntry::Instance(middleware) => Some(Arc::clone(middleware)),
            MiddlewareEntry::Named(name) => factory.and_then(|f| f.resolve(name)),
        }
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareEntry::Instance(m) => f.debug_tuple("Instance").field(&m.name()).finish(),
            MiddlewareEntry::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl fmt::Display for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareEntry::Instance(m) => f.write_str(m.name()),
            MiddlewareEntry::Named(name) => f.write_str(name),
        }
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareEntry {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        MiddlewareEntry::Instance(middleware)
    }
}

impl From<&str> for MiddlewareEntry {
    fn from(name: &str) -> Self {
        MiddlewareEntry::Named(name.to_string())
    }
}

impl From<String> for MiddlewareEntry {
    fn from(name: String) -> Self {
        MiddlewareEntry::Named(name)
    }
}

/// Final stage of a chain, usually the bound handler.
pub type Terminal<'a> = &'a (dyn Fn(&mut DispatchContext) -> anyhow::Result<Response> + 'a);

/// Continuation handed to each middleware: the rest of the chain plus the
/// terminal stage.
///
/// `Next` is neither `Clone` nor `Copy`: [`Next::run`] takes it by value,
/// so the rest of the chain runs at most once per `handle`.
///
/// ```compile_fail
/// use trailhead::middleware::middleware_fn;
///
/// let _twice = middleware_fn("twice", |ctx, next| {
///     let _ = next.run(ctx);
///     next.run(ctx)
/// });
/// ```
pub struct Next<'a> {
    entries: &'a [MiddlewareEntry],
    factory: Option<&'a dyn MiddlewareFactory>,
    terminal: Option<Terminal<'a>>,
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.entries)
            .field("has_factory", &self.factory.is_some())
            .field("has_terminal", &self.terminal.is_some())
            .finish()
    }
}

impl<'a> Next<'a> {
    #[must_use]
    pub fn new(
        entries: &'a [MiddlewareEntry],
        factory: Option<&'a dyn MiddlewareFactory>,
        terminal: Option<Terminal<'a>>,
    ) -> Self {
        Self {
            entries,
            factory,
            terminal,
        }
    }

    /// Entries not yet run.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    /// Run the rest of the chain.
    ///
    /// Entries that cannot be resolved are skipped. Once the entries are
    /// exhausted the terminal stage runs; without one, the context's current
    /// response is returned unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a middleware or the terminal.
    pub fn run(self, ctx: &mut DispatchContext) -> anyhow::Result<Response> {
        let mut rest = self.entries;
        while let Some((head, tail)) = rest.split_first() {
            rest = tail;
            match head.resolve(self.factory) {
                Some(middleware) => {
                    let next = Next {
                        entries: tail,
                        ..self
                    };
                    return middleware.handle(ctx, next);
                }
                None => warn!(
                    middleware = %head,
                    request_id = %ctx.request_id,
                    has_factory = self.factory.is_some(),
                    "Skipping unresolvable middleware"
                ),
            }
        }

        match self.terminal {
            Some(terminal) => terminal(ctx),
            None => Ok(ctx.response.clone()),
        }
    }
}
