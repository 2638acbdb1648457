//! Handler abstraction.
//!
//! A handler declares its formal parameters through a [`Signature`] so the
//! binder can map captured values onto them without runtime reflection.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::context::DispatchContext;
use crate::http::Response;

/// One formal parameter of a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    /// Value used when the argument bag has no entry with this name
    pub default: Option<Value>,
}

/// Ordered formal parameters of a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<ParamSpec>,
}

impl Signature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required parameter.
    #[must_use]
    pub fn param(mut self, name: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            default: None,
        });
        self
    }

    /// Append a parameter with a default value.
    #[must_use]
    pub fn param_with_default(mut self, name: &str, default: Value) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            default: Some(default),
        });
        self
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Callable end of a route.
///
/// `args` is the bound argument list, one value per parameter of
/// [`Handler::signature`] in declaration order (or the raw argument bag
/// under the pass-through binding policy).
pub trait Handler: Send + Sync {
    /// Name used in logs and binding errors.
    fn name(&self) -> &str;

    fn signature(&self) -> &Signature;

    /// # Errors
    ///
    /// Any error is reported as a handler failure and routed through the
    /// route's error hooks.
    fn call(&self, ctx: &mut DispatchContext, args: Vec<Value>) -> anyhow::Result<Response>;
}

/// Handler backed by a closure.
pub struct FnHandler<F> {
    name: String,
    signature: Signature,
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut DispatchContext, Vec<Value>) -> anyhow::Result<Response> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, ctx: &mut DispatchContext, args: Vec<Value>) -> anyhow::Result<Response> {
        (self.f)(ctx, args)
    }
}

/// Wrap a closure as a shareable handler.
pub fn handler_fn<F>(name: &str, signature: Signature, f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut DispatchContext, Vec<Value>) -> anyhow::Result<Response> + Send + Sync + 'static,
{
    Arc::new(FnHandler {
        name: name.to_string(),
        signature,
        f,
    })
}

/// Symbolic reference to a registered handler: `Controller@action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerRef {
    pub controller: String,
    pub action: String,
}

impl HandlerRef {
    #[must_use]
    pub fn new(controller: &str, action: &str) -> Self {
        Self {
            controller: controller.to_string(),
            action: action.to_string(),
        }
    }

    /// Parse `Controller@action`. Both halves must be non-empty after
    /// trimming and there must be exactly one `@`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (controller, action) = s.split_once('@')?;
        let (controller, action) = (controller.trim(), action.trim());
        if controller.is_empty() || action.is_empty() || action.contains('@') {
            return None;
        }
        Some(Self::new(controller, action))
    }

    /// The reference as looked up in the registry for a route in `namespace`.
    #[must_use]
    pub fn qualified(&self, namespace: Option<&str>) -> HandlerRef {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => HandlerRef {
                controller: format!("{ns}::{}", self.controller),
                action: self.action.clone(),
            },
            None => self.clone(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// What a route dispatches to.
#[derive(Clone)]
pub enum Target {
    /// A handler bound at registration time
    Handler(Arc<dyn Handler>),
    /// A handler resolved through the registry at dispatch time
    Named(HandlerRef),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Handler(handler) => f.debug_tuple("Handler").field(&handler.name()).finish(),
            Target::Named(reference) => f.debug_tuple("Named").field(reference).finish(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Handler(handler) => f.write_str(handler.name()),
            Target::Named(reference) => reference.fmt(f),
        }
    }
}

impl From<Arc<dyn Handler>> for Target {
    fn from(handler: Arc<dyn Handler>) -> Self {
        Target::Handler(handler)
    }
}

impl From<HandlerRef> for Target {
    fn from(reference: HandlerRef) -> Self {
        Target::Named(reference)
    }
}
