//! Error types for routing and dispatch.
//!
//! Every failure that can leave the core is a [`RouteError`]. A negative match
//! is not an error: it is reported as [`DispatchOutcome::NotFound`].
//!
//! [`DispatchOutcome::NotFound`]: crate::dispatcher::DispatchOutcome::NotFound

use std::fmt;

/// Coarse classification of a [`RouteError`], handed to error hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed template or match-type rule
    CompileError,
    /// A named handler target is not registered
    UnresolvedTarget,
    /// Handler parameters could not be bound under the strict policy
    BindingFallback,
    /// A before/after hook raised
    HookFailure,
    /// The handler (or a middleware wrapping it) raised
    HandlerFailure,
    /// Reverse routing was asked for a route name that does not exist
    UnknownRoute,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CompileError => "compile_error",
            ErrorKind::UnresolvedTarget => "unresolved_target",
            ErrorKind::BindingFallback => "binding_fallback",
            ErrorKind::HookFailure => "hook_failure",
            ErrorKind::HandlerFailure => "handler_failure",
            ErrorKind::UnknownRoute => "unknown_route",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage a hook failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Before,
    After,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::Before => f.write_str("before"),
            HookStage::After => f.write_str("after"),
        }
    }
}

/// Routing and dispatch error.
#[derive(Debug)]
pub enum RouteError {
    /// The template (or a match-type rule) could not be compiled
    Compile {
        /// The offending template or rule
        template: String,
        /// Byte offset of the problem inside `template`, when known
        position: Option<usize>,
        /// Human readable reason
        reason: String,
    },
    /// A named target does not resolve to a registered handler
    UnresolvedTarget {
        /// Fully qualified `controller@action` identifier that was looked up
        target: String,
    },
    /// One or more formal parameters could not be bound
    Binding {
        /// Display name of the handler being bound
        handler: String,
        /// Names of the parameters left unmatched
        unmatched: Vec<String>,
    },
    /// A before/after hook raised
    Hook {
        stage: HookStage,
        source: anyhow::Error,
    },
    /// The handler or one of its middleware raised
    Handler { source: anyhow::Error },
    /// `build_uri` was called with an unknown route name
    UnknownRoute { name: String },
}

impl RouteError {
    pub(crate) fn compile(template: &str, position: Option<usize>, reason: impl Into<String>) -> Self {
        RouteError::Compile {
            template: template.to_string(),
            position,
            reason: reason.into(),
        }
    }

    /// Classification used by error hooks and logging.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouteError::Compile { .. } => ErrorKind::CompileError,
            RouteError::UnresolvedTarget { .. } => ErrorKind::UnresolvedTarget,
            RouteError::Binding { .. } => ErrorKind::BindingFallback,
            RouteError::Hook { .. } => ErrorKind::HookFailure,
            RouteError::Handler { .. } => ErrorKind::HandlerFailure,
            RouteError::UnknownRoute { .. } => ErrorKind::UnknownRoute,
        }
    }

    /// Turn an error raised inside the pipeline back into a `RouteError`.
    ///
    /// Errors that already are a `RouteError` (binding failures, for instance)
    /// keep their kind; anything else is a handler failure.
    pub(crate) fn from_pipeline(err: anyhow::Error) -> Self {
        match err.downcast::<RouteError>() {
            Ok(route_err) => route_err,
            Err(source) => RouteError::Handler { source },
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Compile {
                template,
                position: Some(pos),
                reason,
            } => write!(f, "cannot compile '{template}' at offset {pos}: {reason}"),
            RouteError::Compile {
                template, reason, ..
            } => write!(f, "cannot compile '{template}': {reason}"),
            RouteError::UnresolvedTarget { target } => {
                write!(f, "handler target '{target}' is not registered")
            }
            RouteError::Binding { handler, unmatched } => write!(
                f,
                "cannot bind arguments for '{handler}': unmatched parameter(s) {}",
                unmatched.join(", ")
            ),
            RouteError::Hook { stage, source } => write!(f, "{stage} hook failed: {source}"),
            RouteError::Handler { source } => write!(f, "handler failed: {source}"),
            RouteError::UnknownRoute { name } => write!(f, "no route named '{name}'"),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Hook { source, .. } | RouteError::Handler { source } => Some(&**source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_pipeline_error_keeps_route_error_kind() {
        let err = anyhow::Error::new(RouteError::Binding {
            handler: "show".into(),
            unmatched: vec!["id".into()],
        });
        assert_eq!(RouteError::from_pipeline(err).kind(), ErrorKind::BindingFallback);
    }

    #[test]
    fn test_pipeline_error_wraps_foreign_error() {
        let err = RouteError::from_pipeline(anyhow::anyhow!("boom"));
        assert_eq!(err.kind(), ErrorKind::HandlerFailure);
        assert_eq!(err.to_string(), "handler failed: boom");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_compile_error_message() {
        let err = RouteError::compile("/a/{b", Some(3), "unclosed capture");
        assert_eq!(err.to_string(), "cannot compile '/a/{b' at offset 3: unclosed capture");
    }
}
