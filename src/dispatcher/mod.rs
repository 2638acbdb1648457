//! # Dispatcher Module
//!
//! Drives one request through the route table.
//!
//! ## Request Flow
//!
//! 1. Routes are tested in registration order against the effective method
//!    and the path; the first match is selected.
//! 2. The route's target is resolved: either a handler bound at
//!    registration, or a `Controller@action` reference looked up in the
//!    [`HandlerRegistry`](crate::registry::HandlerRegistry) under the
//!    route's namespace.
//! 3. Before-hooks run in registration order.
//! 4. Router-wide middleware, then route middleware, run around the handler.
//!    The handler's arguments are bound from the captures and any extra
//!    arguments just before it is called.
//! 5. The response is stored on the context and after-hooks run.
//!
//! ## Error Handling
//!
//! Failures in steps 2 to 5 go to the route's error hooks, newest first. The
//! first hook returning a response supplies it; if none does the result is
//! a `500`. A route without error hooks fails the dispatch, except for
//! template and resolution failures, which only disqualify that route:
//! dispatch moves on to the next candidate and reports the first such
//! failure only if nothing else matched.
//!
//! No match at all is [`DispatchOutcome::NotFound`], not an error.

mod core;
#[cfg(test)]
mod tests;

pub use self::core::{DispatchOutcome, Dispatcher, DispatcherOptions};
