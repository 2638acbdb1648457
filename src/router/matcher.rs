use http::Method;
use std::sync::Arc;
use tracing::debug;

use super::route::Route;
use crate::error::RouteError;
use crate::pattern::{Captures, CompiledPattern};

/// A route that accepted a request, with the values it captured.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    pub route: &'r Route,
    /// Position of the route in registration order
    pub index: usize,
    pub pattern: Arc<CompiledPattern>,
    pub captures: Captures,
}

/// Outcome of testing one route whose method set accepted the request.
#[derive(Debug)]
pub enum Candidate<'r> {
    Matched(RouteMatch<'r>),
    /// The route's template failed to compile and its literal prefix
    /// covers the path
    Broken {
        route: &'r Route,
        index: usize,
        error: RouteError,
    },
}

/// Walks routes in registration order and yields every route that accepts
/// the method and either matches the path or cannot be compiled.
///
/// A route that cannot be compiled is only yielded for paths starting with
/// the literal text before its first capture. Routes rejecting the method
/// or the path are skipped silently; the dispatcher decides what a broken
/// route means.
#[derive(Debug)]
pub struct Matcher<'r, 'p> {
    routes: std::iter::Enumerate<std::slice::Iter<'r, Route>>,
    method: Method,
    path: &'p str,
}

impl<'r, 'p> Matcher<'r, 'p> {
    pub(crate) fn new(routes: &'r [Route], method: Method, path: &'p str) -> Self {
        Self {
            routes: routes.iter().enumerate(),
            method,
            path,
        }
    }
}

impl<'r> Iterator for Matcher<'r, '_> {
    type Item = Candidate<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, route) in self.routes.by_ref() {
            if !route.accepts(&self.method) {
                continue;
            }
            let pattern = match route.pattern() {
                Ok(pattern) => Arc::clone(pattern),
                Err(error) if self.path.starts_with(literal_prefix(route.template())) => {
                    return Some(Candidate::Broken { route, index, error })
                }
                Err(_) => continue,
            };
            match pattern.matches(self.path) {
                Some(captures) => {
                    return Some(Candidate::Matched(RouteMatch {
                        route,
                        index,
                        pattern,
                        captures,
                    }))
                }
                None => debug!(
                    method = %self.method,
                    path = %self.path,
                    route_pattern = %route.template(),
                    "Route rejected path"
                ),
            }
        }
        None
    }
}

/// Template text up to its first capture.
fn literal_prefix(template: &str) -> &str {
    template.find('{').map_or(template, |brace| &template[..brace])
}
