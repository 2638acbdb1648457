//! # Router Module
//!
//! Route registration, matching and reverse routing.
//!
//! ## Overview
//!
//! A [`Router`] is an ordered table of [`Route`]s. Each route owns a
//! template (compiled lazily through the pattern cache), the methods it
//! accepts, a target handler, its middleware and its lifecycle hooks.
//!
//! Matching walks the table in registration order. A route is selected when
//! it accepts the request's effective method (the method-override header
//! wins over the transport method when it carries a valid token) and its
//! compiled pattern matches the path. The first such route wins.
//!
//! ## Example
//!
//! ```rust,ignore
//! use trailhead::handler::HandlerRef;
//! use trailhead::http::Request;
//! use trailhead::router::{RouteOptions, Router};
//!
//! let mut router = Router::new();
//! router
//!     .register_route(&[], "/users/{id:INT}", HandlerRef::new("Users", "show"), RouteOptions::named("users.show"))
//!     .filter("id", "[0-9]{1,6}");
//!
//! let found = router.find(&Request::get("/users/42")).unwrap();
//! assert_eq!(found.captures.get("id"), Some("42"));
//!
//! let url = router.build_uri("users.show", &[("id", "7")][..], "", &[] as &[(&str, &str)])?;
//! assert_eq!(url, "/users/7");
//! ```

mod core;
mod hooks;
mod matcher;
mod route;
#[cfg(test)]
mod tests;

pub use self::core::{RouteOptions, Router, RouterOptions};
pub use hooks::{ErrorHook, Hooks, RouteHook};
pub use matcher::{Candidate, Matcher, RouteMatch};
pub use route::Route;
