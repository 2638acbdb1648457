//! # trailhead
//!
//! **trailhead** is a request-routing and dispatch core: typed URL templates,
//! first-match route selection, argument binding, lifecycle hooks, middleware
//! pipelines and reverse routing. It is transport-agnostic: feed it a
//! [`Request`](http::Request) from any server and send back the
//! [`Response`](http::Response) it produces.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - Template compiler and the match-type registry (`{id:INT}`)
//! - **[`router`]** - Ordered route table, route options, hooks and matching
//! - **[`dispatcher`]** - Per-request lifecycle: hooks, middleware, handler
//! - **[`binder`]** - Binds captured values to handler parameters
//! - **[`middleware`]** - Pipeline plus tracing, metrics, CORS and maintenance
//! - **[`url`]** - Reverse routing from captures or explicit values
//! - **[`config`]** - YAML/TOML route tables
//! - **[`hot_reload`]** - Swap in a new router when the route table changes
//! - **[`logging`]** - `tracing-subscriber` setup from the environment
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Dispatcher
//!     participant Router as Route table
//!     participant Hooks
//!     participant Pipeline as Middleware
//!     participant Handler
//!
//!     Caller->>Dispatcher: dispatch(router, request)
//!     Dispatcher->>Router: first route accepting method + path
//!     alt no route
//!         Dispatcher-->>Caller: NotFound
//!     end
//!     Dispatcher->>Dispatcher: resolve target (Controller@action)
//!     Dispatcher->>Hooks: before hooks
//!     Dispatcher->>Pipeline: router-wide, then route middleware
//!     Pipeline->>Handler: bound arguments
//!     Handler-->>Pipeline: Response
//!     Pipeline-->>Dispatcher: Response
//!     Dispatcher->>Hooks: after hooks
//!     alt any step failed
//!         Dispatcher->>Hooks: error hooks, newest first
//!     end
//!     Dispatcher-->>Caller: Matched(response)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use serde_json::json;
//! use trailhead::dispatcher::Dispatcher;
//! use trailhead::handler::{handler_fn, Signature};
//! use trailhead::http::{Request, Response};
//! use trailhead::router::Router;
//!
//! let mut router = Router::new();
//! router
//!     .get(
//!         "/users/{id:INT}",
//!         handler_fn("users.show", Signature::new().param("id"), |_, args| {
//!             Ok(Response::ok(json!({ "id": args[0] })))
//!         }),
//!     )
//!     .name("users.show");
//!
//! let outcome = Dispatcher::new().dispatch(&router, Request::get("/users/42"))?;
//! assert_eq!(outcome.into_response().body, json!({ "id": "42" }));
//!
//! let url = router.build_uri("users.show", &[("id", "7")][..], "/app", &[("tab", "posts")])?;
//! assert_eq!(url, "/app/users/7?tab=posts");
//! # Ok::<(), trailhead::error::RouteError>(())
//! ```
//!
//! ## Template Syntax
//!
//! | Token | Matches |
//! |-------|---------|
//! | `{name}` | one path segment |
//! | `{name:INT}` | digits |
//! | `{name:HEX}` / `{name:STR}` | hex digits / word characters and dashes |
//! | `{name:*}` / `{name:**}` | anything, lazy / greedy |
//! | `{name?}` | optional, together with the `/` or `.` before it |
//! | `{:INT}` | anonymous capture, addressed by position |
//!
//! Custom tags are added with [`pattern::MatchTypes::register`].

pub mod binder;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod hot_reload;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod pattern;
pub mod registry;
pub mod router;
pub mod url;

pub use config::{load_config, RoutesConfig};
pub use context::{DispatchContext, RequestId};
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherOptions};
pub use error::{ErrorKind, RouteError};
pub use handler::{handler_fn, Handler, HandlerRef, Signature, Target};
pub use router::{Route, RouteOptions, Router, RouterOptions};
