//! # Route-Table Configuration
//!
//! Route tables can be declared in a YAML or TOML file instead of code. The
//! format is picked from the file extension.
//!
//! ```yaml
//! default_methods: [GET, POST]
//! method_override_header: X-HTTP-Method-Override
//! binding: strict            # or pass_through
//! match_types:
//!   SLUG: "[a-z0-9-]+"
//! middleware: [tracing]
//! routes:
//!   - name: users.show
//!     methods: [GET]
//!     path: /users/{id:INT}
//!     handler: Users@show
//!     namespace: admin
//!     middleware: [metrics]
//!     filters:
//!       id: "[0-9]{1,6}"
//! ```
//!
//! [`load_config`] reports every problem in the file at once rather than
//! stopping at the first. A loaded table turns into a [`Router`] with
//! [`RoutesConfig::build_router`] and into dispatcher settings with
//! [`RoutesConfig::dispatcher_options`]. Handlers referenced by
//! `Controller@action` still have to be registered on the dispatcher.
//!
//! [`Router`]: crate::router::Router

mod load;
mod schema;

pub use load::{load_config, parse_config, validate, ConfigError, ConfigFormat, ConfigIssue};
pub(crate) use schema::parse_method;
pub use schema::{RouteConfig, RoutesConfig};
