//! # CLI Module
//!
//! Command-line access to route-table files: list them, check them, see
//! which route a request would select and build URLs by route name. No
//! handler is ever invoked.
//!
//! ## Commands
//!
//! ```bash
//! trailhead routes -c routes.yaml
//! trailhead check  -c routes.yaml
//! trailhead match  -c routes.yaml GET /users/42
//! trailhead url    -c routes.yaml users.show id=42 --root /app --query tab=posts
//! ```
//!
//! `-c` falls back to the `TRAILHEAD_ROUTES` environment variable.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use trailhead::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli, &mut std::io::stdout())?;
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
