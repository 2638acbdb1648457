use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{self, parse_method, RoutesConfig};
use crate::http::Request;
use crate::router::{Route, Router};

/// Command-line interface for trailhead route tables
#[derive(Debug, Parser)]
#[command(name = "trailhead", version)]
#[command(about = "Inspect, check and exercise trailhead route tables", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the route table in match order
    Routes {
        /// Route-table file (YAML or TOML)
        #[arg(short, long, env = "TRAILHEAD_ROUTES")]
        config: PathBuf,
    },
    /// Validate the route table and compile every template
    Check {
        /// Route-table file (YAML or TOML)
        #[arg(short, long, env = "TRAILHEAD_ROUTES")]
        config: PathBuf,
    },
    /// Show the route selected for a request, without invoking a handler
    Match {
        /// Route-table file (YAML or TOML)
        #[arg(short, long, env = "TRAILHEAD_ROUTES")]
        config: PathBuf,

        /// Request method (case-insensitive)
        method: String,

        /// Request path, optionally with a query string
        path: String,
    },
    /// Build the URL of a named route
    Url {
        /// Route-table file (YAML or TOML)
        #[arg(short, long, env = "TRAILHEAD_ROUTES")]
        config: PathBuf,

        /// Route name
        name: String,

        /// Capture values as `name=value` (anonymous captures by position: `0=value`)
        #[arg(value_parser = parse_pair)]
        params: Vec<(String, String)>,

        /// Prefix for the generated path
        #[arg(long, default_value = "")]
        root: String,

        /// Query parameter as `key=value`; repeatable
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
}

/// Parse `key=value`. The value may itself contain `=`.
pub(crate) fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

fn load_router(path: &Path) -> anyhow::Result<(RoutesConfig, Router)> {
    let table = config::load_config(path)?;
    let router = table
        .build_router()
        .with_context(|| format!("cannot build router from '{}'", path.display()))?;
    Ok((table, router))
}

fn describe(route: &Route) -> String {
    let methods: Vec<&str> = route.methods().iter().map(|m| m.as_str()).collect();
    let mut line = format!(
        "{:<14} {:<36} {:<20} {}",
        methods.join("|"),
        route.template(),
        route.display_name().unwrap_or("-"),
        route.target()
    );
    if let Some(namespace) = route.namespace_prefix() {
        line.push_str(&format!(" ns={namespace}"));
    }
    if !route.middleware_entries().is_empty() {
        let names: Vec<String> = route.middleware_entries().iter().map(ToString::to_string).collect();
        line.push_str(&format!(" mw=[{}]", names.join(",")));
    }
    line
}

/// Execute a parsed command, writing its report to `out`.
///
/// # Errors
///
/// Load, validation and routing failures; `match` with no matching route
/// and `url` with an unknown route name are errors too.
pub fn run_cli(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match cli.command {
        Commands::Routes { config } => {
            let (_, router) = load_router(&config)?;
            writeln!(out, "{:<4} {:<14} {:<36} {:<20} TARGET", "#", "METHODS", "TEMPLATE", "NAME")?;
            for (index, route) in router.routes().iter().enumerate() {
                writeln!(out, "{index:<4} {}", describe(route))?;
            }
            Ok(())
        }
        Commands::Check { config } => {
            let (table, router) = load_router(&config)?;
            let failures = router.compile_all();
            if let Some((index, err)) = failures.into_iter().next() {
                bail!("route #{index} does not compile: {err}");
            }
            writeln!(
                out,
                "ok: {} route(s), {} match type(s), binding {:?}",
                router.len(),
                table.match_types.len(),
                table.binding
            )?;
            Ok(())
        }
        Commands::Match {
            config,
            method,
            path,
        } => {
            let (_, router) = load_router(&config)?;
            let method = parse_method(&method)?;
            let req = Request::new(method.clone(), &path);
            let found = router
                .find(&req)
                .ok_or_else(|| anyhow!("no route matches {method} {}", req.path))?;
            writeln!(out, "#{} {}", found.index, describe(found.route))?;
            for (key, value) in found.captures.iter() {
                writeln!(out, "  {key} = {value}")?;
            }
            Ok(())
        }
        Commands::Url {
            config,
            name,
            params,
            root,
            query,
        } => {
            let (_, router) = load_router(&config)?;
            let url = router.build_uri(&name, params.as_slice(), &root, query.as_slice())?;
            writeln!(out, "{url}")?;
            Ok(())
        }
    }
}
