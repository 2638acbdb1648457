use anyhow::{bail, Context};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::schema::{parse_method, RoutesConfig};
use crate::handler::HandlerRef;
use crate::pattern::{self, MatchTypes};

/// Serialisation of a route-table file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` or `.toml`; anything else is `None`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Where it occurred (e.g. `routes[2] (users.show)`, `match_types.SLUG`)
    pub location: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Every problem found in one route-table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub path: PathBuf,
    pub issues: Vec<ConfigIssue>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid route table '{}': {} problem(s)",
            self.path.display(),
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// Deserialise a route table without validating it.
///
/// # Errors
///
/// Returns the parser error for malformed input.
pub fn parse_config(content: &str, format: ConfigFormat) -> anyhow::Result<RoutesConfig> {
    let config: RoutesConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).context("failed to parse YAML route table")?,
        ConfigFormat::Toml => toml::from_str(content).context("failed to parse TOML route table")?,
    };
    Ok(config)
}

/// Check a route table and return every problem found.
///
/// Covers method tokens, handler strings, match-type rules, route name
/// uniqueness and template compilation (with the file's own match types and
/// each route's filters).
#[must_use]
pub fn validate(config: &RoutesConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    for (i, token) in config.default_methods.iter().enumerate() {
        if let Err(e) = parse_method(token) {
            issues.push(ConfigIssue::new(format!("default_methods[{i}]"), e.to_string()));
        }
    }

    for (i, name) in config.middleware.iter().enumerate() {
        if name.trim().is_empty() {
            issues.push(ConfigIssue::new(format!("middleware[{i}]"), "empty middleware name"));
        }
    }

    let types = MatchTypes::with_builtins();
    for (tag, rule) in &config.match_types {
        if let Err(e) = types.register(tag, rule) {
            issues.push(ConfigIssue::new(format!("match_types.{tag}"), e.to_string()));
        }
    }
    let snapshot = types.snapshot();

    let mut names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let location = match &route.name {
            Some(name) => format!("routes[{i}] ({name})"),
            None => format!("routes[{i}]"),
        };

        if let Some(name) = &route.name {
            if name.trim().is_empty() {
                issues.push(ConfigIssue::new(&location, "route name is empty"));
            } else if !names.insert(name.as_str()) {
                issues.push(ConfigIssue::new(&location, format!("duplicate route name '{name}'")));
            }
        }

        for token in &route.methods {
            if let Err(e) = parse_method(token) {
                issues.push(ConfigIssue::new(&location, e.to_string()));
            }
        }

        if HandlerRef::parse(&route.handler).is_none() {
            issues.push(ConfigIssue::new(
                &location,
                format!("handler '{}' must be Controller@action", route.handler),
            ));
        }

        for (i, name) in route.middleware.iter().enumerate() {
            if name.trim().is_empty() {
                issues.push(ConfigIssue::new(&location, format!("middleware[{i}] is empty")));
            }
        }

        if let Err(e) = pattern::compile(&route.path, &snapshot, &route.filter_pairs()) {
            issues.push(ConfigIssue::new(&location, e.to_string()));
        }
    }

    issues
}

/// Read, parse and validate a route-table file.
///
/// # Errors
///
/// I/O and parse failures are returned with the file path as context.
/// Validation failures are a [`ConfigError`] listing every problem.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<RoutesConfig> {
    let path = path.as_ref();
    let Some(format) = ConfigFormat::from_path(path) else {
        bail!(
            "unsupported route table extension for '{}' (expected .yaml, .yml or .toml)",
            path.display()
        );
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route table '{}'", path.display()))?;
    let config = parse_config(&content, format)
        .with_context(|| format!("in route table '{}'", path.display()))?;

    let issues = validate(&config);
    if !issues.is_empty() {
        debug!(path = %path.display(), issues = issues.len(), "Route table rejected");
        return Err(ConfigError {
            path: path.to_path_buf(),
            issues,
        }
        .into());
    }

    info!(
        path = %path.display(),
        routes = config.routes.len(),
        match_types = config.match_types.len(),
        "Route table loaded"
    );
    Ok(config)
}
