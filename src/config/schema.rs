use anyhow::{anyhow, Context};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::binder::BindingPolicy;
use crate::dispatcher::DispatcherOptions;
use crate::handler::HandlerRef;
use crate::http::METHOD_OVERRIDE_HEADER;
use crate::middleware::MiddlewareEntry;
use crate::pattern::MatchTypes;
use crate::router::{RouteOptions, Router, RouterOptions};

/// A route table as written in a YAML or TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Methods for routes that list none; empty keeps `GET` and `POST`
    pub default_methods: Vec<String>,
    /// Header carrying a method override. `null` or an empty string disables
    /// overriding.
    pub method_override_header: Option<String>,
    pub binding: BindingPolicy,
    /// Extra match types, tag to regex rule
    pub match_types: BTreeMap<String, String>,
    /// Router-wide middleware names
    pub middleware: Vec<String>,
    pub routes: Vec<RouteConfig>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            default_methods: Vec::new(),
            method_override_header: Some(METHOD_OVERRIDE_HEADER.to_string()),
            binding: BindingPolicy::default(),
            match_types: BTreeMap::new(),
            middleware: Vec::new(),
            routes: Vec::new(),
        }
    }
}

/// One entry of `routes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    pub path: String,
    /// `Controller@action`
    pub handler: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<String>,
    /// Per-capture regex overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl RouteConfig {
    /// `name` when set, otherwise the template.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }

    pub(crate) fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|(name, rule)| (name.clone(), rule.clone()))
            .collect()
    }
}

/// Parse a method token the way the router compares them: upper-cased.
pub(crate) fn parse_method(token: &str) -> anyhow::Result<Method> {
    let token = token.trim();
    if token.is_empty() {
        return Err(anyhow!("empty method"));
    }
    Method::from_bytes(token.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("'{token}' is not a valid method token"))
}

pub(crate) fn parse_methods(tokens: &[String]) -> anyhow::Result<Vec<Method>> {
    tokens.iter().map(|t| parse_method(t)).collect()
}

impl RoutesConfig {
    /// Router options described by this file.
    ///
    /// # Errors
    ///
    /// Fails when `default_methods` holds an invalid token.
    pub fn router_options(&self) -> anyhow::Result<RouterOptions> {
        let mut options = RouterOptions::default();
        if !self.default_methods.is_empty() {
            options.default_methods =
                parse_methods(&self.default_methods).context("invalid default_methods")?;
        }
        options.method_override_header = self
            .method_override_header
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        Ok(options)
    }

    /// Build a router with its own match-type registry.
    ///
    /// Templates are compiled lazily, so a file that skipped
    /// [`load_config`](super::load_config) validation may still hold broken
    /// templates; see [`Router::compile_all`].
    ///
    /// # Errors
    ///
    /// Fails on invalid methods, match types or handler strings.
    pub fn build_router(&self) -> anyhow::Result<Router> {
        let types = Arc::new(MatchTypes::with_builtins());
        for (tag, rule) in &self.match_types {
            types
                .register(tag, rule)
                .with_context(|| format!("invalid match type '{tag}'"))?;
        }

        let mut router = Router::with_match_types(types).with_options(self.router_options()?);
        for route in &self.routes {
            let methods = parse_methods(&route.methods)
                .with_context(|| format!("invalid methods for route '{}'", route.label()))?;
            let target = HandlerRef::parse(&route.handler).ok_or_else(|| {
                anyhow!(
                    "route '{}': handler '{}' must be Controller@action",
                    route.label(),
                    route.handler
                )
            })?;
            let options = RouteOptions {
                name: route.name.clone(),
                namespace: route.namespace.clone(),
                middleware: route
                    .middleware
                    .iter()
                    .map(|name| MiddlewareEntry::from(name.as_str()))
                    .collect(),
            };

            let registered = router.register_route(&methods, &route.path, target, options);
            for (name, rule) in &route.filters {
                registered.filter(name, rule);
            }
        }
        Ok(router)
    }

    /// Binding policy and router-wide middleware for the dispatcher.
    #[must_use]
    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            binding: self.binding,
            middleware: self.middleware.clone(),
        }
    }
}
