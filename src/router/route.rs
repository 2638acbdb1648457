use http::Method;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use super::hooks::Hooks;
use crate::context::DispatchContext;
use crate::error::RouteError;
use crate::handler::Target;
use crate::http::Response;
use crate::middleware::MiddlewareEntry;
use crate::pattern::{CompiledPattern, MatchTypes, PatternCache};

/// A registered route: template, accepted methods and target, plus its
/// middleware, filter overrides and lifecycle hooks.
///
/// The template is compiled on first use and the result kept until the
/// filters change. A route never stores per-request data; captures live in
/// the [`DispatchContext`].
pub struct Route {
    name: Option<String>,
    template: String,
    methods: Vec<Method>,
    target: Target,
    namespace: Option<String>,
    middleware: Vec<MiddlewareEntry>,
    filters: Vec<(String, String)>,
    hooks: Hooks,
    compiled: OnceCell<Arc<CompiledPattern>>,
    types: Arc<MatchTypes>,
    cache: Arc<PatternCache>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("methods", &self.methods)
            .field("target", &self.target)
            .field("namespace", &self.namespace)
            .field("middleware", &self.middleware)
            .field("filters", &self.filters)
            .field("hooks", &self.hooks)
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}

impl Route {
    pub(crate) fn new(
        methods: Vec<Method>,
        template: &str,
        target: Target,
        types: Arc<MatchTypes>,
        cache: Arc<PatternCache>,
    ) -> Self {
        Self {
            name: None,
            template: template.to_string(),
            methods,
            target,
            namespace: None,
            middleware: Vec::new(),
            filters: Vec::new(),
            hooks: Hooks::default(),
            compiled: OnceCell::new(),
            types,
            cache,
        }
    }

    // Fluent configuration

    /// Set the display name used for reverse routing.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the namespace prefixed to named targets during resolution.
    pub fn namespace(&mut self, namespace: &str) -> &mut Self {
        self.namespace = Some(namespace.to_string()).filter(|ns| !ns.is_empty());
        self
    }

    /// Append middleware; an entry already present is not added twice.
    pub fn middleware(&mut self, entry: impl Into<MiddlewareEntry>) -> &mut Self {
        let entry = entry.into();
        if !self.middleware.iter().any(|e| e.same_as(&entry)) {
            self.middleware.push(entry);
        }
        self
    }

    /// Override the rule of the named capture `name`. Discards any compiled
    /// pattern so the next match recompiles with the new rule.
    pub fn filter(&mut self, name: &str, rule: &str) -> &mut Self {
        match self.filters.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = rule.to_string(),
            None => self.filters.push((name.to_string(), rule.to_string())),
        }
        self.compiled = OnceCell::new();
        self
    }

    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Route, &mut DispatchContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.push_before(Arc::new(hook));
        self
    }

    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Route, &mut DispatchContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.push_after(Arc::new(hook));
        self
    }

    /// Push an error hook. Hooks pushed later run earlier.
    pub fn on_error<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Route, &mut DispatchContext, &RouteError) -> anyhow::Result<Option<Response>>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.push_error(Arc::new(hook));
        self
    }

    // Accessors

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub fn namespace_prefix(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn middleware_entries(&self) -> &[MiddlewareEntry] {
        &self.middleware
    }

    #[must_use]
    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    #[must_use]
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Whether `method` is accepted. Comparison ignores case.
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods
            .iter()
            .any(|m| m.as_str().eq_ignore_ascii_case(method.as_str()))
    }

    /// The compiled pattern, compiling the template on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Compile`] when the template (with this route's
    /// filters) does not compile. Failures are not memoised.
    pub fn pattern(&self) -> Result<&Arc<CompiledPattern>, RouteError> {
        self.compiled.get_or_try_init(|| {
            self.cache
                .get_or_compile(&self.template, &self.types, &self.filters)
        })
    }
}
