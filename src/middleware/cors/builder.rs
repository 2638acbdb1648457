use std::sync::Arc;

use http::Method;
use regex::Regex;

use super::{default_methods, CorsConfigError, CorsMiddleware, OriginValidation};

/// Builder for [`CorsMiddleware`] that validates the configuration.
pub struct CorsMiddlewareBuilder {
    allowed_origins: Vec<String>,
    origin_patterns: Vec<String>,
    validator: Option<Arc<dyn Fn(&str) -> bool + Send + Sync>>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    max_age: Option<u32>,
}

impl CorsMiddlewareBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_origins: vec![],
            origin_patterns: vec![],
            validator: None,
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: default_methods(),
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }

    /// Exact origins; `"*"` allows every origin.
    #[must_use]
    pub fn allowed_origins(mut self, origins: &[&str]) -> Self {
        self.allowed_origins = origins.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Regular expressions an origin must match. Takes precedence over
    /// exact origins.
    #[must_use]
    pub fn origin_patterns(mut self, patterns: &[&str]) -> Self {
        self.origin_patterns = patterns.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Custom origin check. Takes precedence over patterns and exact origins.
    #[must_use]
    pub fn origin_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    #[must_use]
    pub fn allowed_methods(mut self, methods: &[Method]) -> Self {
        self.allowed_methods = methods.to_vec();
        self
    }

    #[must_use]
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.allowed_headers = headers.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    #[must_use]
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.expose_headers = headers.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// # Errors
    ///
    /// Fails on wildcard origins combined with credentials and on origin
    /// patterns that do not compile.
    pub fn build(self) -> Result<CorsMiddleware, CorsConfigError> {
        let origin_validation = if let Some(validator) = self.validator {
            OriginValidation::Custom(validator)
        } else if !self.origin_patterns.is_empty() {
            let patterns = self
                .origin_patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| CorsConfigError::InvalidOriginPattern {
                        pattern: p.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            OriginValidation::Regex(patterns)
        } else if self.allowed_origins.iter().any(|o| o == "*") {
            OriginValidation::Wildcard
        } else {
            OriginValidation::Exact(self.allowed_origins)
        };

        if self.allow_credentials && origin_validation.is_wildcard() {
            return Err(CorsConfigError::WildcardWithCredentials);
        }

        Ok(CorsMiddleware {
            origin_validation,
            allowed_headers: self.allowed_headers,
            allowed_methods: self.allowed_methods,
            allow_credentials: self.allow_credentials,
            expose_headers: self.expose_headers,
            max_age: self.max_age,
        })
    }
}

impl Default for CorsMiddlewareBuilder {
    fn default() -> Self {
        Self::new()
    }
}
