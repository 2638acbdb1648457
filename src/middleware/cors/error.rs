use std::fmt;

/// CORS configuration error
///
/// Returned by `CorsMiddlewareBuilder::build()` when the configuration
/// would be rejected by browsers or cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// Wildcard origin (`*`) cannot be used with credentials
    WildcardWithCredentials,
    /// An origin pattern is not a valid regular expression
    InvalidOriginPattern {
        pattern: String,
        reason: String,
    },
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::WildcardWithCredentials => f.write_str(
                "invalid CORS configuration: a wildcard origin cannot be combined with credentials",
            ),
            CorsConfigError::InvalidOriginPattern { pattern, reason } => write!(
                f,
                "invalid CORS configuration: origin pattern '{pattern}' does not compile: {reason}"
            ),
        }
    }
}

impl std::error::Error for CorsConfigError {}
