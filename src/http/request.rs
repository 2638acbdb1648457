use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum number of query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation.
/// Most requests have ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Default header carrying a method override (e.g. `DELETE` tunnelled through `POST`).
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// Header used to correlate a dispatch with upstream logs.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Query parameter storage; names are `Arc<str>` so clones stay cheap.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Header storage; names keep their original case, lookups ignore it.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Inbound request as seen by the router.
#[derive(Debug, Clone)]
pub struct Request {
    /// Transport-level method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Decoded query string parameters
    pub query: ParamVec,
    /// Request headers
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl Request {
    /// Create a request for `path`, which may carry a `?query` suffix.
    /// A `#fragment` is dropped before the query is split off.
    ///
    /// Query pairs are percent-decoded; pairs that fail to decode are kept
    /// verbatim.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let uri = uri.split_once('#').map_or(uri, |(before, _)| before);
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (uri, ParamVec::new()),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Shorthand for a `POST` request.
    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Add a header, keeping any existing values.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: `?limit=10&limit=20` yields `20`.
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// The method used for route matching.
    ///
    /// When `override_header` is present and carries a valid method token it
    /// takes precedence over the transport method. Tokens are upper-cased, so
    /// `delete` and `DELETE` are the same method.
    #[must_use]
    pub fn effective_method(&self, override_header: Option<&str>) -> Method {
        override_header
            .and_then(|name| self.header(name))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| Method::from_bytes(value.to_ascii_uppercase().as_bytes()).ok())
            .unwrap_or_else(|| self.method.clone())
    }

    /// Convert query parameters to a HashMap
    /// Note: This allocates - use query_param() in hot paths
    #[must_use]
    pub fn query_map(&self) -> HashMap<String, String> {
        self.query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

fn parse_query(query: &str) -> ParamVec {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (Arc::from(decode(key).as_str()), decode(value))
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}
