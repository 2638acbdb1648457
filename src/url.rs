//! Reverse routing.
//!
//! Rebuilds a URL from a compiled pattern's tokens and a set of parameter
//! values. Values are inserted verbatim (no percent-encoding) so that a path
//! captured by a route rebuilds to the same path; only the query string is
//! encoded.

use std::collections::{BTreeMap, HashMap};

use crate::pattern::{CompiledPattern, Captures, Token};

/// Source of capture values for [`build_uri`].
///
/// Named captures are looked up with [`ParamSource::by_name`], anonymous
/// ones with [`ParamSource::by_position`] using the capture's ordinal in the
/// template. For maps and pair lists the ordinal is looked up as a decimal
/// key, so `"0"` addresses the first capture.
pub trait ParamSource {
    fn by_name(&self, name: &str) -> Option<&str>;

    fn by_position(&self, index: usize) -> Option<&str> {
        self.by_name(&index.to_string())
    }
}

impl ParamSource for Captures {
    fn by_name(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    fn by_position(&self, index: usize) -> Option<&str> {
        self.get_position(index)
    }
}

impl ParamSource for HashMap<String, String> {
    fn by_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ParamSource for BTreeMap<String, String> {
    fn by_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> ParamSource for [(K, V)] {
    fn by_name(&self, name: &str) -> Option<&str> {
        self.iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_ref())
    }
}

impl<K: AsRef<str>, V: AsRef<str>> ParamSource for Vec<(K, V)> {
    fn by_name(&self, name: &str) -> Option<&str> {
        self.as_slice().by_name(name)
    }
}

/// Build a URL for `pattern`.
///
/// For each capture the value from `params` is substituted. A missing
/// optional capture emits nothing, its separator included; a missing
/// required capture emits its raw placeholder (e.g. `{id:INT}`). `root` is
/// prepended and a non-empty `query` is appended percent-encoded.
pub fn build_uri<P, K, V>(
    pattern: &CompiledPattern,
    params: &P,
    root: &str,
    query: &[(K, V)],
) -> String
where
    P: ParamSource + ?Sized,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut path = String::with_capacity(pattern.template().len() + 16);
    for token in pattern.tokens() {
        match token {
            Token::Literal(text) => path.push_str(text),
            Token::Capture(capture) => {
                let value = match &capture.name {
                    Some(name) => params.by_name(name),
                    None => params.by_position(capture.index),
                };
                match value {
                    Some(value) => {
                        if let Some(sep) = capture.separator {
                            path.push(sep);
                        }
                        path.push_str(value);
                    }
                    None if capture.optional => {}
                    None => path.push_str(&capture.raw),
                }
            }
        }
    }

    let root = root.trim_end_matches('/');
    let mut uri = if root.is_empty() {
        path
    } else if path.starts_with('/') || path.is_empty() {
        format!("{root}{path}")
    } else {
        format!("{root}/{path}")
    };

    if !query.is_empty() {
        let encoded: Vec<String> = query
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    urlencoding::encode(k.as_ref()),
                    urlencoding::encode(v.as_ref())
                )
            })
            .collect();
        uri.push('?');
        uri.push_str(&encoded.join("&"));
    }
    uri
}
