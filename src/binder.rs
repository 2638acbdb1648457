//! Argument binding.
//!
//! Maps the values gathered for a dispatch (captures, then extra positional
//! arguments) onto the formal parameters declared by a handler's
//! [`Signature`]. For each parameter, in order:
//!
//! 1. the bag entry with the same name;
//! 2. the parameter's declared default;
//! 3. the bag entry at the parameter's ordinal position;
//! 4. otherwise the parameter is unmatched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::error::RouteError;
use crate::handler::Signature;

/// What to do when some parameters stay unmatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingPolicy {
    /// Fail the dispatch with [`RouteError::Binding`]
    #[default]
    Strict,
    /// Drop the mapping and pass every bag value verbatim
    PassThrough,
}

/// Ordered, optionally named argument values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentBag {
    entries: Vec<(Option<Arc<str>>, Value)>,
}

impl ArgumentBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Option<Arc<str>>, value: Value) {
        self.entries.push((name, value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_deref() == Some(name))
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, value)| value)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map `bag` onto `signature`.
///
/// Returns the positional argument list on success, or the names of the
/// parameters left unmatched.
pub fn resolve(signature: &Signature, bag: &ArgumentBag) -> Result<Vec<Value>, Vec<String>> {
    let mut args = Vec::with_capacity(signature.len());
    let mut unmatched = Vec::new();

    for (index, param) in signature.params().iter().enumerate() {
        let value = bag
            .get(&param.name)
            .or(param.default.as_ref())
            .or_else(|| bag.get_index(index));
        match value {
            Some(value) => args.push(value.clone()),
            None => unmatched.push(param.name.clone()),
        }
    }

    if unmatched.is_empty() {
        Ok(args)
    } else {
        Err(unmatched)
    }
}

/// Bind `bag` for the handler named `handler` under `policy`.
///
/// # Errors
///
/// Under [`BindingPolicy::Strict`], returns [`RouteError::Binding`] listing
/// every unmatched parameter.
pub fn bind(
    handler: &str,
    signature: &Signature,
    bag: ArgumentBag,
    policy: BindingPolicy,
) -> Result<Vec<Value>, RouteError> {
    match resolve(signature, &bag) {
        Ok(args) => Ok(args),
        Err(unmatched) => match policy {
            BindingPolicy::Strict => Err(RouteError::Binding {
                handler: handler.to_string(),
                unmatched,
            }),
            BindingPolicy::PassThrough => {
                warn!(
                    handler = %handler,
                    unmatched = ?unmatched,
                    passed = bag.len(),
                    "Binding fallback: passing argument bag verbatim"
                );
                Ok(bag.into_values())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn bag(entries: &[(Option<&str>, Value)]) -> ArgumentBag {
        let mut bag = ArgumentBag::new();
        for (name, value) in entries {
            bag.push(name.map(Arc::from), value.clone());
        }
        bag
    }

    #[test]
    fn test_named_entry_wins_over_position() {
        let sig = Signature::new().param("page").param("id");
        let args = resolve(&sig, &bag(&[(Some("id"), json!("7")), (Some("page"), json!("2"))]));
        assert_eq!(args.unwrap(), vec![json!("2"), json!("7")]);
    }

    #[test]
    fn test_default_is_used_before_position() {
        let sig = Signature::new()
            .param("id")
            .param_with_default("format", json!("json"));
        let args = resolve(&sig, &bag(&[(Some("id"), json!("1")), (None, json!("xml"))]));
        assert_eq!(args.unwrap(), vec![json!("1"), json!("json")]);
    }

    #[test]
    fn test_positional_fallback_by_ordinal() {
        let sig = Signature::new().param("a").param("b");
        let args = resolve(&sig, &bag(&[(None, json!(1)), (None, json!(2))]));
        assert_eq!(args.unwrap(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_strict_policy_reports_unmatched() {
        let sig = Signature::new().param("a").param("b").param("c");
        let err = bind("h", &sig, bag(&[(None, json!(1))]), BindingPolicy::Strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BindingFallback);
        match err {
            RouteError::Binding { unmatched, .. } => assert_eq!(unmatched, vec!["b", "c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pass_through_policy_forwards_bag() {
        let sig = Signature::new().param("missing");
        let args = bind(
            "h",
            &sig,
            bag(&[(Some("x"), json!("1")), (None, json!(true))]),
            BindingPolicy::PassThrough,
        )
        .unwrap();
        assert_eq!(args, vec![json!("1"), json!(true)]);
    }

    #[test]
    fn test_empty_signature_binds_to_nothing() {
        let args = bind("h", &Signature::new(), bag(&[(None, json!(1))]), BindingPolicy::Strict);
        assert!(args.unwrap().is_empty());
    }
}
