//! Registry of named match types.
//!
//! A match type maps a tag used in templates (`{id:INT}`) to the regular
//! expression fragment the capture must satisfy. The registry is read on
//! every compilation and written rarely, so reads go through an `ArcSwap`
//! snapshot and writes replace the whole snapshot.

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::error::RouteError;

/// Tag of the rule used when a capture names no type or an unknown one.
pub const DEFAULT_TAG: &str = "";

/// Built-in rules: integer, hex, generic token, lazy and greedy wildcards,
/// and the default (anything up to a path, query or fragment separator).
const BUILTINS: &[(&str, &str)] = &[
    ("INT", "[0-9]+"),
    ("HEX", "[0-9A-Fa-f]+"),
    ("STR", "[0-9A-Za-z_-]+"),
    ("*", ".+?"),
    ("**", ".+"),
    (DEFAULT_TAG, "[^/?#]+"),
];

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

static GLOBAL: Lazy<Arc<MatchTypes>> = Lazy::new(|| Arc::new(MatchTypes::with_builtins()));

/// Immutable view of the registry at one point in time.
#[derive(Debug, Clone)]
pub struct MatchTypeSnapshot {
    registry_id: u64,
    generation: u64,
    rules: HashMap<String, Arc<str>>,
}

impl MatchTypeSnapshot {
    /// Rule for `tag`, looked up case-insensitively.
    ///
    /// Unknown tags resolve to the default rule.
    #[must_use]
    pub fn rule_for(&self, tag: &str) -> &str {
        self.rules
            .get(tag.to_ascii_uppercase().as_str())
            .or_else(|| self.rules.get(DEFAULT_TAG))
            .map(|rule| rule.as_ref())
            .unwrap_or(BUILTINS[BUILTINS.len() - 1].1)
    }

    /// Whether `tag` has a rule of its own.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.rules.contains_key(tag.to_ascii_uppercase().as_str())
    }

    /// Incremented by every registration; part of the pattern cache key.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub(crate) fn registry_id(&self) -> u64 {
        self.registry_id
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

/// Shared, runtime-extensible registry of match types.
///
/// Registering a type never changes patterns that were already compiled:
/// compiled patterns hold the rule text they were built with.
#[derive(Debug)]
pub struct MatchTypes {
    current: ArcSwap<MatchTypeSnapshot>,
}

impl Default for MatchTypes {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl MatchTypes {
    /// A fresh registry holding only the built-in types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let rules = BUILTINS
            .iter()
            .map(|(tag, rule)| ((*tag).to_string(), Arc::from(*rule)))
            .collect();
        Self {
            current: ArcSwap::from_pointee(MatchTypeSnapshot {
                registry_id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
                generation: 0,
                rules,
            }),
        }
    }

    /// Process-wide registry used by routers that are not given their own.
    #[must_use]
    pub fn global() -> Arc<MatchTypes> {
        Arc::clone(&GLOBAL)
    }

    /// Current snapshot. Cheap; holds the registry state stable for the
    /// duration of one compilation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<MatchTypeSnapshot> {
        self.current.load_full()
    }

    /// Register (or replace) the rule for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Compile`] if the tag contains template syntax
    /// (`{`, `}`, `:`, `?`) or the rule is not a valid regular expression.
    pub fn register(&self, tag: &str, rule: &str) -> Result<(), RouteError> {
        if let Some(pos) = tag.find(['{', '}', ':', '?']) {
            return Err(RouteError::compile(
                tag,
                Some(pos),
                "match type tags cannot contain '{', '}', ':' or '?'",
            ));
        }
        Regex::new(&format!("^(?:{rule})$"))
            .map_err(|e| RouteError::compile(rule, None, e.to_string()))?;

        let tag = tag.to_ascii_uppercase();
        let rule: Arc<str> = Arc::from(rule);
        let previous = self.current.rcu(|current| {
            let mut next = MatchTypeSnapshot::clone(current);
            next.generation += 1;
            next.rules.insert(tag.clone(), Arc::clone(&rule));
            next
        });

        info!(
            tag = %tag,
            rule = %rule,
            generation = previous.generation + 1,
            "Match type registered"
        );
        Ok(())
    }
}
