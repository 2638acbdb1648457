use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::compiler::{compile, CompiledPattern};
use super::match_types::MatchTypes;
use crate::error::RouteError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    template: String,
    filters: Vec<(String, String)>,
    registry: u64,
    generation: u64,
}

/// Concurrent cache of compiled patterns.
///
/// Keyed by template, filter overrides and the registry generation the
/// pattern was compiled against, so registering a match type never hands
/// out a stale artefact for new compilations while existing `Arc`s stay
/// valid.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: DashMap<CacheKey, Arc<CompiledPattern>>,
}

impl PatternCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached pattern for `template`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Propagates [`RouteError::Compile`] from the compiler; failures are
    /// not cached.
    pub fn get_or_compile(
        &self,
        template: &str,
        types: &MatchTypes,
        filters: &[(String, String)],
    ) -> Result<Arc<CompiledPattern>, RouteError> {
        let snapshot = types.snapshot();
        let mut sorted = filters.to_vec();
        sorted.sort();
        let key = CacheKey {
            template: template.to_string(),
            filters: sorted,
            registry: snapshot.registry_id(),
            generation: snapshot.generation(),
        };

        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let compiled = Arc::new(compile(template, &snapshot, filters)?);
        // The shard guard must be released before `len()` locks every shard.
        let cached = Arc::clone(self.entries.entry(key).or_insert(compiled).value());
        debug!(template = %template, cached = self.entries.len(), "Pattern cached");
        Ok(cached)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
