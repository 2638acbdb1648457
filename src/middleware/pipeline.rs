use std::fmt;
use std::sync::Arc;

use super::core::{MiddlewareEntry, MiddlewareFactory, Next, Terminal};
use crate::context::DispatchContext;
use crate::http::Response;

/// Ordered middleware chain with an optional factory for named entries.
///
/// Running the pipeline is a plain call-stack recursion: each middleware
/// receives a [`Next`] for the remaining entries, and the terminal stage runs
/// once the entries are exhausted.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    entries: Vec<MiddlewareEntry>,
    factory: Option<Arc<dyn MiddlewareFactory>>,
}

impl fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("entries", &self.entries)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

impl MiddlewarePipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn MiddlewareFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Append an entry unless an identical one is already queued.
    pub fn push(&mut self, entry: impl Into<MiddlewareEntry>) -> &mut Self {
        let entry = entry.into();
        if !self.entries.iter().any(|e| e.same_as(&entry)) {
            self.entries.push(entry);
        }
        self
    }

    /// Append every entry of `entries`, skipping duplicates.
    pub fn extend<'e>(&mut self, entries: impl IntoIterator<Item = &'e MiddlewareEntry>) -> &mut Self {
        for entry in entries {
            self.push(entry.clone());
        }
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[MiddlewareEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the chain, ending in `terminal` (or the context's response when
    /// there is none).
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a middleware or the terminal.
    pub fn run(
        &self,
        ctx: &mut DispatchContext,
        terminal: Option<Terminal<'_>>,
    ) -> anyhow::Result<Response> {
        Next::new(&self.entries, self.factory.as_deref(), terminal).run(ctx)
    }
}
