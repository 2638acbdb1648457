//! Typed handler registry.
//!
//! Named route targets (`Users@show`) are resolved here at dispatch time.
//! Keys are [`HandlerRef`]s whose controller is already qualified with the
//! route's namespace, e.g. `admin::Users` + `show`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::handler::{Handler, HandlerRef};

/// Map from qualified `controller@action` to handler.
///
/// Cloning is cheap; registration after cloning copies the table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<HashMap<HandlerRef, Arc<dyn Handler>>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `controller@action`, replacing any previous
    /// entry.
    pub fn register(&mut self, controller: &str, action: &str, handler: Arc<dyn Handler>) {
        let key = HandlerRef::new(controller, action);
        debug!(target_ref = %key, handler = handler.name(), "Handler registered");
        Arc::make_mut(&mut self.handlers).insert(key, handler);
    }

    #[must_use]
    pub fn resolve(&self, reference: &HandlerRef) -> Option<Arc<dyn Handler>> {
        self.handlers.get(reference).cloned()
    }

    #[must_use]
    pub fn contains(&self, reference: &HandlerRef) -> bool {
        self.handlers.contains_key(reference)
    }

    /// Registered references, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<&HandlerRef> = self.handlers.keys().collect();
        keys.sort();
        keys.into_iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
