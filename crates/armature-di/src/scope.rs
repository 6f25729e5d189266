//! Scope keys and the shared-instance pool
//!
//! Pool entries are keyed by (effective scope key, service id). The
//! effective key for an ancestor scope (`@ancestor@`) is suffixed with the
//! ancestor's in-flight build mark, so "shared within X" means shared within
//! one construction of X, not across all of them.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::definition::ServiceScope;
use crate::tracker::ResolutionTracker;
use crate::value::Instance;

/// Compute the pool key for a scope, given the currently live resolutions
pub(crate) fn effective_key(scope: &ServiceScope, tracker: &ResolutionTracker) -> String {
    let base = scope.key();
    match tracker.active_mark(&base) {
        Some(mark) => format!("{base}#{mark}"),
        None => base,
    }
}

#[derive(Default)]
pub(crate) struct InstancePool {
    entries: RwLock<HashMap<(String, String), Instance>>,
}

impl InstancePool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &str, id: &str) -> Option<Instance> {
        self.entries
            .read()
            .get(&(key.to_string(), id.to_string()))
            .cloned()
    }

    pub(crate) fn store(&self, key: String, id: &str, instance: Instance) {
        debug!(id, scope = %key, "pooled shared instance");
        self.entries.write().insert((key, id.to_string()), instance);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}
