//! In-progress resolution tracking and cycle detection
//!
//! While a service is being constructed its reference key (`@id@`) is held
//! in the active map, tagged with a monotonically increasing build mark.
//! Re-entering a live id on the same call chain is a circular dependency.
//! The mark doubles as the disambiguator for ancestor-scoped pool keys.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{DIError, DIResult};

pub(crate) fn reference_key(id: &str) -> String {
    format!("@{id}@")
}

#[derive(Default)]
pub(crate) struct ResolutionTracker {
    active: RwLock<HashMap<String, u64>>,
    counter: AtomicU64,
}

impl ResolutionTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as in progress, returning its build mark; fails if the id
    /// is already live on this call chain
    pub(crate) fn enter(&self, id: &str) -> DIResult<u64> {
        let key = reference_key(id);
        let mut active = self.active.write();
        if active.contains_key(&key) {
            return Err(DIError::CircularDependency { id: id.to_string() });
        }
        let mark = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        active.insert(key, mark);
        Ok(mark)
    }

    /// Unmark `id`, on success and on failure alike
    pub(crate) fn leave(&self, id: &str) {
        self.active.write().remove(&reference_key(id));
    }

    /// The build mark of a live resolution, looked up by reference key
    pub(crate) fn active_mark(&self, key: &str) -> Option<u64> {
        self.active.read().get(key).copied()
    }

    /// True when no resolution is in flight
    pub(crate) fn is_idle(&self) -> bool {
        self.active.read().is_empty()
    }
}
