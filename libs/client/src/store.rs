//! Versioned in-memory snapshot of the server collections
//!
//! The client-side store is replaced wholesale on each reconciliation.
//! Each replacement bumps a generation counter so in-flight readers can
//! detect that the snapshot they hold is stale.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use common::models::{Asset, Assignment, User};

/// Immutable snapshot of the three server collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Monotonic counter, bumped on every replacement
    pub generation: u64,
    pub users: Vec<User>,
    pub assets: Vec<Asset>,
    pub assignments: Vec<Assignment>,
}

impl Store {
    /// The default empty snapshot an application starts with
    pub fn empty() -> Self {
        Store {
            generation: 0,
            users: Vec::new(),
            assets: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

/// Holder of the current snapshot, swapped atomically on reconciliation
#[derive(Debug)]
pub struct SnapshotCell {
    inner: RwLock<Arc<Store>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(Store::empty())),
        }
    }

    /// The current snapshot; cheap to clone, safe to hold across awaits
    pub fn current(&self) -> Arc<Store> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Install a new snapshot with a bumped generation, returning it
    pub fn replace(
        &self,
        users: Vec<User>,
        assets: Vec<Asset>,
        assignments: Vec<Assignment>,
    ) -> Arc<Store> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let next = Arc::new(Store {
            generation: guard.generation + 1,
            users,
            assets,
            assignments,
        });
        *guard = Arc::clone(&next);
        next
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}
