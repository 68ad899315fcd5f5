use core::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::Storage;
use crate::error::Result;
use crate::trial::FrozenTrial;

/// In-memory trial storage (the default).
///
/// Trials live in a `Vec` behind a read-write lock; reads clone it.
pub struct MemoryStorage {
    trials: RwLock<Vec<FrozenTrial>>,
    next_id: AtomicU64,
}

impl MemoryStorage {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trials: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Creates an in-memory store pre-populated with `trials`.
    ///
    /// The ID counter continues after the largest ID present.
    #[must_use]
    pub fn with_trials(trials: Vec<FrozenTrial>) -> Self {
        let next_id = trials.iter().map(|t| t.id).max().map_or(0, |id| id + 1);
        Self {
            trials: RwLock::new(trials),
            next_id: AtomicU64::new(next_id),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn push(&self, trial: FrozenTrial) -> Result<()> {
        self.trials.write().push(trial);
        Ok(())
    }

    fn trials(&self) -> Result<Vec<FrozenTrial>> {
        Ok(self.trials.read().clone())
    }

    fn next_trial_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}
