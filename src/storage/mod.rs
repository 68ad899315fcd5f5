//! Trial storage backends.
//!
//! The [`Storage`] trait defines how trials are recorded and read back.
//! Every [`Study`](crate::Study) owns an `Arc<dyn Storage>`, so storage is
//! transparently shared across threads.
//!
//! Reads return an owned snapshot. Trials recorded after the snapshot was
//! taken do not show up in it, which gives a sampler a stable view of the
//! history for the duration of one call.
//!
//! # Implementing a custom backend
//!
//! Implement [`Storage`] to plug in your own backend (e.g. a database) and
//! inject it via the builder:
//!
//! ```
//! use bayesopt_sampler::prelude::*;
//!
//! let storage = MemoryStorage::new();
//! let study = Study::builder().minimize().storage(storage).build();
//! # assert_eq!(study.n_trials(), 0);
//! ```

use crate::error::Result;
use crate::trial::FrozenTrial;

mod memory;
pub use memory::MemoryStorage;

/// Trait for storing and retrieving trials.
///
/// Implementations must be `Send + Sync` because a study may be shared
/// across threads.
pub trait Storage: Send + Sync {
    /// Append a finished trial to the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if the trial cannot be written.
    fn push(&self, trial: FrozenTrial) -> Result<()>;

    /// Return a snapshot of every stored trial, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if the store cannot be read.
    fn trials(&self) -> Result<Vec<FrozenTrial>>;

    /// Atomically return the next unique trial ID.
    fn next_trial_id(&self) -> u64;
}
