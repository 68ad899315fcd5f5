use std::sync::Arc;

use crate::sampler::random::RandomSampler;
use crate::sampler::{RelativeSampler, Sampler};
use crate::storage::{MemoryStorage, Storage};
use crate::types::Direction;

use super::Study;

/// A builder for constructing [`Study`] instances with a fluent API.
///
/// Created via [`Study::builder()`].
///
/// # Defaults
///
/// - Direction: [`Minimize`](Direction::Minimize)
/// - Sampler: [`RandomSampler`]
/// - Relative sampler: none
/// - Storage: [`MemoryStorage`]
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::prelude::*;
///
/// let study = Study::builder()
///     .minimize()
///     .relative_sampler(BayesOptSampler::with_seed(3))
///     .storage(MemoryStorage::new())
///     .build();
///
/// assert_eq!(study.direction(), Direction::Minimize);
/// ```
pub struct StudyBuilder {
    direction: Direction,
    sampler: Option<Box<dyn Sampler>>,
    relative_sampler: Option<Box<dyn RelativeSampler>>,
    storage: Option<Box<dyn Storage>>,
}

impl StudyBuilder {
    /// Create a new builder with default settings.
    pub(super) fn new() -> Self {
        Self {
            direction: Direction::Minimize,
            sampler: None,
            relative_sampler: None,
            storage: None,
        }
    }

    /// Set the optimization direction to minimize (the default).
    #[must_use]
    pub fn minimize(mut self) -> Self {
        self.direction = Direction::Minimize;
        self
    }

    /// Set the optimization direction to maximize.
    #[must_use]
    pub fn maximize(mut self) -> Self {
        self.direction = Direction::Maximize;
        self
    }

    /// Set the optimization direction explicitly.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the independent sampler.
    ///
    /// Defaults to [`RandomSampler`] if not specified.
    #[must_use]
    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Set the relative sampler used for the intersection search space.
    #[must_use]
    pub fn relative_sampler(mut self, sampler: impl RelativeSampler + 'static) -> Self {
        self.relative_sampler = Some(Box::new(sampler));
        self
    }

    /// Set a custom storage backend.
    ///
    /// Defaults to [`MemoryStorage`] if not specified.
    #[must_use]
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Build the [`Study`] with the configured options.
    #[must_use]
    pub fn build(self) -> Study {
        let sampler = self
            .sampler
            .unwrap_or_else(|| Box::new(RandomSampler::new()));
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));

        Study {
            direction: self.direction,
            sampler: Arc::from(sampler),
            relative_sampler: self.relative_sampler.map(Arc::from),
            storage: Arc::from(storage),
        }
    }
}
