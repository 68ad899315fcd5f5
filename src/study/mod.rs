//! Study implementation for managing optimization trials.

use core::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::sampler::random::RandomSampler;
use crate::sampler::{RelativeSampler, Sampler, TrialHistory};
use crate::search_space::intersection_search_space;
use crate::storage::{MemoryStorage, Storage};
use crate::trial::{FrozenTrial, Trial};
use crate::types::{Direction, TrialState};

mod builder;
mod optimize;

pub use builder::StudyBuilder;

/// A study manages the optimization process, tracking trials and their results.
///
/// Each new trial gets its parameters from two sources. If a
/// [`RelativeSampler`] is configured, it proposes values for the
/// *intersection search space*: the parameters every complete trial so far
/// has suggested with the same distribution. Everything else comes from the
/// independent [`Sampler`].
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::{Direction, Study};
///
/// let study = Study::new(Direction::Minimize);
/// assert_eq!(study.direction(), Direction::Minimize);
/// ```
pub struct Study {
    /// The optimization direction.
    pub(crate) direction: Direction,
    /// The independent sampler.
    pub(crate) sampler: Arc<dyn Sampler>,
    /// The optional relative sampler.
    pub(crate) relative_sampler: Option<Arc<dyn RelativeSampler>>,
    /// Trial storage backend (default: [`MemoryStorage`]).
    pub(crate) storage: Arc<dyn Storage>,
}

impl Study {
    /// Create a new study with the given optimization direction.
    ///
    /// Uses [`RandomSampler`] and no relative sampler.
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            sampler: Arc::new(RandomSampler::new()),
            relative_sampler: None,
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Return a [`StudyBuilder`] for constructing a study with a fluent API.
    ///
    /// # Examples
    ///
    /// ```
    /// use bayesopt_sampler::prelude::*;
    ///
    /// let study = Study::builder()
    ///     .maximize()
    ///     .sampler(RandomSampler::with_seed(1))
    ///     .relative_sampler(BayesOptSampler::with_seed(1))
    ///     .build();
    /// assert_eq!(study.direction(), Direction::Maximize);
    /// ```
    #[must_use]
    pub fn builder() -> StudyBuilder {
        StudyBuilder::new()
    }

    /// Return the optimization direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Request a new trial.
    ///
    /// When a relative sampler is configured and the intersection search
    /// space is not empty, the relative sampler runs here and its proposal
    /// is attached to the trial. If it fails, the failure is logged and the
    /// trial samples every parameter independently.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial history cannot be read.
    ///
    /// # Examples
    ///
    /// ```
    /// use bayesopt_sampler::{Direction, Study};
    ///
    /// let study = Study::new(Direction::Minimize);
    ///
    /// let mut trial = study.ask().unwrap();
    /// let x = trial.suggest_float("x", 0.0, 10.0).unwrap();
    /// study.tell(trial, Ok::<_, &str>(x * x)).unwrap();
    /// assert_eq!(study.n_trials(), 1);
    /// ```
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn ask(&self) -> Result<Trial> {
        let id = self.storage.next_trial_id();
        let history = Arc::new(self.storage.trials()?);
        let mut trial = Trial::with_sampler(id, Arc::clone(&self.sampler), Arc::clone(&history));

        if let Some(relative) = &self.relative_sampler {
            let search_space = intersection_search_space(&history);
            if !search_space.is_empty() {
                let frozen = FrozenTrial::new(id, TrialState::Running);
                match relative.sample_relative(self, &frozen, &search_space) {
                    Ok(params) => trial.set_relative(search_space, params),
                    Err(e) => {
                        trace_warn!(trial_id = id, error = %e, "relative sampling failed, using independent sampling");
                    }
                }
            }
        }

        Ok(trial)
    }

    /// Report the result of a trial obtained from [`ask()`](Self::ask).
    ///
    /// `Ok(value)` completes the trial. An `Err` whose type is
    /// [`Error::TrialPruned`] or [`TrialPruned`](crate::TrialPruned) prunes
    /// it; any other error marks it failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial cannot be stored.
    pub fn tell<E: ToString + 'static>(
        &self,
        trial: Trial,
        value: core::result::Result<f64, E>,
    ) -> Result<()> {
        match value {
            Ok(v) => self.complete_trial(trial, v),
            Err(e) if is_trial_pruned(&e) => self.prune_trial(trial),
            Err(e) => self.fail_trial(trial, e),
        }
    }

    /// Record a completed trial with its objective value.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial cannot be stored.
    pub fn complete_trial(&self, mut trial: Trial, value: f64) -> Result<()> {
        trial.set_state(TrialState::Complete);
        self.storage.push(trial.into_frozen(Some(value)))
    }

    /// Record a failed trial.
    ///
    /// Failed trials are kept in the history but never feed a sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial cannot be stored.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn fail_trial(&self, mut trial: Trial, error: impl ToString) -> Result<()> {
        trace_debug!(trial_id = trial.id(), error = %error.to_string(), "trial failed");
        trial.set_state(TrialState::Failed);
        self.storage.push(trial.into_frozen(None))
    }

    /// Record a pruned trial.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial cannot be stored.
    pub fn prune_trial(&self, mut trial: Trial) -> Result<()> {
        trial.set_state(TrialState::Pruned);
        self.storage.push(trial.into_frozen(None))
    }

    /// Return a snapshot of all trials, in every state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn trials(&self) -> Result<Vec<FrozenTrial>> {
        self.storage.trials()
    }

    /// Return the number of completed trials.
    ///
    /// Failed and pruned trials are not counted. Returns 0 if the store
    /// cannot be read.
    #[must_use]
    pub fn n_trials(&self) -> usize {
        self.storage.trials().map_or(0, |trials| {
            trials
                .iter()
                .filter(|t| t.state == TrialState::Complete)
                .count()
        })
    }

    /// Return the completed trial with the best objective value.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoCompletedTrials` if no trial has completed, or a
    /// storage error if the store cannot be read.
    pub fn best_trial(&self) -> Result<FrozenTrial> {
        let trials = self.storage.trials()?;
        let complete = trials
            .into_iter()
            .filter(|t| t.state == TrialState::Complete)
            .filter_map(|t| t.value.map(|v| (v, t)));

        let best = match self.direction {
            Direction::Minimize => complete.min_by(|(a, _), (b, _)| a.total_cmp(b)),
            Direction::Maximize => complete.max_by(|(a, _), (b, _)| a.total_cmp(b)),
        };
        best.map(|(_, t)| t).ok_or(Error::NoCompletedTrials)
    }

    /// Return the best objective value found so far.
    ///
    /// # Errors
    ///
    /// See [`best_trial`](Self::best_trial).
    pub fn best_value(&self) -> Result<f64> {
        self.best_trial()?.value.ok_or(Error::NoCompletedTrials)
    }

    /// Return the parameters of the best trial.
    ///
    /// # Errors
    ///
    /// See [`best_trial`](Self::best_trial).
    pub fn best_params(&self) -> Result<HashMap<String, ParamValue>> {
        self.best_trial().map(|t| t.params)
    }
}

impl TrialHistory for Study {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn trials(&self) -> Result<Vec<FrozenTrial>> {
        self.storage.trials()
    }
}

/// Returns `true` if the error represents a pruned trial.
///
/// Checks via `Any` downcasting whether `e` is `Error::TrialPruned` or
/// the standalone `TrialPruned` struct.
pub(super) fn is_trial_pruned<E: 'static>(e: &E) -> bool {
    let any: &dyn Any = e;
    if let Some(err) = any.downcast_ref::<Error>() {
        matches!(err, Error::TrialPruned)
    } else {
        any.downcast_ref::<crate::error::TrialPruned>().is_some()
    }
}
