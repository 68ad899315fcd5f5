//! Sampler traits and implementations.
//!
//! Two kinds of samplers cooperate inside a study:
//!
//! - an **independent** [`Sampler`] draws one parameter at a time from its
//!   distribution, and
//! - a **relative** [`RelativeSampler`] proposes a whole parameter vector at
//!   once for the study's relative search space, using correlations across
//!   dimensions.
//!
//! Parameters outside the relative search space, or ones the relative
//! sampler could not propose, fall back to the independent sampler.

pub mod bayesopt;
pub mod random;

use std::collections::HashMap;

pub use bayesopt::BayesOptSampler;
pub use random::RandomSampler;

use crate::distribution::Distribution;
use crate::error::Result;
use crate::param::ParamValue;
use crate::search_space::SearchSpace;
use crate::trial::FrozenTrial;
use crate::types::Direction;

/// Trait for pluggable independent sampling strategies.
///
/// The trait requires `Send + Sync` so a study can be shared across threads.
pub trait Sampler: Send + Sync {
    /// Samples a parameter value from the given distribution.
    ///
    /// # Arguments
    ///
    /// * `distribution` - The parameter distribution to sample from.
    /// * `trial_id` - The unique ID of the trial being sampled for.
    /// * `history` - Snapshot of the study's trials for informed sampling.
    fn sample(
        &self,
        distribution: &Distribution,
        trial_id: u64,
        history: &[FrozenTrial],
    ) -> ParamValue;
}

/// Read access to a study's history, as seen by a relative sampler.
pub trait TrialHistory {
    /// The direction the study optimizes in.
    fn direction(&self) -> Direction;

    /// Returns a snapshot of every trial, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn trials(&self) -> Result<Vec<FrozenTrial>>;
}

/// Trait for samplers that propose all parameters of a search space jointly.
pub trait RelativeSampler: Send + Sync {
    /// Proposes values for the parameters in `search_space`.
    ///
    /// The returned map holds internal `f64` values keyed by parameter name.
    /// Names missing from the map are sampled independently by the trial.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read or the proposal fails.
    fn sample_relative(
        &self,
        study: &dyn TrialHistory,
        trial: &FrozenTrial,
        search_space: &SearchSpace,
    ) -> Result<HashMap<String, f64>>;
}
