//! History replay: rebuilding optimizer observations from past trials.
//!
//! Validation is per trial and all-or-nothing. The optimizer works on a
//! fixed number of dimensions and cannot take a partial point, so a trial
//! that fails any check for any dimension is dropped as a whole. The
//! reason is reported as a [`SkipReason`].

use crate::bo::ParamSpec;
use crate::distribution::{Distribution, DistributionKind};
use crate::trial::FrozenTrial;
use crate::types::TrialState;

/// A validated `(point, value)` pair ready to be logged into an optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// The trial this observation was rebuilt from.
    pub trial_id: u64,
    /// One value per [`ParamSpec`], in the order of the spec slice.
    pub point: Vec<f64>,
    /// The trial's objective value.
    pub value: f64,
}

/// Why a trial was left out of the replayed history.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SkipReason {
    /// The trial is not complete.
    #[error("trial is {0:?}, not complete")]
    NotComplete(TrialState),

    /// The trial has no finite objective value.
    #[error("trial has no finite objective value")]
    InvalidValue,

    /// The trial never recorded a distribution for this parameter.
    #[error("no distribution recorded for '{0}'")]
    MissingDistribution(String),

    /// The trial never recorded a value for this parameter.
    #[error("no value recorded for '{0}'")]
    MissingParam(String),

    /// The recorded value does not fit the recorded distribution.
    #[error("value of '{0}' cannot be converted")]
    Conversion(String),

    /// The parameter was drawn from a distribution the optimizer cannot model.
    #[error("'{name}' was drawn from an unsupported {kind} distribution")]
    UnsupportedDistribution {
        /// The parameter name.
        name: String,
        /// The recorded distribution kind.
        kind: DistributionKind,
    },

    /// The recorded value lies outside the recorded distribution.
    #[error("value {value} of '{name}' is out of bounds")]
    OutOfBounds {
        /// The parameter name.
        name: String,
        /// The offending value.
        value: f64,
    },
}

/// Rebuilds the observation for one trial, or explains why it cannot.
///
/// For each spec, in order: the trial must record a distribution and a
/// value for the spec's name, the value must convert to the internal
/// representation, the distribution must be uniform, and the value must
/// lie both within it and within the spec's current bounds.
///
/// # Errors
///
/// Returns the first [`SkipReason`] encountered.
pub fn replay_trial(
    specs: &[ParamSpec],
    trial: &FrozenTrial,
) -> Result<Observation, SkipReason> {
    if trial.state != TrialState::Complete {
        return Err(SkipReason::NotComplete(trial.state));
    }
    let value = trial
        .value
        .filter(|v| v.is_finite())
        .ok_or(SkipReason::InvalidValue)?;

    let mut point = Vec::with_capacity(specs.len());
    for spec in specs {
        let name = spec.name();
        let distribution = trial
            .distributions
            .get(name)
            .ok_or_else(|| SkipReason::MissingDistribution(name.to_owned()))?;
        let external = trial
            .params
            .get(name)
            .ok_or_else(|| SkipReason::MissingParam(name.to_owned()))?;
        let internal = distribution
            .to_internal(external)
            .map_err(|_| SkipReason::Conversion(name.to_owned()))?;

        match distribution {
            Distribution::Uniform(d) => {
                if !d.contains(internal) || !spec.contains(internal) {
                    return Err(SkipReason::OutOfBounds {
                        name: name.to_owned(),
                        value: internal,
                    });
                }
            }
            Distribution::LogUniform(_)
            | Distribution::IntUniform(_)
            | Distribution::DiscreteUniform(_)
            | Distribution::Categorical(_) => {
                return Err(SkipReason::UnsupportedDistribution {
                    name: name.to_owned(),
                    kind: distribution.kind(),
                });
            }
        }

        // Uniform values are identical in both representations.
        point.push(internal);
    }

    Ok(Observation {
        trial_id: trial.id,
        point,
        value,
    })
}

/// Rebuilds observations for every trial in `trials` that passes validation.
///
/// The input order is preserved. Skipped trials are reported at debug level
/// when the `tracing` feature is enabled.
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::bo::ParamSpec;
/// use bayesopt_sampler::sampler::bayesopt::replay;
/// use bayesopt_sampler::{Distribution, FrozenTrial};
///
/// let specs = vec![ParamSpec::uniform("x", 0.0, 1.0)];
/// let trials = vec![
///     FrozenTrial::complete(0, 3.0).with_param("x", Distribution::uniform(0.0, 1.0), 0.2),
///     // Out of bounds: dropped.
///     FrozenTrial::complete(1, 1.0).with_param("x", Distribution::uniform(0.0, 2.0), 1.5),
/// ];
///
/// let observations = replay(&specs, &trials);
/// assert_eq!(observations.len(), 1);
/// assert_eq!(observations[0].point, vec![0.2]);
/// ```
#[must_use]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub fn replay(specs: &[ParamSpec], trials: &[FrozenTrial]) -> Vec<Observation> {
    trials
        .iter()
        .filter_map(|trial| match replay_trial(specs, trial) {
            Ok(observation) => Some(observation),
            Err(SkipReason::NotComplete(_)) => None,
            Err(reason) => {
                trace_debug!(trial_id = trial.id, %reason, "trial left out of replay");
                None
            }
        })
        .collect()
}
