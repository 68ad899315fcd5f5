#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log-uniform bounds are not strictly positive.
    #[error("invalid log bounds: low must be positive for a log-uniform distribution")]
    InvalidLogBounds,

    /// Returned when a discretization step is not positive.
    #[error("invalid step: step must be positive")]
    InvalidStep,

    /// Returned when categorical choices are empty.
    #[error("categorical choices cannot be empty")]
    EmptyChoices,

    /// Returned when a parameter is suggested with a different distribution.
    #[error("parameter conflict for '{name}': {reason}")]
    ParameterConflict {
        /// The name of the conflicting parameter.
        name: String,
        /// The reason for the conflict.
        reason: String,
    },

    /// Returned when requesting the best trial but no trials have completed.
    #[error("no completed trials available")]
    NoCompletedTrials,

    /// Returned when a value cannot be mapped between its external and
    /// internal representation.
    #[error("cannot convert {value} for a {kind} distribution: {reason}")]
    Conversion {
        /// Debug rendering of the offending value.
        value: String,
        /// The distribution kind the conversion targeted.
        kind: crate::distribution::DistributionKind,
        /// Why the conversion failed.
        reason: &'static str,
    },

    /// Returned when an optimizer proposal does not match the parameter list.
    #[error("dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch {
        /// The number of parameters the optimizer was built with.
        expected: usize,
        /// The number of values it returned.
        got: usize,
    },

    /// Returned when the trial history cannot be read from storage.
    #[error("storage error: {0}")]
    Storage(String),

    /// Returned when the optimizer fails to propose the next point.
    #[error("optimizer error: {0}")]
    Optimizer(String),

    /// Returned when a trial is pruned (stopped early by the objective function).
    #[error("trial was pruned")]
    TrialPruned,
}

/// Convenience alias for results returned by this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Convenience type for signalling a pruned trial from an objective function.
///
/// Implements `Into<Error>` so it can be used with `?` in objectives that
/// return `Result<f64, Error>`.
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::{Error, TrialPruned};
///
/// fn objective_that_prunes() -> Result<f64, Error> {
///     Err(TrialPruned)?
/// }
///
/// assert!(matches!(objective_that_prunes(), Err(Error::TrialPruned)));
/// ```
#[derive(Debug)]
pub struct TrialPruned;

impl core::fmt::Display for TrialPruned {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "trial was pruned")
    }
}

impl From<TrialPruned> for Error {
    fn from(_: TrialPruned) -> Self {
        Error::TrialPruned
    }
}
