//! The Bayesian optimizer contract used by [`BayesOptSampler`](crate::sampler::BayesOptSampler).
//!
//! An optimizer works on a fixed list of continuous dimensions
//! ([`ParamSpec`]). It ingests observations with [`Optimizer::log`] and
//! proposes the next point with [`Optimizer::next`]. Points are plain
//! `f64` slices aligned with [`Optimizer::params`]: position `i` always
//! belongs to `params()[i]`.
//!
//! Optimizers always **minimize**. Callers that maximize negate the values
//! they log.
//!
//! [`GpOptimizer`] is the default implementation: a Gaussian Process with
//! a Matérn 5/2 kernel and Expected Improvement acquisition.

mod gp;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use gp::{GpFactory, GpOptimizer, GpOption};

use crate::error::Result;

/// One continuous dimension of the optimizer's search space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParamSpec {
    name: String,
    min: f64,
    max: f64,
}

impl ParamSpec {
    /// Creates a continuous dimension bounded by `[min, max]`.
    #[must_use]
    pub fn uniform(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// The parameter name this dimension stands for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound (inclusive).
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Returns `true` if `x` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }
}

/// A sequential model-based optimizer over a fixed set of dimensions.
pub trait Optimizer {
    /// The dimensions this optimizer was built for, in point order.
    fn params(&self) -> &[ParamSpec];

    /// Records an evaluated point. `point[i]` belongs to `params()[i]`.
    fn log(&mut self, point: &[f64], value: f64);

    /// Number of observations logged so far.
    fn n_observations(&self) -> usize;

    /// Proposes the next point to evaluate, aligned with [`params`](Self::params).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Optimizer`](crate::Error::Optimizer) if the model
    /// cannot be fitted to the logged observations.
    fn next(&mut self) -> Result<Vec<f64>>;
}

/// Builds a fresh [`Optimizer`] for one sampling call.
///
/// `Setting` is the optimizer's own tuning knob type. The sampler stores a
/// list of them and hands it to [`create`](Self::create) unchanged.
pub trait OptimizerFactory: Send + Sync {
    /// Optimizer-specific configuration entry.
    type Setting: Clone + core::fmt::Debug + Send + Sync;

    /// The optimizer this factory builds.
    type Optimizer: Optimizer;

    /// Creates an optimizer over `params`, seeded with `seed`.
    fn create(&self, params: Vec<ParamSpec>, settings: &[Self::Setting], seed: u64)
    -> Self::Optimizer;
}
