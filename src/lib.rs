#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Gaussian Process relative sampling for Optuna-style hyperparameter studies.
//!
//! A [`Study`] runs trials; each trial suggests named parameters drawn from
//! declared [`Distribution`]s. A *relative* sampler proposes all parameters
//! of a trial at once instead of one at a time.
//! [`BayesOptSampler`](sampler::BayesOptSampler) is a
//! relative sampler that hands point selection to a Bayesian optimizer: it
//! translates the search space into optimizer dimensions, replays the
//! validated trial history into the optimizer, and maps the optimizer's
//! proposal back to parameter values.
//!
//! # Getting Started
//!
//! ```
//! use bayesopt_sampler::prelude::*;
//!
//! let sampler = BayesOptSampler::builder()
//!     .seed(0)
//!     .setting(GpOption::StartupTrials(5))
//!     .build();
//! let study = Study::builder().relative_sampler(sampler).build();
//!
//! study
//!     .optimize(15, |trial: &mut Trial| {
//!         let x1 = trial.suggest_float("x1", -10.0, 10.0)?;
//!         let x2 = trial.suggest_float("x2", -10.0, 10.0)?;
//!         Ok::<_, Error>((x1 - 2.0).powi(2) + (x2 + 5.0).powi(2))
//!     })
//!     .unwrap();
//!
//! let best = study.best_trial().unwrap();
//! println!("best value {:?} at {:?}", best.value, best.params);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Study`] | Drive an optimization loop: create trials, record results, track the best. |
//! | [`Trial`] | A single evaluation of the objective function, carrying suggested parameter values. |
//! | [`FrozenTrial`] | Immutable history record of a trial. |
//! | [`Distribution`] | Legal range of one parameter. |
//! | [`RelativeSampler`](sampler::RelativeSampler) | Proposes a whole parameter vector per trial. |
//! | [`BayesOptSampler`](sampler::BayesOptSampler) | Relative sampler backed by a [`bo::Optimizer`]. |
//! | [`GpOptimizer`](bo::GpOptimizer) | Default optimizer: GP surrogate with Expected Improvement. |
//!
//! Only uniform float parameters are proposed by
//! [`BayesOptSampler`](sampler::BayesOptSampler);
//! every other parameter falls back to the independent sampler.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public data types | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at key sampling points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod bo;
mod distribution;
mod error;
mod param;
mod rng_util;
pub mod sampler;
mod search_space;
pub mod storage;
mod study;
mod trial;
mod types;

pub use distribution::{
    CategoricalDistribution, DiscreteUniformDistribution, Distribution, DistributionKind,
    IntUniformDistribution, LogUniformDistribution, UniformDistribution,
};
pub use error::{Error, Result, TrialPruned};
pub use param::ParamValue;
pub use search_space::{SearchSpace, intersection_search_space};
pub use study::{Study, StudyBuilder};
pub use trial::{FrozenTrial, Trial};
pub use types::{Direction, TrialState};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use bayesopt_sampler::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bo::{GpFactory, GpOptimizer, GpOption, Optimizer, OptimizerFactory, ParamSpec};
    pub use crate::distribution::{Distribution, DistributionKind};
    pub use crate::error::{Error, Result, TrialPruned};
    pub use crate::param::ParamValue;
    pub use crate::sampler::{
        BayesOptSampler, RandomSampler, RelativeSampler, Sampler, TrialHistory,
    };
    pub use crate::search_space::{SearchSpace, intersection_search_space};
    pub use crate::storage::{MemoryStorage, Storage};
    pub use crate::study::{Study, StudyBuilder};
    pub use crate::trial::{FrozenTrial, Trial};
    pub use crate::types::{Direction, TrialState};
}
