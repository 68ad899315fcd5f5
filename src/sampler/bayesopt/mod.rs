//! Relative sampler backed by a Gaussian Process optimizer.
//!
//! [`BayesOptSampler`] lets a study delegate joint point selection to a
//! Bayesian optimizer. Each call to
//! [`sample_relative`](RelativeSampler::sample_relative) runs one full
//! cycle:
//!
//! 1. [`translate`] the search space into optimizer dimensions,
//! 2. read the study history,
//! 3. [`replay`] complete trials into validated observations,
//! 4. build a fresh optimizer (seeded from the sampler's RNG),
//! 5. log every observation, oldest first,
//! 6. ask the optimizer for the next point, and
//! 7. map the point back to `name -> value`.
//!
//! Nothing but the RNG survives between calls. The RNG sits behind a mutex
//! that is held for the whole cycle, so concurrent callers are serialized.
//!
//! Only uniform float parameters take part. Parameters of other kinds are
//! not proposed and the trial samples them independently.
//!
//! # Examples
//!
//! ```
//! use bayesopt_sampler::prelude::*;
//!
//! let sampler = BayesOptSampler::builder()
//!     .seed(42)
//!     .setting(GpOption::StartupTrials(5))
//!     .build();
//!
//! let study = Study::builder().minimize().relative_sampler(sampler).build();
//!
//! study
//!     .optimize(12, |trial: &mut Trial| {
//!         let x1 = trial.suggest_float("x1", -10.0, 10.0)?;
//!         let x2 = trial.suggest_float("x2", -10.0, 10.0)?;
//!         Ok::<_, Error>((x1 - 2.0).powi(2) + (x2 + 5.0).powi(2))
//!     })
//!     .unwrap();
//!
//! assert_eq!(study.n_trials(), 12);
//! ```

mod replay;
mod translate;

use std::collections::HashMap;

use parking_lot::Mutex;

pub use self::replay::{Observation, SkipReason, replay, replay_trial};
pub use self::translate::translate;
use crate::bo::{GpFactory, Optimizer, OptimizerFactory};
use crate::error::{Error, Result};
use crate::rng_util;
use crate::sampler::{RelativeSampler, TrialHistory};
use crate::search_space::SearchSpace;
use crate::trial::FrozenTrial;
use crate::types::Direction;

/// Relative sampler that proposes uniform float parameters with a Bayesian optimizer.
///
/// The optimizer is produced by an [`OptimizerFactory`], [`GpFactory`] by
/// default. Settings given to the builder are handed to the factory
/// unchanged on every call.
///
/// When the effective search space has no supported dimension, the sampler
/// returns an empty map without reading the history.
pub struct BayesOptSampler<F: OptimizerFactory = GpFactory> {
    rng: Mutex<fastrand::Rng>,
    factory: F,
    settings: Vec<F::Setting>,
}

impl BayesOptSampler {
    /// Creates a sampler with default GP settings and a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a sampler with default GP settings and a fixed seed.
    ///
    /// Two samplers created with the same seed propose the same points when
    /// given the same history and search space.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::builder().seed(seed).build()
    }

    /// Creates a builder for configuring a `BayesOptSampler`.
    #[must_use]
    pub fn builder() -> BayesOptSamplerBuilder {
        BayesOptSamplerBuilder::new()
    }
}

impl Default for BayesOptSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: OptimizerFactory> BayesOptSampler<F> {
    /// The settings passed to the optimizer factory.
    #[must_use]
    pub fn settings(&self) -> &[F::Setting] {
        &self.settings
    }
}

/// Builder for configuring a [`BayesOptSampler`].
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::bo::GpOption;
/// use bayesopt_sampler::sampler::bayesopt::BayesOptSamplerBuilder;
///
/// let sampler = BayesOptSamplerBuilder::new()
///     .seed(7)
///     .settings(vec![GpOption::StartupTrials(5), GpOption::Candidates(500)])
///     .build();
///
/// assert_eq!(sampler.settings().len(), 2);
/// ```
pub struct BayesOptSamplerBuilder<F: OptimizerFactory = GpFactory> {
    seed: Option<u64>,
    factory: F,
    settings: Vec<F::Setting>,
}

impl BayesOptSamplerBuilder {
    /// Creates a builder using [`GpFactory`] with no extra settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: None,
            factory: GpFactory,
            settings: Vec::new(),
        }
    }
}

impl Default for BayesOptSamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: OptimizerFactory> BayesOptSamplerBuilder<F> {
    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the optimizer settings.
    #[must_use]
    pub fn settings(mut self, settings: Vec<F::Setting>) -> Self {
        self.settings = settings;
        self
    }

    /// Appends one optimizer setting.
    #[must_use]
    pub fn setting(mut self, setting: F::Setting) -> Self {
        self.settings.push(setting);
        self
    }

    /// Switches to another optimizer factory.
    ///
    /// Settings belong to the factory type, so any settings added so far are
    /// discarded. Call this before [`setting`](Self::setting).
    #[must_use]
    pub fn factory<G: OptimizerFactory>(self, factory: G) -> BayesOptSamplerBuilder<G> {
        BayesOptSamplerBuilder {
            seed: self.seed,
            factory,
            settings: Vec::new(),
        }
    }

    /// Builds the configured [`BayesOptSampler`].
    #[must_use]
    pub fn build(self) -> BayesOptSampler<F> {
        let rng = self
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        BayesOptSampler {
            rng: Mutex::new(rng),
            factory: self.factory,
            settings: self.settings,
        }
    }
}

impl<F: OptimizerFactory> RelativeSampler for BayesOptSampler<F> {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn sample_relative(
        &self,
        study: &dyn TrialHistory,
        trial: &FrozenTrial,
        search_space: &SearchSpace,
    ) -> Result<HashMap<String, f64>> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("sample_relative", trial_id = trial.id).entered();

        // Held until the proposal is mapped back, including the optimizer call.
        let mut rng = self.rng.lock();

        let specs = translate(search_space);
        if specs.is_empty() {
            trace_debug!("no uniform dimensions in search space; nothing to propose");
            return Ok(HashMap::new());
        }

        let history = study.trials()?;
        let observations = replay(&specs, &history);

        trace_debug!(
            dimensions = specs.len(),
            history = history.len(),
            observations = observations.len(),
            "replayed trial history"
        );

        // The optimizer minimizes.
        let sign = match study.direction() {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        };

        let seed = rng_util::next_seed(&mut rng);
        let mut optimizer = self.factory.create(specs, &self.settings, seed);
        for observation in &observations {
            optimizer.log(&observation.point, sign * observation.value);
        }

        let point = optimizer.next()?;
        let params = optimizer.params();
        if point.len() != params.len() {
            return Err(Error::DimensionMismatch {
                expected: params.len(),
                got: point.len(),
            });
        }

        Ok(params
            .iter()
            .zip(point)
            .map(|(spec, value)| (spec.name().to_owned(), value))
            .collect())
    }
}
