//! Random sampler implementation.

use parking_lot::Mutex;

use crate::distribution::Distribution;
use crate::param::ParamValue;
use crate::rng_util;
use crate::sampler::Sampler;
use crate::trial::FrozenTrial;

/// A simple random sampler that samples uniformly from distributions.
///
/// This sampler ignores the trial history. It is the independent sampler a
/// study uses by default, covering every parameter the relative sampler
/// does not propose.
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::sampler::RandomSampler;
///
/// // Create with default RNG
/// let sampler = RandomSampler::new();
///
/// // Create with a fixed seed for reproducibility
/// let sampler = RandomSampler::with_seed(42);
/// ```
pub struct RandomSampler {
    rng: Mutex<fastrand::Rng>,
}

impl RandomSampler {
    /// Creates a new random sampler with a default random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a new random sampler with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn sample(
        &self,
        distribution: &Distribution,
        _trial_id: u64,
        _history: &[FrozenTrial],
    ) -> ParamValue {
        let mut rng = self.rng.lock();

        match distribution {
            Distribution::Uniform(d) => {
                ParamValue::Float(rng_util::f64_range(&mut rng, d.low, d.high))
            }
            Distribution::LogUniform(d) => {
                let log_value = rng_util::f64_range(&mut rng, d.low.ln(), d.high.ln());
                ParamValue::Float(log_value.exp().clamp(d.low, d.high))
            }
            Distribution::IntUniform(d) => ParamValue::Int(rng.i64(d.low..=d.high)),
            Distribution::DiscreteUniform(d) => {
                let n_steps = ((d.high - d.low) / d.q).floor() as i64;
                let k = rng.i64(0..=n_steps);
                ParamValue::Float((d.low + (k as f64) * d.q).min(d.high))
            }
            Distribution::Categorical(d) => {
                let index = rng.usize(0..d.choices.len());
                ParamValue::Categorical(d.choices[index].clone())
            }
        }
    }
}
