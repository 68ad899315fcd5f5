//! Gaussian Process optimizer with Expected Improvement acquisition.
//!
//! A classical Bayesian optimization loop that builds a Gaussian Process
//! surrogate with a **Matérn 5/2 kernel** (with ARD lengthscales) and
//! proposes the point maximizing **Expected Improvement (EI)**.
//!
//! # Algorithm overview
//!
//! 1. **Startup phase**: while fewer than `StartupTrials` observations are
//!    logged, proposals are drawn uniformly at random within the bounds.
//! 2. **Fit GP**: observations are mapped to the unit cube, targets are
//!    standardized (zero mean, unit variance), and a GP is fitted via
//!    Cholesky decomposition. ARD lengthscales are the per-dimension
//!    standard deviation of the training inputs.
//! 3. **Maximize EI**: `Candidates` random points are evaluated under the
//!    GP posterior and the one with the highest Expected Improvement wins.
//!
//! Only the most recent `MaxTrainPoints` observations are fitted, to keep
//! the O(n³) cost bounded.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | [`GpOption::StartupTrials`] | 10 | Observations required before the GP is used |
//! | [`GpOption::Candidates`] | 1000 | Random candidates for EI maximization |
//! | [`GpOption::NoiseVariance`] | 1e-6 | Observation noise added to kernel diagonal |
//! | [`GpOption::MaxTrainPoints`] | 100 | Most recent observations used for fitting |

use nalgebra::{DMatrix, DVector};

use super::{Optimizer, OptimizerFactory, ParamSpec};
use crate::error::{Error, Result};
use crate::rng_util;

/// Default number of observations before the GP kicks in.
const DEFAULT_N_STARTUP: usize = 10;
/// Default number of candidate points for EI optimization.
const DEFAULT_N_CANDIDATES: usize = 1000;
/// Default observation noise variance.
const DEFAULT_NOISE_VAR: f64 = 1e-6;
/// Default cap on training points.
const DEFAULT_MAX_TRAIN_POINTS: usize = 100;

/// √5, used by the Matérn 5/2 kernel.
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Tuning knob for [`GpOptimizer`].
///
/// Later entries override earlier ones of the same kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GpOption {
    /// Number of observations required before GP-guided proposals begin.
    StartupTrials(usize),
    /// Number of random candidates scored during EI maximization.
    Candidates(usize),
    /// Observation noise variance added to the kernel diagonal.
    NoiseVariance(f64),
    /// Maximum number of (most recent) observations used to fit the GP.
    MaxTrainPoints(usize),
}

#[derive(Clone, Copy, Debug)]
struct GpConfig {
    n_startup: usize,
    n_candidates: usize,
    noise_variance: f64,
    max_train_points: usize,
}

impl GpConfig {
    fn from_options(options: &[GpOption]) -> Self {
        let mut config = Self {
            n_startup: DEFAULT_N_STARTUP,
            n_candidates: DEFAULT_N_CANDIDATES,
            noise_variance: DEFAULT_NOISE_VAR,
            max_train_points: DEFAULT_MAX_TRAIN_POINTS,
        };
        for option in options {
            match *option {
                GpOption::StartupTrials(n) => config.n_startup = n,
                GpOption::Candidates(n) => config.n_candidates = n.max(1),
                GpOption::NoiseVariance(v) => config.noise_variance = v,
                GpOption::MaxTrainPoints(n) => config.max_train_points = n.max(1),
            }
        }
        config
    }
}

/// Gaussian Process optimizer over a fixed set of continuous dimensions.
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::bo::{GpOptimizer, GpOption, Optimizer, ParamSpec};
///
/// let params = vec![ParamSpec::uniform("x", -5.0, 5.0)];
/// let mut gp = GpOptimizer::new(params, &[GpOption::StartupTrials(3)], 42);
///
/// for x in [-4.0, -1.0, 2.0, 4.5] {
///     gp.log(&[x], (x - 1.0) * (x - 1.0));
/// }
///
/// let next = gp.next().unwrap();
/// assert!((-5.0..=5.0).contains(&next[0]));
/// ```
pub struct GpOptimizer {
    params: Vec<ParamSpec>,
    config: GpConfig,
    rng: fastrand::Rng,
    /// Logged inputs, normalized to [0, 1] per dimension.
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
}

impl GpOptimizer {
    /// Creates an optimizer over `params` with the given options and seed.
    #[must_use]
    pub fn new(params: Vec<ParamSpec>, options: &[GpOption], seed: u64) -> Self {
        Self {
            params,
            config: GpConfig::from_options(options),
            rng: fastrand::Rng::with_seed(seed),
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    fn random_point(&mut self) -> Vec<f64> {
        let unit = rng_util::unit_point(&mut self.rng, self.params.len());
        self.denormalize(&unit)
    }

    fn denormalize(&self, unit: &[f64]) -> Vec<f64> {
        self.params
            .iter()
            .zip(unit)
            .map(|(p, &u)| from_normalized(u, p.min(), p.max()).clamp(p.min(), p.max()))
            .collect()
    }
}

impl Optimizer for GpOptimizer {
    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn log(&mut self, point: &[f64], value: f64) {
        debug_assert_eq!(point.len(), self.params.len());
        let normalized = self
            .params
            .iter()
            .zip(point)
            .map(|(p, &v)| to_normalized(v, p.min(), p.max()))
            .collect();
        self.x.push(normalized);
        self.y.push(value);
    }

    fn n_observations(&self) -> usize {
        self.y.len()
    }

    fn next(&mut self) -> Result<Vec<f64>> {
        if self.params.is_empty() {
            return Ok(Vec::new());
        }
        if self.y.len() < self.config.n_startup.max(1) {
            return Ok(self.random_point());
        }

        // Use only the most recent observations to cap GP fitting cost
        let start = self.y.len().saturating_sub(self.config.max_train_points);
        let model = fit_gp(&self.x[start..], &self.y[start..], self.config.noise_variance)
            .ok_or_else(|| {
                Error::Optimizer("kernel matrix is not positive definite".to_owned())
            })?;

        let unit = optimize_acquisition(
            &model,
            self.params.len(),
            self.config.n_candidates,
            &mut self.rng,
        );
        Ok(self.denormalize(&unit))
    }
}

/// Builds [`GpOptimizer`]s. The default factory for
/// [`BayesOptSampler`](crate::sampler::BayesOptSampler).
#[derive(Clone, Copy, Debug, Default)]
pub struct GpFactory;

impl OptimizerFactory for GpFactory {
    type Setting = GpOption;
    type Optimizer = GpOptimizer;

    fn create(&self, params: Vec<ParamSpec>, options: &[GpOption], seed: u64) -> GpOptimizer {
        GpOptimizer::new(params, options, seed)
    }
}

// ---------------------------------------------------------------------------
// Matérn 5/2 kernel
// ---------------------------------------------------------------------------

/// Matérn 5/2 kernel with ARD lengthscales.
///
/// `k(x1, x2) = σ² (1 + √5 r + 5/3 r²) exp(-√5 r)`
/// where `r = sqrt(Σ ((x1_i - x2_i) / l_i)²)`
fn matern52(x1: &[f64], x2: &[f64], lengthscales: &[f64], signal_var: f64) -> f64 {
    let r_sq: f64 = x1
        .iter()
        .zip(x2)
        .zip(lengthscales)
        .map(|((a, b), l)| {
            let diff = (a - b) / l;
            diff * diff
        })
        .sum();
    let sqrt5_r = SQRT_5 * r_sq.sqrt();
    signal_var * (1.0 + sqrt5_r + 5.0 / 3.0 * r_sq) * (-sqrt5_r).exp()
}

/// A fitted GP ready for predictions.
struct GpModel<'a> {
    /// Cholesky factor of K + σ²I.
    cholesky: nalgebra::linalg::Cholesky<f64, nalgebra::Dyn>,
    /// α = (K + σ²I)^{-1} y.
    alpha: DVector<f64>,
    x_train: &'a [Vec<f64>],
    lengthscales: Vec<f64>,
    signal_var: f64,
    /// Best observed (standardized) y.
    f_best: f64,
}

/// Fit a GP to the training data.
///
/// Returns `None` if the Cholesky decomposition fails.
#[allow(clippy::cast_precision_loss)]
fn fit_gp<'a>(x_train: &'a [Vec<f64>], y_train: &[f64], noise_var: f64) -> Option<GpModel<'a>> {
    let n = y_train.len();
    if n == 0 {
        return None;
    }

    let y_mean = y_train.iter().sum::<f64>() / n as f64;
    let y_var = if n > 1 {
        y_train.iter().map(|&y| (y - y_mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        1.0
    };
    let y_std = y_var.sqrt().max(1e-10);
    let y_standardized: Vec<f64> = y_train.iter().map(|&y| (y - y_mean) / y_std).collect();
    let f_best = y_standardized.iter().copied().fold(f64::INFINITY, f64::min);

    // ARD lengthscales: per-dimension std dev of the inputs, clamped
    let d = x_train[0].len();
    let lengthscales: Vec<f64> = (0..d)
        .map(|j| {
            let mean_j = x_train.iter().map(|x| x[j]).sum::<f64>() / n as f64;
            let var_j = x_train.iter().map(|x| (x[j] - mean_j).powi(2)).sum::<f64>() / n as f64;
            var_j.sqrt().max(0.01)
        })
        .collect();

    // Targets are standardized, so unit signal variance
    let signal_var = 1.0;

    let k = DMatrix::from_fn(n, n, |i, j| {
        let k = matern52(&x_train[i], &x_train[j], &lengthscales, signal_var);
        if i == j { k + noise_var } else { k }
    });
    let cholesky = nalgebra::linalg::Cholesky::new(k)?;
    let alpha = cholesky.solve(&DVector::from_column_slice(&y_standardized));

    Some(GpModel {
        cholesky,
        alpha,
        x_train,
        lengthscales,
        signal_var,
        f_best,
    })
}

/// Predict posterior mean and standard deviation at a test point.
fn predict(model: &GpModel<'_>, x: &[f64]) -> (f64, f64) {
    let k_star = DVector::from_fn(model.x_train.len(), |i, _| {
        matern52(x, &model.x_train[i], &model.lengthscales, model.signal_var)
    });

    let mean = k_star.dot(&model.alpha);
    let v = model.cholesky.solve(&k_star);
    let var = (model.signal_var - k_star.dot(&v)).max(0.0);

    (mean, var.sqrt())
}

// ---------------------------------------------------------------------------
// Expected Improvement
// ---------------------------------------------------------------------------

/// Standard normal PDF.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Hart rational approximation).
fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let t = 1.0 / (1.0 + 0.231_641_9 * x.abs());
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782 + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let cdf = 1.0 - norm_pdf(x.abs()) * poly;

    if x >= 0.0 { cdf } else { 1.0 - cdf }
}

/// `EI(x) = (f_best - mean) Φ(z) + std φ(z)` where `z = (f_best - mean) / std`.
fn expected_improvement(mean: f64, std: f64, f_best: f64) -> f64 {
    if std < 1e-12 {
        return (f_best - mean).max(0.0);
    }
    let z = (f_best - mean) / std;
    ((f_best - mean) * norm_cdf(z) + std * norm_pdf(z)).max(0.0)
}

/// Find the point in [0, 1]^d that maximizes EI via random search.
fn optimize_acquisition(
    model: &GpModel<'_>,
    n_dims: usize,
    n_candidates: usize,
    rng: &mut fastrand::Rng,
) -> Vec<f64> {
    let mut best_ei = f64::NEG_INFINITY;
    let mut best_x = vec![0.5; n_dims];

    for _ in 0..n_candidates {
        let x = rng_util::unit_point(rng, n_dims);
        let (mean, std) = predict(model, &x);
        let ei = expected_improvement(mean, std, model.f_best);
        if ei > best_ei {
            best_ei = ei;
            best_x = x;
        }
    }

    best_x
}

fn to_normalized(value: f64, lo: f64, hi: f64) -> f64 {
    if (hi - lo).abs() < 1e-15 {
        0.5
    } else {
        (value - lo) / (hi - lo)
    }
}

fn from_normalized(value: f64, lo: f64, hi: f64) -> f64 {
    lo + value * (hi - lo)
}
