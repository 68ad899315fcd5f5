use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bayesopt_sampler::bo::{Optimizer, OptimizerFactory, ParamSpec};
use bayesopt_sampler::prelude::*;

fn quadratic(x1: f64, x2: f64) -> f64 {
    (x1 - 2.0).powi(2) + (x2 + 5.0).powi(2)
}

#[test]
fn test_gp_workflow_finds_the_quadratic_minimum() {
    let sampler = BayesOptSampler::builder()
        .seed(42)
        .setting(GpOption::StartupTrials(8))
        .build();
    let study = Study::builder()
        .minimize()
        .sampler(RandomSampler::with_seed(42))
        .relative_sampler(sampler)
        .build();

    study
        .optimize(40, |trial: &mut Trial| {
            let x1 = trial.suggest_float("x1", -10.0, 10.0)?;
            let x2 = trial.suggest_float("x2", -10.0, 10.0)?;
            Ok::<_, Error>(quadratic(x1, x2))
        })
        .unwrap();

    assert_eq!(study.n_trials(), 40);
    let best = study.best_value().unwrap();
    assert!(best < 10.0, "GP should approach the minimum, got {best}");
}

#[test]
fn test_gp_workflow_maximize() {
    let study = Study::builder()
        .maximize()
        .relative_sampler(
            BayesOptSampler::builder()
                .seed(8)
                .setting(GpOption::StartupTrials(5))
                .build(),
        )
        .build();

    study
        .optimize(25, |trial: &mut Trial| {
            let x = trial.suggest_float("x", -3.0, 3.0)?;
            Ok::<_, Error>(-(x - 1.0).powi(2))
        })
        .unwrap();

    let best = study.best_value().unwrap();
    assert!(best > -1.0, "maximization should approach 0, got {best}");
}

#[test]
fn test_mixed_parameters_fall_back_to_independent_sampling() {
    let study = Study::builder()
        .relative_sampler(BayesOptSampler::with_seed(2))
        .sampler(RandomSampler::with_seed(2))
        .build();

    study
        .optimize(12, |trial: &mut Trial| {
            let x = trial.suggest_float("x", -1.0, 1.0)?;
            let n = trial.suggest_int("n", 1, 4)?;
            let act = trial.suggest_categorical("act", &["relu", "tanh"])?;

            assert!(!trial.relative_params().contains_key("n"));
            assert!(!trial.relative_params().contains_key("act"));
            assert!((1..=4).contains(&n));
            assert!(act == "relu" || act == "tanh");

            Ok::<_, Error>(x * x + n as f64)
        })
        .unwrap();

    assert_eq!(study.n_trials(), 12);
}

#[test]
fn test_changed_bounds_leave_the_relative_space() {
    let study = Study::builder()
        .relative_sampler(BayesOptSampler::with_seed(6))
        .build();

    study
        .optimize(3, |trial: &mut Trial| {
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            Ok::<_, Error>(x)
        })
        .unwrap();

    // Same name, different distribution: not part of the intersection space.
    let mut trial = study.ask().unwrap();
    assert!(trial.relative_params().contains_key("x"));
    let x = trial.suggest_float("x", 5.0, 6.0).unwrap();
    assert!((5.0..=6.0).contains(&x));
    study.tell(trial, Ok::<_, &str>(x)).unwrap();

    // With mismatched histories the intersection no longer holds `x`.
    let trial = study.ask().unwrap();
    assert!(trial.relative_params().is_empty());
}

/// Relative sampler that always fails.
#[derive(Default)]
struct FailingRelative {
    calls: Arc<AtomicUsize>,
}

impl RelativeSampler for FailingRelative {
    fn sample_relative(
        &self,
        _study: &dyn TrialHistory,
        _trial: &FrozenTrial,
        _search_space: &SearchSpace,
    ) -> Result<HashMap<String, f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Optimizer("always fails".to_owned()))
    }
}

#[test]
fn test_relative_failure_falls_back_to_independent_sampling() {
    let calls = Arc::new(AtomicUsize::new(0));
    let study = Study::builder()
        .relative_sampler(FailingRelative {
            calls: Arc::clone(&calls),
        })
        .build();

    study
        .optimize(5, |trial: &mut Trial| {
            assert!(trial.relative_params().is_empty());
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            Ok::<_, Error>(x)
        })
        .unwrap();

    assert_eq!(study.n_trials(), 5);
    // No relative call for the first trial: the search space is still empty.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

/// Storage whose reads always fail.
struct UnreadableStorage;

impl Storage for UnreadableStorage {
    fn push(&self, _trial: FrozenTrial) -> Result<()> {
        Ok(())
    }

    fn trials(&self) -> Result<Vec<FrozenTrial>> {
        Err(Error::Storage("unreadable".to_owned()))
    }

    fn next_trial_id(&self) -> u64 {
        0
    }
}

#[test]
fn test_storage_failure_surfaces_from_ask() {
    let study = Study::builder()
        .relative_sampler(BayesOptSampler::with_seed(0))
        .storage(UnreadableStorage)
        .build();

    assert!(matches!(study.ask(), Err(Error::Storage(_))));
    assert_eq!(study.n_trials(), 0);
}

#[test]
fn test_optimize_with_only_failures_errors() {
    let study = Study::new(Direction::Minimize);

    let result = study.optimize(3, |_trial: &mut Trial| Err::<f64, _>("boom"));

    assert!(matches!(result, Err(Error::NoCompletedTrials)));
    let trials = study.trials().unwrap();
    assert_eq!(trials.len(), 3);
    assert!(trials.iter().all(|t| t.state == TrialState::Failed));
}

/// Factory whose optimizers record how many observations each call logged.
#[derive(Clone, Default)]
struct CountingFactory {
    logged: Arc<Mutex<Vec<usize>>>,
}

struct CountingOptimizer {
    params: Vec<ParamSpec>,
    logged: Arc<Mutex<Vec<usize>>>,
    n: usize,
}

impl Optimizer for CountingOptimizer {
    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn log(&mut self, _point: &[f64], value: f64) {
        assert!(value.is_finite());
        self.n += 1;
    }

    fn n_observations(&self) -> usize {
        self.n
    }

    fn next(&mut self) -> Result<Vec<f64>> {
        self.logged.lock().unwrap().push(self.n);
        Ok(self.params.iter().map(|p| (p.min() + p.max()) / 2.0).collect())
    }
}

impl OptimizerFactory for CountingFactory {
    type Setting = ();
    type Optimizer = CountingOptimizer;

    fn create(&self, params: Vec<ParamSpec>, _settings: &[()], _seed: u64) -> CountingOptimizer {
        CountingOptimizer {
            params,
            logged: Arc::clone(&self.logged),
            n: 0,
        }
    }
}

#[test]
fn test_pruned_and_failed_trials_are_not_replayed() {
    let factory = CountingFactory::default();
    let sampler = BayesOptSampler::builder().factory(factory.clone()).build();
    let study = Study::builder().relative_sampler(sampler).build();

    let mut expected = Vec::new();
    let mut pruned = 0;
    study
        .optimize(10, |trial: &mut Trial| {
            if !trial.relative_params().is_empty() {
                // Only trials completed so far may have been logged.
                expected.push(study.n_trials());
            }
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            match trial.id() % 4 {
                2 => {
                    pruned += 1;
                    Err(Error::from(TrialPruned))
                }
                3 => Err(Error::Optimizer("objective diverged".to_owned())),
                _ => Ok(x),
            }
        })
        .unwrap();

    assert_eq!(pruned, 2);
    assert_eq!(study.n_trials(), 6);
    assert!(!expected.is_empty());
    assert_eq!(*factory.logged.lock().unwrap(), expected);
    assert!(
        study
            .trials()
            .unwrap()
            .iter()
            .filter(|t| t.state != TrialState::Complete)
            .all(|t| t.value.is_none())
    );
}
