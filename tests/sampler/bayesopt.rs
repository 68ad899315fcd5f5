use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bayesopt_sampler::bo::{Optimizer, OptimizerFactory, ParamSpec};
use bayesopt_sampler::prelude::*;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// In-memory history with a fixed direction.
struct History {
    direction: Direction,
    trials: Vec<FrozenTrial>,
}

impl TrialHistory for History {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn trials(&self) -> Result<Vec<FrozenTrial>> {
        Ok(self.trials.clone())
    }
}

/// History whose store is unreachable. Counts read attempts.
#[derive(Default)]
struct BrokenHistory {
    reads: Mutex<usize>,
}

impl TrialHistory for BrokenHistory {
    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn trials(&self) -> Result<Vec<FrozenTrial>> {
        *self.reads.lock().unwrap() += 1;
        Err(Error::Storage("connection refused".to_owned()))
    }
}

#[derive(Debug, Default)]
struct Recorded {
    params: Vec<String>,
    observations: Vec<(Vec<f64>, f64)>,
    seeds: Vec<u64>,
    settings: Vec<Vec<u32>>,
}

#[derive(Clone, Copy, Default)]
enum Reply {
    #[default]
    Midpoint,
    Fail,
    Short,
}

/// Factory whose optimizers record everything they are fed.
#[derive(Clone, Default)]
struct RecordingFactory {
    log: Arc<Mutex<Recorded>>,
    reply: Reply,
}

impl RecordingFactory {
    fn replying(reply: Reply) -> Self {
        Self {
            reply,
            ..Self::default()
        }
    }

    fn recorded<T>(&self, f: impl FnOnce(&Recorded) -> T) -> T {
        f(&self.log.lock().unwrap())
    }
}

struct RecordingOptimizer {
    params: Vec<ParamSpec>,
    log: Arc<Mutex<Recorded>>,
    reply: Reply,
    n: usize,
}

impl Optimizer for RecordingOptimizer {
    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn log(&mut self, point: &[f64], value: f64) {
        self.n += 1;
        self.log
            .lock()
            .unwrap()
            .observations
            .push((point.to_vec(), value));
    }

    fn n_observations(&self) -> usize {
        self.n
    }

    fn next(&mut self) -> Result<Vec<f64>> {
        match self.reply {
            Reply::Midpoint => Ok(self
                .params
                .iter()
                .map(|p| (p.min() + p.max()) / 2.0)
                .collect()),
            Reply::Fail => Err(Error::Optimizer("model diverged".to_owned())),
            Reply::Short => Ok(Vec::new()),
        }
    }
}

impl OptimizerFactory for RecordingFactory {
    type Setting = u32;
    type Optimizer = RecordingOptimizer;

    fn create(&self, params: Vec<ParamSpec>, settings: &[u32], seed: u64) -> RecordingOptimizer {
        {
            let mut log = self.log.lock().unwrap();
            log.params = params.iter().map(|p| p.name().to_owned()).collect();
            log.seeds.push(seed);
            log.settings.push(settings.to_vec());
        }
        RecordingOptimizer {
            params,
            log: Arc::clone(&self.log),
            reply: self.reply,
            n: 0,
        }
    }
}

fn xy_space() -> SearchSpace {
    SearchSpace::from([
        ("x1".to_owned(), Distribution::uniform(-10.0, 10.0)),
        ("x2".to_owned(), Distribution::uniform(-10.0, 10.0)),
    ])
}

fn xy_trial(id: u64, x1: f64, x2: f64, value: f64) -> FrozenTrial {
    FrozenTrial::complete(id, value)
        .with_param("x1", Distribution::uniform(-10.0, 10.0), x1)
        .with_param("x2", Distribution::uniform(-10.0, 10.0), x2)
}

fn running(id: u64) -> FrozenTrial {
    FrozenTrial::new(id, TrialState::Running)
}

fn quadratic(x1: f64, x2: f64) -> f64 {
    (x1 - 2.0).powi(2) + (x2 + 5.0).powi(2)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_only_valid_complete_trials_reach_the_optimizer() {
    let history = History {
        direction: Direction::Minimize,
        trials: vec![
            xy_trial(0, 1.0, -3.0, 10.0),
            xy_trial(1, 2.5, -4.5, 3.25),
            xy_trial(2, 0.0, 0.0, 29.0).with_value(f64::NAN),
            FrozenTrial::new(3, TrialState::Failed)
                .with_param("x1", Distribution::uniform(-10.0, 10.0), 4.0)
                .with_param("x2", Distribution::uniform(-10.0, 10.0), 4.0),
            running(4),
        ],
    };
    let factory = RecordingFactory::default();
    let sampler = BayesOptSampler::builder()
        .seed(0)
        .factory(factory.clone())
        .build();

    let params = sampler
        .sample_relative(&history, &running(4), &xy_space())
        .unwrap();

    factory.recorded(|r| {
        assert_eq!(r.params, vec!["x1", "x2"]);
        assert_eq!(
            r.observations,
            vec![(vec![1.0, -3.0], 10.0), (vec![2.5, -4.5], 3.25)]
        );
    });

    let mut keys: Vec<&str> = params.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["x1", "x2"]);
    for v in params.values() {
        assert!((-10.0..=10.0).contains(v), "{v} out of [-10, 10]");
    }
}

#[test]
fn test_gp_proposals_stay_within_bounds() {
    let mut trials = Vec::new();
    let mut rng = fastrand::Rng::with_seed(3);
    for id in 0..15 {
        let x1 = rng.f64() * 20.0 - 10.0;
        let x2 = rng.f64() * 20.0 - 10.0;
        trials.push(xy_trial(id, x1, x2, quadratic(x1, x2)));
    }
    let history = History {
        direction: Direction::Minimize,
        trials,
    };

    let sampler = BayesOptSampler::with_seed(11);
    for id in 15..20 {
        let params = sampler
            .sample_relative(&history, &running(id), &xy_space())
            .unwrap();
        assert_eq!(params.len(), 2);
        for v in params.values() {
            assert!((-10.0..=10.0).contains(v), "{v} out of [-10, 10]");
        }
    }
}

#[test]
fn test_same_seed_same_proposal() {
    let mut trials = Vec::new();
    for id in 0..12u32 {
        let x1 = f64::from(id) - 6.0;
        let x2 = 8.0 - f64::from(id);
        trials.push(xy_trial(u64::from(id), x1, x2, quadratic(x1, x2)));
    }
    let history = History {
        direction: Direction::Minimize,
        trials,
    };

    let a = BayesOptSampler::with_seed(42);
    let b = BayesOptSampler::with_seed(42);
    for id in 12..15 {
        let pa = a
            .sample_relative(&history, &running(id), &xy_space())
            .unwrap();
        let pb = b
            .sample_relative(&history, &running(id), &xy_space())
            .unwrap();
        assert_eq!(pa, pb);
    }
}

#[test]
fn test_each_call_draws_a_fresh_seed() {
    let history = History {
        direction: Direction::Minimize,
        trials: vec![xy_trial(0, 1.0, 1.0, 1.0)],
    };
    let fa = RecordingFactory::default();
    let fb = RecordingFactory::default();
    let a = BayesOptSampler::builder().seed(5).factory(fa.clone()).build();
    let b = BayesOptSampler::builder().seed(5).factory(fb.clone()).build();

    for id in 1..4 {
        a.sample_relative(&history, &running(id), &xy_space())
            .unwrap();
        b.sample_relative(&history, &running(id), &xy_space())
            .unwrap();
    }

    let seeds_a = fa.recorded(|r| r.seeds.clone());
    let seeds_b = fb.recorded(|r| r.seeds.clone());
    assert_eq!(seeds_a.len(), 3);
    assert_eq!(seeds_a, seeds_b);
    assert_ne!(seeds_a[0], seeds_a[1]);
}

#[test]
fn test_settings_are_passed_through_unchanged() {
    let history = History {
        direction: Direction::Minimize,
        trials: Vec::new(),
    };
    let factory = RecordingFactory::default();
    let sampler = BayesOptSampler::builder()
        .factory(factory.clone())
        .setting(3)
        .setting(1)
        .build();
    assert_eq!(sampler.settings(), &[3, 1]);

    sampler
        .sample_relative(&history, &running(0), &xy_space())
        .unwrap();
    sampler
        .sample_relative(&history, &running(1), &xy_space())
        .unwrap();

    factory.recorded(|r| assert_eq!(r.settings, vec![vec![3, 1], vec![3, 1]]));
}

#[test]
fn test_storage_failure_is_propagated() {
    let history = BrokenHistory::default();
    let factory = RecordingFactory::default();
    let sampler = BayesOptSampler::builder().factory(factory.clone()).build();

    let err = sampler
        .sample_relative(&history, &running(0), &xy_space())
        .unwrap_err();

    assert!(matches!(err, Error::Storage(_)), "unexpected error: {err}");
    assert_eq!(*history.reads.lock().unwrap(), 1);
    factory.recorded(|r| assert!(r.seeds.is_empty(), "no optimizer should be built"));
}

#[test]
fn test_empty_search_space_returns_empty_without_reading_history() {
    let history = BrokenHistory::default();
    let sampler = BayesOptSampler::with_seed(0);

    let params = sampler
        .sample_relative(&history, &running(0), &SearchSpace::new())
        .unwrap();

    assert!(params.is_empty());
    assert_eq!(*history.reads.lock().unwrap(), 0);
}

#[test]
fn test_unsupported_only_space_is_treated_as_empty() {
    let history = BrokenHistory::default();
    let sampler = BayesOptSampler::with_seed(0);
    let space = SearchSpace::from([
        ("lr".to_owned(), Distribution::log_uniform(1e-5, 1e-1)),
        ("layers".to_owned(), Distribution::int_uniform(1, 8)),
        ("act".to_owned(), Distribution::categorical(["relu", "tanh"])),
    ]);

    let params = sampler
        .sample_relative(&history, &running(0), &space)
        .unwrap();

    assert!(params.is_empty());
    assert_eq!(*history.reads.lock().unwrap(), 0);
}

#[test]
fn test_mixed_space_proposes_uniform_dimensions_only() {
    let trial = FrozenTrial::complete(0, 2.0)
        .with_param("x", Distribution::uniform(0.0, 1.0), 0.5)
        .with_param("n", Distribution::int_uniform(1, 4), 2_i64)
        .with_param("act", Distribution::categorical(["relu", "tanh"]), "relu");
    let history = History {
        direction: Direction::Minimize,
        trials: vec![trial],
    };
    let space = SearchSpace::from([
        ("x".to_owned(), Distribution::uniform(0.0, 1.0)),
        ("n".to_owned(), Distribution::int_uniform(1, 4)),
        ("act".to_owned(), Distribution::categorical(["relu", "tanh"])),
    ]);
    let factory = RecordingFactory::default();
    let sampler = BayesOptSampler::builder().factory(factory.clone()).build();

    let params = sampler.sample_relative(&history, &running(1), &space).unwrap();

    assert_eq!(params, HashMap::from([("x".to_owned(), 0.5)]));
    factory.recorded(|r| {
        assert_eq!(r.params, vec!["x"]);
        assert_eq!(r.observations, vec![(vec![0.5], 2.0)]);
    });
}

#[test]
fn test_out_of_bounds_history_is_excluded() {
    let stale = FrozenTrial::complete(1, 0.5)
        .with_param("x1", Distribution::uniform(-20.0, 20.0), 15.0)
        .with_param("x2", Distribution::uniform(-10.0, 10.0), 0.0);
    let history = History {
        direction: Direction::Minimize,
        trials: vec![xy_trial(0, 1.0, -3.0, 10.0), stale],
    };
    let factory = RecordingFactory::default();
    let sampler = BayesOptSampler::builder().factory(factory.clone()).build();

    sampler
        .sample_relative(&history, &running(2), &xy_space())
        .unwrap();

    factory.recorded(|r| assert_eq!(r.observations, vec![(vec![1.0, -3.0], 10.0)]));
}

#[test]
fn test_maximize_negates_logged_values() {
    let history = History {
        direction: Direction::Maximize,
        trials: vec![xy_trial(0, 1.0, -3.0, 10.0), xy_trial(1, 2.5, -4.5, -3.25)],
    };
    let factory = RecordingFactory::default();
    let sampler = BayesOptSampler::builder().factory(factory.clone()).build();

    sampler
        .sample_relative(&history, &running(2), &xy_space())
        .unwrap();

    factory.recorded(|r| {
        let values: Vec<f64> = r.observations.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![-10.0, 3.25]);
    });
}

#[test]
fn test_optimizer_failure_is_propagated() {
    let history = History {
        direction: Direction::Minimize,
        trials: Vec::new(),
    };
    let sampler = BayesOptSampler::builder()
        .factory(RecordingFactory::replying(Reply::Fail))
        .build();

    let err = sampler
        .sample_relative(&history, &running(0), &xy_space())
        .unwrap_err();
    assert!(matches!(err, Error::Optimizer(_)), "unexpected error: {err}");
}

#[test]
fn test_short_proposal_is_rejected() {
    let history = History {
        direction: Direction::Minimize,
        trials: Vec::new(),
    };
    let sampler = BayesOptSampler::builder()
        .factory(RecordingFactory::replying(Reply::Short))
        .build();

    let err = sampler
        .sample_relative(&history, &running(0), &xy_space())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 2,
            got: 0
        }
    ));
}

fn sorted_points(results: &[HashMap<String, f64>]) -> Vec<[f64; 2]> {
    let mut points: Vec<[f64; 2]> = results.iter().map(|p| [p["x1"], p["x2"]]).collect();
    points.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    points
}

#[test]
fn test_concurrent_calls_match_serial_calls() {
    let mut trials = Vec::new();
    for id in 0..12u32 {
        let x1 = f64::from(id) - 5.0;
        let x2 = f64::from(id % 4) * 2.0;
        trials.push(xy_trial(u64::from(id), x1, x2, quadratic(x1, x2)));
    }
    let history = History {
        direction: Direction::Minimize,
        trials,
    };
    let space = xy_space();
    let n_calls = 6;

    let serial_sampler = BayesOptSampler::with_seed(3);
    let serial: Vec<HashMap<String, f64>> = (0..n_calls)
        .map(|i| {
            serial_sampler
                .sample_relative(&history, &running(100 + i), &space)
                .unwrap()
        })
        .collect();

    let sampler = BayesOptSampler::with_seed(3);
    let concurrent: Vec<HashMap<String, f64>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..n_calls)
            .map(|i| {
                let sampler = &sampler;
                let history = &history;
                let space = &space;
                s.spawn(move || {
                    sampler
                        .sample_relative(history, &running(100 + i), space)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Threads may take the lock in any order, but every call must consume
    // exactly one seed and finish before the next one starts.
    assert_eq!(concurrent.len(), n_calls as usize);
    assert_eq!(sorted_points(&concurrent), sorted_points(&serial));
    for params in &concurrent {
        for v in params.values() {
            assert!((-10.0..=10.0).contains(v));
        }
    }
}

#[test]
fn test_study_uses_relative_proposals() {
    let sampler = BayesOptSampler::builder()
        .seed(1)
        .setting(GpOption::StartupTrials(4))
        .build();
    let study = Study::builder()
        .minimize()
        .sampler(RandomSampler::with_seed(1))
        .relative_sampler(sampler)
        .build();

    let mut proposed = 0;
    study
        .optimize(10, |trial: &mut Trial| {
            let x1 = trial.suggest_float("x1", -10.0, 10.0)?;
            let x2 = trial.suggest_float("x2", -10.0, 10.0)?;
            if !trial.relative_params().is_empty() {
                proposed += 1;
                assert_eq!(trial.relative_params()["x1"], x1);
                assert_eq!(trial.relative_params()["x2"], x2);
            }
            Ok::<_, Error>(quadratic(x1, x2))
        })
        .unwrap();

    // The first trial has no intersection search space yet.
    assert_eq!(proposed, 9);
}
