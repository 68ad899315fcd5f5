//! Minimize a two-dimensional quadratic with the GP relative sampler.
//!
//! f(x1, x2) = (x1 - 2)² + (x2 + 5)², minimum 0 at (2, -5).
//!
//! Run with: `cargo run --example quadratic`
//! Add `--features tracing` and a subscriber to see sampling events.

use bayesopt_sampler::prelude::*;

fn main() {
    let sampler = BayesOptSampler::builder()
        .setting(GpOption::StartupTrials(10))
        .build();
    let study = Study::builder().minimize().relative_sampler(sampler).build();

    study
        .optimize(50, |trial: &mut Trial| {
            let x1 = trial.suggest_float("x1", -10.0, 10.0)?;
            let x2 = trial.suggest_float("x2", -10.0, 10.0)?;
            Ok::<_, Error>((x1 - 2.0).powi(2) + (x2 + 5.0).powi(2))
        })
        .unwrap();

    let best = study.best_trial().unwrap();
    println!("Best trial #{}", best.id);
    for name in ["x1", "x2"] {
        if let Some(ParamValue::Float(v)) = best.param(name) {
            println!("  {name} = {v:.4}");
        }
    }
    println!("  f     = {:.4}", best.value.unwrap_or(f64::NAN));
}
