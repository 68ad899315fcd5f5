use crate::error::{Error, Result};
use crate::trial::Trial;
use crate::types::TrialState;

use super::{Study, is_trial_pruned};

impl Study {
    /// Run optimization with an objective closure.
    ///
    /// Runs `n_trials` evaluations sequentially. An objective returning
    /// [`Error::TrialPruned`] (or [`TrialPruned`](crate::TrialPruned)) prunes
    /// the trial; any other error marks it failed and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the history cannot be read or written, and
    /// `Error::NoCompletedTrials` if no trial completed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bayesopt_sampler::{Direction, Error, Study, Trial};
    ///
    /// let study = Study::new(Direction::Minimize);
    /// study
    ///     .optimize(10, |trial: &mut Trial| {
    ///         let x = trial.suggest_float("x", -10.0, 10.0)?;
    ///         Ok::<_, Error>(x * x)
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(study.n_trials(), 10);
    /// assert!(study.best_value().unwrap() >= 0.0);
    /// ```
    pub fn optimize<E>(
        &self,
        n_trials: usize,
        mut objective: impl FnMut(&mut Trial) -> core::result::Result<f64, E>,
    ) -> Result<()>
    where
        E: ToString + 'static,
    {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::info_span!("optimize", n_trials, direction = ?self.direction).entered();

        for _ in 0..n_trials {
            let mut trial = self.ask()?;
            #[cfg(feature = "tracing")]
            let trial_id = trial.id();

            match objective(&mut trial) {
                Ok(value) => {
                    self.complete_trial(trial, value)?;
                    trace_info!(trial_id, value, "trial completed");
                }
                Err(e) if is_trial_pruned(&e) => {
                    self.prune_trial(trial)?;
                    trace_info!(trial_id, "trial pruned");
                }
                Err(e) => self.fail_trial(trial, e)?,
            }
        }

        let has_complete = self
            .storage
            .trials()?
            .iter()
            .any(|t| t.state == TrialState::Complete);
        if !has_complete {
            return Err(Error::NoCompletedTrials);
        }

        Ok(())
    }
}
