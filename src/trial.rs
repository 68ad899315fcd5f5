//! Trial types: the running [`Trial`] handle and the immutable [`FrozenTrial`] record.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::sampler::Sampler;
use crate::search_space::SearchSpace;
use crate::types::TrialState;

/// An immutable snapshot of a trial, as stored in the study history.
///
/// Parameters are keyed by name and kept in their external representation.
/// `distributions` records which distribution each parameter was drawn
/// from, so a sampler can check whether an old value is still legal.
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::{Distribution, FrozenTrial, TrialState};
///
/// let trial = FrozenTrial::complete(0, 10.0)
///     .with_param("x1", Distribution::uniform(-10.0, 10.0), 1.0)
///     .with_param("x2", Distribution::uniform(-10.0, 10.0), -3.0);
///
/// assert_eq!(trial.state, TrialState::Complete);
/// assert_eq!(trial.params.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrozenTrial {
    /// The unique identifier for this trial.
    pub id: u64,
    /// The state the trial was in when the snapshot was taken.
    pub state: TrialState,
    /// The objective value. Only complete trials carry one.
    pub value: Option<f64>,
    /// The suggested parameter values, keyed by name.
    pub params: HashMap<String, ParamValue>,
    /// The distribution each parameter was drawn from, keyed by name.
    pub distributions: HashMap<String, Distribution>,
}

impl FrozenTrial {
    /// Creates a trial record with no parameters and no value.
    #[must_use]
    pub fn new(id: u64, state: TrialState) -> Self {
        Self {
            id,
            state,
            value: None,
            params: HashMap::new(),
            distributions: HashMap::new(),
        }
    }

    /// Creates a complete trial record with the given objective value.
    #[must_use]
    pub fn complete(id: u64, value: f64) -> Self {
        Self::new(id, TrialState::Complete).with_value(value)
    }

    /// Sets the objective value.
    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Records a parameter together with its distribution.
    #[must_use]
    pub fn with_param(
        mut self,
        name: impl Into<String>,
        distribution: Distribution,
        value: impl Into<ParamValue>,
    ) -> Self {
        let name = name.into();
        self.distributions.insert(name.clone(), distribution);
        self.params.insert(name, value.into());
        self
    }

    /// Returns the external value of the named parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }
}

/// A trial represents a single evaluation of the objective function.
///
/// Trials created by [`Study::ask`](crate::Study::ask) carry the study's
/// independent sampler, a snapshot of the history, and any values the
/// relative sampler proposed for this trial. The `suggest_*` methods use a
/// relative value when one exists for the requested parameter and
/// distribution, and the independent sampler otherwise.
#[derive(Clone)]
pub struct Trial {
    id: u64,
    state: TrialState,
    params: HashMap<String, ParamValue>,
    distributions: HashMap<String, Distribution>,
    relative_search_space: SearchSpace,
    relative_params: HashMap<String, f64>,
    sampler: Option<Arc<dyn Sampler>>,
    history: Arc<Vec<FrozenTrial>>,
}

impl core::fmt::Debug for Trial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trial")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("params", &self.params)
            .field("distributions", &self.distributions)
            .field("relative_params", &self.relative_params)
            .field("has_sampler", &self.sampler.is_some())
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl Trial {
    /// Creates a new trial with the given ID.
    ///
    /// The trial starts in the `Running` state with no parameters and no
    /// sampler, so suggestions fall back to uniform random sampling.
    ///
    /// # Examples
    ///
    /// ```
    /// use bayesopt_sampler::Trial;
    ///
    /// let mut trial = Trial::new(0);
    /// let x = trial.suggest_float("x", 0.0, 1.0).unwrap();
    /// assert!((0.0..=1.0).contains(&x));
    /// ```
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: TrialState::Running,
            params: HashMap::new(),
            distributions: HashMap::new(),
            relative_search_space: SearchSpace::new(),
            relative_params: HashMap::new(),
            sampler: None,
            history: Arc::new(Vec::new()),
        }
    }

    /// Creates a trial wired to an independent sampler and a history snapshot.
    pub(crate) fn with_sampler(
        id: u64,
        sampler: Arc<dyn Sampler>,
        history: Arc<Vec<FrozenTrial>>,
    ) -> Self {
        Self {
            sampler: Some(sampler),
            history,
            ..Self::new(id)
        }
    }

    /// Installs the values proposed by a relative sampler.
    pub(crate) fn set_relative(
        &mut self,
        search_space: SearchSpace,
        params: HashMap<String, f64>,
    ) {
        self.relative_search_space = search_space;
        self.relative_params = params;
    }

    /// Returns the unique ID of this trial.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current state of this trial.
    #[must_use]
    pub fn state(&self) -> TrialState {
        self.state
    }

    /// Returns the suggested parameters, keyed by name.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, ParamValue> {
        &self.params
    }

    /// Returns the parameter distributions, keyed by name.
    #[must_use]
    pub fn distributions(&self) -> &HashMap<String, Distribution> {
        &self.distributions
    }

    /// Returns the values proposed by the relative sampler for this trial.
    ///
    /// Empty when no relative sampler is configured or it had nothing to
    /// propose yet.
    #[must_use]
    pub fn relative_params(&self) -> &HashMap<String, f64> {
        &self.relative_params
    }

    /// Suggests a value for `name` drawn from `distribution`.
    ///
    /// Suggesting the same name twice with an equal distribution returns the
    /// first value again.
    ///
    /// # Errors
    ///
    /// Returns an error if the distribution is invalid or `name` was already
    /// suggested with a different distribution.
    pub fn suggest(&mut self, name: &str, distribution: Distribution) -> Result<ParamValue> {
        distribution.validate()?;

        if let Some(existing) = self.distributions.get(name) {
            if *existing == distribution
                && let Some(value) = self.params.get(name)
            {
                return Ok(value.clone());
            }
            return Err(Error::ParameterConflict {
                name: name.to_owned(),
                reason: "parameter was previously suggested with a different distribution"
                    .to_owned(),
            });
        }

        let value = match self.relative_value(name, &distribution) {
            Some(value) => value,
            None => self.sample_independent(&distribution),
        };

        self.distributions.insert(name.to_owned(), distribution);
        self.params.insert(name.to_owned(), value.clone());
        Ok(value)
    }

    /// Suggests a float from a uniform distribution over `[low, high]`.
    ///
    /// # Errors
    ///
    /// See [`suggest`](Self::suggest).
    pub fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> Result<f64> {
        let distribution = Distribution::uniform(low, high);
        self.suggest_f64(name, distribution)
    }

    /// Suggests a float from a log-uniform distribution over `[low, high]`.
    ///
    /// # Errors
    ///
    /// See [`suggest`](Self::suggest).
    pub fn suggest_log_float(&mut self, name: &str, low: f64, high: f64) -> Result<f64> {
        let distribution = Distribution::log_uniform(low, high);
        self.suggest_f64(name, distribution)
    }

    /// Suggests a float from `[low, high]` on a grid of step `q`.
    ///
    /// # Errors
    ///
    /// See [`suggest`](Self::suggest).
    pub fn suggest_discrete_float(
        &mut self,
        name: &str,
        low: f64,
        high: f64,
        q: f64,
    ) -> Result<f64> {
        let distribution = Distribution::discrete_uniform(low, high, q);
        self.suggest_f64(name, distribution)
    }

    /// Suggests an integer from `[low, high]`.
    ///
    /// # Errors
    ///
    /// See [`suggest`](Self::suggest).
    pub fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> Result<i64> {
        let distribution = Distribution::int_uniform(low, high);
        match self.suggest(name, distribution.clone())? {
            ParamValue::Int(v) => Ok(v),
            other => Err(mismatch(&distribution, &other)),
        }
    }

    /// Suggests one of `choices`.
    ///
    /// # Errors
    ///
    /// See [`suggest`](Self::suggest).
    pub fn suggest_categorical(&mut self, name: &str, choices: &[&str]) -> Result<String> {
        let distribution = Distribution::categorical(choices.iter().copied());
        match self.suggest(name, distribution.clone())? {
            ParamValue::Categorical(v) => Ok(v),
            other => Err(mismatch(&distribution, &other)),
        }
    }

    fn suggest_f64(&mut self, name: &str, distribution: Distribution) -> Result<f64> {
        match self.suggest(name, distribution.clone())? {
            ParamValue::Float(v) => Ok(v),
            other => Err(mismatch(&distribution, &other)),
        }
    }

    /// Returns the relative sampler's value for `name`, if it applies to `distribution`.
    fn relative_value(&self, name: &str, distribution: &Distribution) -> Option<ParamValue> {
        if self.relative_search_space.get(name) != Some(distribution) {
            return None;
        }
        let internal = *self.relative_params.get(name)?;
        if !distribution.contains(internal) {
            return None;
        }
        distribution.to_external(internal).ok()
    }

    fn sample_independent(&self, distribution: &Distribution) -> ParamValue {
        if let Some(sampler) = &self.sampler {
            sampler.sample(distribution, self.id, &self.history)
        } else {
            use crate::sampler::random::RandomSampler;
            RandomSampler::new().sample(distribution, self.id, &[])
        }
    }

    pub(crate) fn set_state(&mut self, state: TrialState) {
        self.state = state;
    }

    /// Freezes the trial into a history record.
    pub(crate) fn into_frozen(self, value: Option<f64>) -> FrozenTrial {
        FrozenTrial {
            id: self.id,
            state: self.state,
            value,
            params: self.params,
            distributions: self.distributions,
        }
    }
}

fn mismatch(distribution: &Distribution, value: &ParamValue) -> Error {
    Error::Conversion {
        value: format!("{value:?}"),
        kind: distribution.kind(),
        reason: "sampler returned a value of the wrong type",
    }
}
