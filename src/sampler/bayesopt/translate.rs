//! Search space translation: host distributions to optimizer dimensions.

use crate::bo::ParamSpec;
use crate::distribution::Distribution;
use crate::search_space::SearchSpace;

/// Converts a search space into the optimizer's dimension list.
///
/// Every [`Distribution::Uniform`] entry becomes one continuous
/// [`ParamSpec`] bounded by `[low, high]`. Other kinds are left out without
/// error, so the optimizer only sees the dimensions it can model; the
/// trial samples the rest independently.
///
/// The result follows the search space's name order.
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::sampler::bayesopt::translate;
/// use bayesopt_sampler::{Distribution, SearchSpace};
///
/// let space = SearchSpace::from([
///     ("lr".to_owned(), Distribution::log_uniform(1e-5, 1e-1)),
///     ("x".to_owned(), Distribution::uniform(-1.0, 1.0)),
/// ]);
///
/// let specs = translate(&space);
/// assert_eq!(specs.len(), 1);
/// assert_eq!(specs[0].name(), "x");
/// ```
#[must_use]
pub fn translate(search_space: &SearchSpace) -> Vec<ParamSpec> {
    search_space
        .iter()
        .filter_map(|(name, distribution)| match distribution {
            Distribution::Uniform(d) => Some(ParamSpec::uniform(name.clone(), d.low, d.high)),
            Distribution::LogUniform(_)
            | Distribution::IntUniform(_)
            | Distribution::DiscreteUniform(_)
            | Distribution::Categorical(_) => None,
        })
        .collect()
}
