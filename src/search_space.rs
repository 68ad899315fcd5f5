//! Search spaces and the intersection search space used for relative sampling.

use std::collections::BTreeMap;

use crate::distribution::Distribution;
use crate::trial::FrozenTrial;
use crate::types::TrialState;

/// Mapping of parameter name to the distribution it is drawn from.
///
/// Ordered by name, so every consumer walks the dimensions in the same order.
pub type SearchSpace = BTreeMap<String, Distribution>;

/// Returns the parameters shared by every complete trial.
///
/// A parameter belongs to the intersection when each complete trial
/// recorded it with the same distribution. Non-complete trials are ignored.
/// The result is empty when no trial has completed yet.
///
/// # Examples
///
/// ```
/// use bayesopt_sampler::{Distribution, FrozenTrial, intersection_search_space};
///
/// let a = FrozenTrial::complete(0, 1.0)
///     .with_param("x", Distribution::uniform(0.0, 1.0), 0.5)
///     .with_param("y", Distribution::uniform(0.0, 1.0), 0.5);
/// let b = FrozenTrial::complete(1, 2.0).with_param("x", Distribution::uniform(0.0, 1.0), 0.1);
///
/// let space = intersection_search_space(&[a, b]);
/// assert_eq!(space.keys().collect::<Vec<_>>(), vec!["x"]);
/// ```
#[must_use]
pub fn intersection_search_space(trials: &[FrozenTrial]) -> SearchSpace {
    let mut complete = trials.iter().filter(|t| t.state == TrialState::Complete);

    let Some(first) = complete.next() else {
        return SearchSpace::new();
    };

    let mut space: SearchSpace = first
        .distributions
        .iter()
        .map(|(name, d)| (name.clone(), d.clone()))
        .collect();

    for trial in complete {
        space.retain(|name, d| trial.distributions.get(name) == Some(d));
        if space.is_empty() {
            break;
        }
    }

    space
}
