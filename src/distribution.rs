//! Parameter distribution types.
//!
//! A [`Distribution`] records the legal range of one parameter. Trials keep
//! the distribution each parameter was drawn from next to its value, which
//! is what lets samplers validate historical values later on.
//!
//! Every distribution has two value representations:
//!
//! - the **external** one ([`ParamValue`]) that objective functions see, and
//! - the **internal** one (`f64`) used for bounds checks and numerical work.
//!
//! [`Distribution::to_internal`] and [`Distribution::to_external`] convert
//! between them.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::param::ParamValue;

/// Continuous distribution over `[low, high]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UniformDistribution {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
}

impl UniformDistribution {
    /// Returns `true` if `x` lies within `[low, high]`.
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        self.low <= x && x <= self.high
    }
}

/// Continuous distribution over `[low, high]`, sampled in log space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogUniformDistribution {
    /// Lower bound (inclusive, strictly positive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
}

/// Integer distribution over `[low, high]`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntUniformDistribution {
    /// Lower bound (inclusive).
    pub low: i64,
    /// Upper bound (inclusive).
    pub high: i64,
}

/// Continuous distribution over `[low, high]` discretized with step `q`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscreteUniformDistribution {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
    /// Discretization step.
    pub q: f64,
}

/// Distribution over a fixed set of labels.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoricalDistribution {
    /// The available labels. The internal representation is the index.
    pub choices: Vec<String>,
}

/// Enum wrapping all parameter distribution types.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Distribution {
    /// A continuous uniform distribution.
    Uniform(UniformDistribution),
    /// A continuous log-uniform distribution.
    LogUniform(LogUniformDistribution),
    /// An integer uniform distribution.
    IntUniform(IntUniformDistribution),
    /// A discretized uniform distribution.
    DiscreteUniform(DiscreteUniformDistribution),
    /// A categorical distribution.
    Categorical(CategoricalDistribution),
}

/// Discriminant of a [`Distribution`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistributionKind {
    /// [`Distribution::Uniform`].
    Uniform,
    /// [`Distribution::LogUniform`].
    LogUniform,
    /// [`Distribution::IntUniform`].
    IntUniform,
    /// [`Distribution::DiscreteUniform`].
    DiscreteUniform,
    /// [`Distribution::Categorical`].
    Categorical,
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uniform => "uniform",
            Self::LogUniform => "log-uniform",
            Self::IntUniform => "int-uniform",
            Self::DiscreteUniform => "discrete-uniform",
            Self::Categorical => "categorical",
        };
        f.write_str(name)
    }
}

impl Distribution {
    /// Shorthand for a [`Distribution::Uniform`] over `[low, high]`.
    #[must_use]
    pub fn uniform(low: f64, high: f64) -> Self {
        Self::Uniform(UniformDistribution { low, high })
    }

    /// Shorthand for a [`Distribution::LogUniform`] over `[low, high]`.
    #[must_use]
    pub fn log_uniform(low: f64, high: f64) -> Self {
        Self::LogUniform(LogUniformDistribution { low, high })
    }

    /// Shorthand for a [`Distribution::IntUniform`] over `[low, high]`.
    #[must_use]
    pub fn int_uniform(low: i64, high: i64) -> Self {
        Self::IntUniform(IntUniformDistribution { low, high })
    }

    /// Shorthand for a [`Distribution::DiscreteUniform`] over `[low, high]` with step `q`.
    #[must_use]
    pub fn discrete_uniform(low: f64, high: f64, q: f64) -> Self {
        Self::DiscreteUniform(DiscreteUniformDistribution { low, high, q })
    }

    /// Shorthand for a [`Distribution::Categorical`] over `choices`.
    #[must_use]
    pub fn categorical<S: Into<String>>(choices: impl IntoIterator<Item = S>) -> Self {
        Self::Categorical(CategoricalDistribution {
            choices: choices.into_iter().map(Into::into).collect(),
        })
    }

    /// Returns the variant discriminant.
    #[must_use]
    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Uniform(_) => DistributionKind::Uniform,
            Self::LogUniform(_) => DistributionKind::LogUniform,
            Self::IntUniform(_) => DistributionKind::IntUniform,
            Self::DiscreteUniform(_) => DistributionKind::DiscreteUniform,
            Self::Categorical(_) => DistributionKind::Categorical,
        }
    }

    /// Checks that the distribution describes a non-empty range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`], [`Error::InvalidLogBounds`],
    /// [`Error::InvalidStep`], or [`Error::EmptyChoices`].
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Uniform(d) => check_bounds(d.low, d.high),
            Self::LogUniform(d) => {
                check_bounds(d.low, d.high)?;
                if d.low <= 0.0 {
                    return Err(Error::InvalidLogBounds);
                }
                Ok(())
            }
            Self::IntUniform(d) => check_bounds(d.low as f64, d.high as f64),
            Self::DiscreteUniform(d) => {
                check_bounds(d.low, d.high)?;
                if d.q.is_nan() || d.q <= 0.0 {
                    return Err(Error::InvalidStep);
                }
                Ok(())
            }
            Self::Categorical(d) => {
                if d.choices.is_empty() {
                    return Err(Error::EmptyChoices);
                }
                Ok(())
            }
        }
    }

    /// Returns `true` if the internal value `x` is a legal point of this distribution.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        match self {
            Self::Uniform(d) => d.contains(x),
            Self::LogUniform(d) => d.low <= x && x <= d.high,
            Self::IntUniform(d) => x.fract() == 0.0 && d.low as f64 <= x && x <= d.high as f64,
            Self::DiscreteUniform(d) => d.low <= x && x <= d.high,
            Self::Categorical(d) => x.fract() == 0.0 && 0.0 <= x && x < d.choices.len() as f64,
        }
    }

    /// Returns `true` if the distribution admits exactly one value.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn single(&self) -> bool {
        match self {
            Self::Uniform(d) => d.low == d.high,
            Self::LogUniform(d) => d.low == d.high,
            Self::IntUniform(d) => d.low == d.high,
            Self::DiscreteUniform(d) => d.high - d.low < d.q,
            Self::Categorical(d) => d.choices.len() == 1,
        }
    }

    /// Converts an external value into its internal `f64` representation.
    ///
    /// Float distributions map `Float(v)` to `v`, integer distributions map
    /// `Int(v)` to `v as f64`, and categorical distributions map a label to
    /// its index in `choices`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] when the value variant does not match the
    /// distribution or a label is not among the choices.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_internal(&self, value: &ParamValue) -> Result<f64> {
        match (self, value) {
            (
                Self::Uniform(_) | Self::LogUniform(_) | Self::DiscreteUniform(_),
                ParamValue::Float(v),
            ) => Ok(*v),
            (Self::IntUniform(_), ParamValue::Int(v)) => Ok(*v as f64),
            (Self::Categorical(d), ParamValue::Categorical(label)) => d
                .choices
                .iter()
                .position(|c| c == label)
                .map(|i| i as f64)
                .ok_or_else(|| self.conversion_error(value, "label is not one of the choices")),
            _ => Err(self.conversion_error(value, "value type does not match distribution")),
        }
    }

    /// Converts an internal `f64` back into the external representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] when `internal` is not finite or, for
    /// categorical distributions, is not a valid choice index.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn to_external(&self, internal: f64) -> Result<ParamValue> {
        if !internal.is_finite() {
            return Err(self.conversion_error(&ParamValue::Float(internal), "value is not finite"));
        }
        match self {
            Self::Uniform(_) | Self::LogUniform(_) | Self::DiscreteUniform(_) => {
                Ok(ParamValue::Float(internal))
            }
            Self::IntUniform(_) => Ok(ParamValue::Int(internal.round() as i64)),
            Self::Categorical(d) => {
                if !self.contains(internal) {
                    return Err(self.conversion_error(
                        &ParamValue::Float(internal),
                        "index is out of range",
                    ));
                }
                Ok(ParamValue::Categorical(d.choices[internal as usize].clone()))
            }
        }
    }

    fn conversion_error(&self, value: &ParamValue, reason: &'static str) -> Error {
        Error::Conversion {
            value: format!("{value:?}"),
            kind: self.kind(),
            reason,
        }
    }
}

fn check_bounds(low: f64, high: f64) -> Result<()> {
    if low.is_nan() || high.is_nan() || low > high {
        return Err(Error::InvalidBounds { low, high });
    }
    Ok(())
}
