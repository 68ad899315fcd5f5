//! Parameter value storage types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A parameter value in its external, user-facing representation.
///
/// This is what objective functions see and what trials record. Float
/// distributions store `Float`, integer distributions store `Int`, and
/// categorical distributions store the chosen label.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamValue {
    /// A floating-point parameter value.
    Float(f64),
    /// An integer parameter value.
    Int(i64),
    /// A categorical parameter value, stored as the chosen label.
    Categorical(String),
}

impl ParamValue {
    /// Returns the value as `f64` for numeric variants.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Categorical(_) => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Categorical(v.to_owned())
    }
}
