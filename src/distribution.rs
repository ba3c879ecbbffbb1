//! Search-space distributions.
//!
//! A [`Distribution`] describes the domain a single parameter is sampled
//! from. Samplers receive it on every call and must return a
//! [`ParamValue`] of the matching variant.

use crate::error::{Error, Result};
use crate::param::ParamValue;

/// A floating-point range, optionally log-scaled or discretized.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatDistribution {
    /// Inclusive lower bound.
    pub low: f64,
    /// Inclusive upper bound.
    pub high: f64,
    /// Sample uniformly in log space.
    pub log_scale: bool,
    /// Quantization step, counted from `low`.
    pub step: Option<f64>,
}

/// An integer range, optionally log-scaled or stepped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntDistribution {
    /// Inclusive lower bound.
    pub low: i64,
    /// Inclusive upper bound.
    pub high: i64,
    /// Sample uniformly in log space.
    pub log_scale: bool,
    /// Step between admissible values, counted from `low`.
    pub step: Option<i64>,
}

/// A choice among `n_choices` unordered categories.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoricalDistribution {
    /// Number of categories; sampled values are indices in `0..n_choices`.
    pub n_choices: usize,
}

/// The domain of a single parameter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distribution {
    /// A float range.
    Float(FloatDistribution),
    /// An integer range.
    Int(IntDistribution),
    /// A categorical choice.
    Categorical(CategoricalDistribution),
}

impl Distribution {
    /// Checks that the bounds, log flag, and step are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] when `low > high` (or a float bound is
    /// not finite), [`Error::InvalidLogBounds`] for log-scaled ranges that
    /// start at or below zero (below one for integers),
    /// [`Error::InvalidStep`] for non-positive steps or steps combined with
    /// log scale, and [`Error::EmptyChoices`] for zero categories.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Float(d) => {
                if !d.low.is_finite() || !d.high.is_finite() || d.low > d.high {
                    return Err(Error::InvalidBounds {
                        low: d.low,
                        high: d.high,
                    });
                }
                if d.log_scale && d.low <= 0.0 {
                    return Err(Error::InvalidLogBounds);
                }
                if let Some(step) = d.step
                    && (d.log_scale || !step.is_finite() || step <= 0.0)
                {
                    return Err(Error::InvalidStep);
                }
            }
            Self::Int(d) => {
                if d.low > d.high {
                    return Err(Error::InvalidBounds {
                        low: d.low as f64,
                        high: d.high as f64,
                    });
                }
                if d.log_scale && d.low < 1 {
                    return Err(Error::InvalidLogBounds);
                }
                if let Some(step) = d.step
                    && (d.log_scale || step <= 0)
                {
                    return Err(Error::InvalidStep);
                }
            }
            Self::Categorical(d) => {
                if d.n_choices == 0 {
                    return Err(Error::EmptyChoices);
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if `value` has the matching variant and lies inside
    /// this distribution's domain.
    #[must_use]
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (Self::Float(d), ParamValue::Float(v)) => *v >= d.low && *v <= d.high,
            (Self::Int(d), ParamValue::Int(v)) => {
                *v >= d.low
                    && *v <= d.high
                    && d.step.is_none_or(|s| s > 0 && v.abs_diff(d.low) % s.unsigned_abs() == 0)
            }
            (Self::Categorical(d), ParamValue::Categorical(i)) => *i < d.n_choices,
            _ => false,
        }
    }
}
