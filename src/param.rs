//! Raw parameter value storage.
//!
//! [`ParamValue`] is the type-erased representation of a sampled parameter.
//! Users rarely construct it directly: the `suggest_*` methods on
//! [`Trial`](crate::Trial) return already-typed values. `ParamValue` shows up
//! when inspecting [`FrozenTrial::params`](crate::FrozenTrial) or when writing
//! a custom [`Sampler`](crate::Sampler).

/// A type-erased sampled parameter value.
///
/// For categorical parameters the `Categorical` variant stores the
/// zero-based index into the choices slice, not the choice itself.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// A floating-point value drawn from a
    /// [`FloatDistribution`](crate::FloatDistribution).
    Float(f64),
    /// An integer value drawn from an
    /// [`IntDistribution`](crate::IntDistribution).
    Int(i64),
    /// An index into the choices of a
    /// [`CategoricalDistribution`](crate::CategoricalDistribution).
    Categorical(usize),
}

impl ParamValue {
    /// Returns the float payload, or `None` for other variants.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer payload, or `None` for other variants.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the categorical index, or `None` for other variants.
    #[must_use]
    pub fn as_categorical(&self) -> Option<usize> {
        match self {
            Self::Categorical(v) => Some(*v),
            _ => None,
        }
    }
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Categorical(v) => write!(f, "category({v})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        assert_eq!(ParamValue::Float(1.5).as_float(), Some(1.5));
        assert_eq!(ParamValue::Float(1.5).as_int(), None);
        assert_eq!(ParamValue::Int(-3).as_int(), Some(-3));
        assert_eq!(ParamValue::Categorical(2).as_categorical(), Some(2));
        assert_eq!(ParamValue::Categorical(2).as_float(), None);
    }

    #[test]
    fn display() {
        assert_eq!(ParamValue::Int(4).to_string(), "4");
        assert_eq!(ParamValue::Categorical(1).to_string(), "category(1)");
    }
}
