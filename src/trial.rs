//! Trial records and the live trial handle.
//!
//! A [`FrozenTrial`] is the immutable snapshot a [`Storage`] hands out: the
//! record every sampler reads and the unit the successive-halving engine
//! assigns to arms. A [`Trial`] is the handle an objective function receives
//! from [`Study::ask`](crate::Study::ask); its `suggest_*` methods consult the
//! study's sampler and write the chosen values through to the storage.
//!
//! # Lifecycle
//!
//! 1. **Created**: the study asks the storage for a new trial id.
//! 2. **Running**: the objective suggests parameters and may report
//!    intermediate values.
//! 3. **Complete / Failed / Pruned**: the study records the outcome.

use std::collections::HashMap;
use std::sync::Arc;

use crate::distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::sampler::Sampler;
use crate::storage::Storage;
use crate::types::TrialState;

/// A user or system attribute value that can be stored on a trial or study.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    /// A floating-point attribute.
    Float(f64),
    /// An integer attribute.
    Int(i64),
    /// A string attribute.
    String(String),
    /// A boolean attribute.
    Bool(bool),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// A snapshot of one trial as stored in a [`Storage`].
///
/// `value` is `None` while the trial is running and for failed or pruned
/// trials; samplers must treat such trials as having no measurable result.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrozenTrial {
    /// Storage-wide unique id. Ids increase with creation order.
    pub id: u64,
    /// Zero-based position of the trial within its study.
    pub number: u64,
    /// Lifecycle state.
    pub state: TrialState,
    /// Final objective value, if the trial completed.
    pub value: Option<f64>,
    /// Sampled parameter values, keyed by parameter name.
    pub params: HashMap<String, ParamValue>,
    /// Distributions the parameters were drawn from, keyed by parameter name.
    pub distributions: HashMap<String, Distribution>,
    /// Intermediate objective values as `(step, value)` pairs, in report order.
    pub intermediate_values: Vec<(u64, f64)>,
    /// Attributes set by the objective.
    pub user_attrs: HashMap<String, AttrValue>,
    /// Attributes set by samplers and the library.
    pub system_attrs: HashMap<String, AttrValue>,
}

impl FrozenTrial {
    /// Creates a running trial with no parameters, value, or attributes.
    #[must_use]
    pub fn new(id: u64, number: u64) -> Self {
        Self {
            id,
            number,
            state: TrialState::Running,
            value: None,
            params: HashMap::new(),
            distributions: HashMap::new(),
            intermediate_values: Vec::new(),
            user_attrs: HashMap::new(),
            system_attrs: HashMap::new(),
        }
    }

    /// Gets a user attribute by key.
    #[must_use]
    pub fn user_attr(&self, key: &str) -> Option<&AttrValue> {
        self.user_attrs.get(key)
    }

    /// Returns the most recent intermediate value, if any was reported.
    #[must_use]
    pub fn last_intermediate_value(&self) -> Option<(u64, f64)> {
        self.intermediate_values.last().copied()
    }
}

/// A running trial handed to the objective function.
///
/// Every `suggest_*` call asks the study's sampler for a value (passing the
/// storage, so history-aware samplers can inspect past trials), then records
/// the value in the storage. Suggesting the same name twice with the same
/// domain returns the stored value.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{Direction, Study};
///
/// let study = Study::builder().direction(Direction::Minimize).build().unwrap();
/// let trial = study.ask().unwrap();
/// let x = trial.suggest_float("x", -1.0, 1.0).unwrap();
/// assert_eq!(trial.suggest_float("x", -1.0, 1.0).unwrap(), x);
/// ```
#[derive(Clone)]
pub struct Trial {
    id: u64,
    study_id: u64,
    storage: Arc<dyn Storage>,
    sampler: Arc<dyn Sampler>,
}

impl core::fmt::Debug for Trial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trial")
            .field("id", &self.id)
            .field("study_id", &self.study_id)
            .finish_non_exhaustive()
    }
}

impl Trial {
    pub(crate) fn new(
        id: u64,
        study_id: u64,
        storage: Arc<dyn Storage>,
        sampler: Arc<dyn Sampler>,
    ) -> Self {
        Self {
            id,
            study_id,
            storage,
            sampler,
        }
    }

    /// Returns the storage id of this trial.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the id of the study this trial belongs to.
    #[must_use]
    pub fn study_id(&self) -> u64 {
        self.study_id
    }

    /// Suggests a float in `[low, high]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are invalid, if `name` was already
    /// suggested with a different domain, or if the sampler or storage fails.
    pub fn suggest_float(&self, name: &str, low: f64, high: f64) -> Result<f64> {
        self.suggest_float_with(name, FloatDistribution {
            low,
            high,
            log_scale: false,
            step: None,
        })
    }

    /// Suggests a float in `[low, high]`, sampled uniformly in log space.
    ///
    /// # Errors
    ///
    /// As [`suggest_float`](Self::suggest_float); additionally `low` must be
    /// positive.
    pub fn suggest_float_log(&self, name: &str, low: f64, high: f64) -> Result<f64> {
        self.suggest_float_with(name, FloatDistribution {
            low,
            high,
            log_scale: true,
            step: None,
        })
    }

    /// Suggests a float in `[low, high]` on the grid `low + k * step`.
    ///
    /// # Errors
    ///
    /// As [`suggest_float`](Self::suggest_float); additionally `step` must be
    /// positive.
    pub fn suggest_float_step(&self, name: &str, low: f64, high: f64, step: f64) -> Result<f64> {
        self.suggest_float_with(name, FloatDistribution {
            low,
            high,
            log_scale: false,
            step: Some(step),
        })
    }

    /// Suggests an integer in `[low, high]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `low > high`, if `name` was already suggested with
    /// a different domain, or if the sampler or storage fails.
    pub fn suggest_int(&self, name: &str, low: i64, high: i64) -> Result<i64> {
        let distribution = Distribution::Int(IntDistribution {
            low,
            high,
            log_scale: false,
            step: None,
        });
        self.suggest(name, distribution)?
            .as_int()
            .ok_or(Error::InvalidSample("expected an int"))
    }

    /// Suggests one of `choices`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyChoices`] if `choices` is empty, and otherwise
    /// the same errors as [`suggest_int`](Self::suggest_int).
    pub fn suggest_categorical<T: Clone>(&self, name: &str, choices: &[T]) -> Result<T> {
        let distribution = Distribution::Categorical(CategoricalDistribution {
            n_choices: choices.len(),
        });
        let index = self
            .suggest(name, distribution)?
            .as_categorical()
            .ok_or(Error::InvalidSample("expected a categorical index"))?;
        choices
            .get(index)
            .cloned()
            .ok_or(Error::InvalidSample("categorical index out of range"))
    }

    /// Reports an intermediate objective value at `step`.
    ///
    /// Returns `false` if a value was already reported for this step; the
    /// first report is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial has already finished or the storage fails.
    pub fn report(&self, step: u64, value: f64) -> Result<bool> {
        self.storage
            .set_trial_intermediate_value(self.id, step, value)
    }

    /// Sets a user attribute on this trial.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial has already finished or the storage fails.
    pub fn set_user_attr(&self, key: &str, value: impl Into<AttrValue>) -> Result<()> {
        self.storage.set_trial_user_attr(self.id, key, value.into())
    }

    fn suggest_float_with(&self, name: &str, distribution: FloatDistribution) -> Result<f64> {
        self.suggest(name, Distribution::Float(distribution))?
            .as_float()
            .ok_or(Error::InvalidSample("expected a float"))
    }

    fn suggest(&self, name: &str, distribution: Distribution) -> Result<ParamValue> {
        distribution.validate()?;

        let current = self.storage.get_trial(self.id)?;
        if let Some(existing) = current.distributions.get(name) {
            if *existing != distribution {
                return Err(Error::ParameterConflict {
                    name: name.to_owned(),
                    reason: format!("already suggested with {existing:?}"),
                });
            }
            if let Some(value) = current.params.get(name) {
                return Ok(value.clone());
            }
        }

        let value = self.sampler.sample(
            self.storage.as_ref(),
            self.study_id,
            self.id,
            name,
            &distribution,
        )?;
        if !distribution.contains(&value) {
            return Err(Error::InvalidSample("value outside the distribution"));
        }
        self.storage
            .set_trial_param(self.id, name, value.clone(), distribution)?;
        Ok(value)
    }
}
