//! History-filtering view over another storage.
//!
//! [`FilteredStorage`] is how the successive-halving sampler hides every
//! trial outside the active arm from its base sampler. It forwards the whole
//! [`Storage`] surface to the wrapped backend, overriding only the history
//! queries and the study direction.

use std::collections::HashMap;

use super::{Storage, StudySummary};
use crate::distribution::Distribution;
use crate::error::Result;
use crate::param::ParamValue;
use crate::trial::{AttrValue, FrozenTrial};
use crate::types::{Direction, TrialState};

/// A [`Storage`] that reports a fixed trial list as the study's full history.
///
/// Overrides:
///
/// - [`get_all_trials`](Storage::get_all_trials) returns the filtered trials,
///   in the order they were given.
/// - [`get_n_trials`](Storage::get_n_trials) counts the filtered trials
///   (optionally by state), not the backend's.
/// - [`get_study_direction`](Storage::get_study_direction) always reports
///   [`Direction::Minimize`].
///
/// The overrides do not look at the study id: a view is built for exactly
/// one study. Everything else, writes included, goes to the wrapped storage
/// and its errors come back unchanged.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{Direction, FilteredStorage, MemoryStorage, Storage};
///
/// let backend = MemoryStorage::new();
/// let study = backend.create_new_study(None).unwrap();
/// backend.set_study_direction(study, Direction::Maximize).unwrap();
/// backend.create_new_trial(study).unwrap();
/// let in_flight = backend.create_new_trial(study).unwrap();
///
/// let view = FilteredStorage::new(&backend, vec![backend.get_trial(in_flight).unwrap()]);
/// assert_eq!(view.get_all_trials(study).unwrap().len(), 1);
/// assert_eq!(view.get_study_direction(study).unwrap(), Direction::Minimize);
/// assert_eq!(backend.get_n_trials(study, None).unwrap(), 2);
/// ```
pub struct FilteredStorage<'a> {
    inner: &'a dyn Storage,
    trials: Vec<FrozenTrial>,
}

impl<'a> FilteredStorage<'a> {
    /// Wraps `inner`, presenting `trials` as the complete trial history.
    #[must_use]
    pub fn new(inner: &'a dyn Storage, trials: Vec<FrozenTrial>) -> Self {
        Self { inner, trials }
    }

    /// The trials this view exposes.
    #[must_use]
    pub fn trials(&self) -> &[FrozenTrial] {
        &self.trials
    }
}

impl Storage for FilteredStorage<'_> {
    forward_storage! { inner;
        fn create_new_study(&self, study_name: Option<&str>) -> Result<u64>;
        fn set_study_direction(&self, study_id: u64, direction: Direction) -> Result<()>;
        fn set_study_user_attr(&self, study_id: u64, key: &str, value: AttrValue) -> Result<()>;
        fn set_study_system_attr(&self, study_id: u64, key: &str, value: AttrValue) -> Result<()>;
        fn get_study_id_from_name(&self, study_name: &str) -> Result<u64>;
        fn get_study_id_from_trial_id(&self, trial_id: u64) -> Result<u64>;
        fn get_study_name_from_id(&self, study_id: u64) -> Result<String>;
        fn get_study_user_attrs(&self, study_id: u64) -> Result<HashMap<String, AttrValue>>;
        fn get_study_system_attrs(&self, study_id: u64) -> Result<HashMap<String, AttrValue>>;
        fn get_all_study_summaries(&self) -> Result<Vec<StudySummary>>;
        fn create_new_trial(&self, study_id: u64) -> Result<u64>;
        fn set_trial_state(&self, trial_id: u64, state: TrialState) -> Result<()>;
        fn set_trial_param(
            &self,
            trial_id: u64,
            param_name: &str,
            value: ParamValue,
            distribution: Distribution
        ) -> Result<bool>;
        fn get_trial_number_from_id(&self, trial_id: u64) -> Result<u64>;
        fn get_trial_param(&self, trial_id: u64, param_name: &str) -> Result<ParamValue>;
        fn set_trial_value(&self, trial_id: u64, value: f64) -> Result<()>;
        fn set_trial_intermediate_value(
            &self,
            trial_id: u64,
            step: u64,
            value: f64
        ) -> Result<bool>;
        fn set_trial_user_attr(&self, trial_id: u64, key: &str, value: AttrValue) -> Result<()>;
        fn set_trial_system_attr(&self, trial_id: u64, key: &str, value: AttrValue) -> Result<()>;
        fn get_trial(&self, trial_id: u64) -> Result<FrozenTrial>;
    }

    fn get_study_direction(&self, _study_id: u64) -> Result<Direction> {
        Ok(Direction::Minimize)
    }

    fn get_all_trials(&self, _study_id: u64) -> Result<Vec<FrozenTrial>> {
        Ok(self.trials.clone())
    }

    fn get_n_trials(&self, _study_id: u64, state: Option<TrialState>) -> Result<usize> {
        Ok(self
            .trials
            .iter()
            .filter(|t| state.is_none_or(|s| t.state == s))
            .count())
    }
}
