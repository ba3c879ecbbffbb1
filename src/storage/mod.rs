//! Trial storage backends.
//!
//! A [`Storage`] is the study backend samplers read from: it owns studies,
//! their trials, parameters, values, and attributes. Two implementations
//! ship with the crate:
//!
//! | Storage | Role |
//! |---------|------|
//! | [`MemoryStorage`] | In-process backend behind a `parking_lot::RwLock` (the default) |
//! | [`FilteredStorage`] | A view over another storage that narrows the trial history |
//!
//! # Consistency
//!
//! Samplers rebuild their state from [`Storage::get_all_trials`] on every
//! call. Implementations must return a consistent snapshot per call, ordered
//! by ascending trial id.

mod memory;

use std::collections::HashMap;

pub use memory::MemoryStorage;

use crate::distribution::Distribution;
use crate::error::Result;
use crate::param::ParamValue;
use crate::trial::{AttrValue, FrozenTrial};
use crate::types::{Direction, TrialState};

/// Implements the listed [`Storage`] methods by forwarding each call to the
/// storage held in `self.$field`.
macro_rules! forward_storage {
    ($field:ident; $(fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            fn $name(&self $(, $arg: $ty)*) -> $ret {
                self.$field.$name($($arg),*)
            }
        )*
    };
}

mod filtered;

pub use filtered::FilteredStorage;

/// Summary of one study, as listed by [`Storage::get_all_study_summaries`].
#[derive(Clone, Debug)]
pub struct StudySummary {
    /// The study id.
    pub study_id: u64,
    /// The study name.
    pub study_name: String,
    /// The optimization direction.
    pub direction: Direction,
    /// Number of trials in any state.
    pub n_trials: usize,
    /// The best completed trial according to `direction`, if any.
    pub best_trial: Option<FrozenTrial>,
    /// Study-level user attributes.
    pub user_attrs: HashMap<String, AttrValue>,
    /// Study-level system attributes.
    pub system_attrs: HashMap<String, AttrValue>,
}

/// The backend surface consumed by samplers and studies.
///
/// Every method is fallible; errors must be returned as-is so wrappers such
/// as [`FilteredStorage`] can pass them through untouched. The trait requires
/// `Send + Sync` so a storage can be shared behind `Arc<dyn Storage>`.
pub trait Storage: Send + Sync {
    /// Creates a study and returns its id. Unnamed studies get a generated name.
    ///
    /// # Errors
    ///
    /// Fails if a study with the same name already exists.
    fn create_new_study(&self, study_name: Option<&str>) -> Result<u64>;

    /// Sets the optimization direction of a study.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn set_study_direction(&self, study_id: u64, direction: Direction) -> Result<()>;

    /// Sets a study-level user attribute.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn set_study_user_attr(&self, study_id: u64, key: &str, value: AttrValue) -> Result<()>;

    /// Sets a study-level system attribute.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn set_study_system_attr(&self, study_id: u64, key: &str, value: AttrValue) -> Result<()>;

    /// Looks a study up by name.
    ///
    /// # Errors
    ///
    /// Fails if no study has this name.
    fn get_study_id_from_name(&self, study_name: &str) -> Result<u64>;

    /// Returns the study a trial belongs to.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist.
    fn get_study_id_from_trial_id(&self, trial_id: u64) -> Result<u64>;

    /// Returns the name of a study.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn get_study_name_from_id(&self, study_id: u64) -> Result<String>;

    /// Returns the optimization direction of a study.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn get_study_direction(&self, study_id: u64) -> Result<Direction>;

    /// Returns all study-level user attributes.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn get_study_user_attrs(&self, study_id: u64) -> Result<HashMap<String, AttrValue>>;

    /// Returns all study-level system attributes.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn get_study_system_attrs(&self, study_id: u64) -> Result<HashMap<String, AttrValue>>;

    /// Summarizes every study in the storage.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn get_all_study_summaries(&self) -> Result<Vec<StudySummary>>;

    /// Creates a running trial in a study and returns its id.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn create_new_trial(&self, study_id: u64) -> Result<u64>;

    /// Moves a trial to a new state.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist or has already finished.
    fn set_trial_state(&self, trial_id: u64, state: TrialState) -> Result<()>;

    /// Records a parameter value. Returns `false` if the parameter was
    /// already set on this trial, leaving the stored value unchanged.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist or has already finished.
    fn set_trial_param(
        &self,
        trial_id: u64,
        param_name: &str,
        value: ParamValue,
        distribution: Distribution,
    ) -> Result<bool>;

    /// Returns the per-study number of a trial.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist.
    fn get_trial_number_from_id(&self, trial_id: u64) -> Result<u64>;

    /// Returns a stored parameter value.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist or has no such parameter.
    fn get_trial_param(&self, trial_id: u64, param_name: &str) -> Result<ParamValue>;

    /// Sets the final objective value of a trial.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist or has already finished.
    fn set_trial_value(&self, trial_id: u64, value: f64) -> Result<()>;

    /// Records an intermediate value. Returns `false` if a value was already
    /// recorded at `step`.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist or has already finished.
    fn set_trial_intermediate_value(&self, trial_id: u64, step: u64, value: f64) -> Result<bool>;

    /// Sets a trial-level user attribute.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist or has already finished.
    fn set_trial_user_attr(&self, trial_id: u64, key: &str, value: AttrValue) -> Result<()>;

    /// Sets a trial-level system attribute.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist or has already finished.
    fn set_trial_system_attr(&self, trial_id: u64, key: &str, value: AttrValue) -> Result<()>;

    /// Returns a snapshot of one trial.
    ///
    /// # Errors
    ///
    /// Fails if the trial does not exist.
    fn get_trial(&self, trial_id: u64) -> Result<FrozenTrial>;

    /// Returns snapshots of every trial in a study, ordered by ascending id.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn get_all_trials(&self, study_id: u64) -> Result<Vec<FrozenTrial>>;

    /// Counts the trials of a study, optionally only those in `state`.
    ///
    /// # Errors
    ///
    /// Fails if the study does not exist.
    fn get_n_trials(&self, study_id: u64, state: Option<TrialState>) -> Result<usize>;
}
