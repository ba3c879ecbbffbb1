use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Storage, StudySummary};
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::trial::{AttrValue, FrozenTrial};
use crate::types::{Direction, TrialState};

struct StudyRecord {
    name: String,
    direction: Direction,
    user_attrs: HashMap<String, AttrValue>,
    system_attrs: HashMap<String, AttrValue>,
    trial_ids: Vec<u64>,
}

struct TrialRecord {
    study_id: u64,
    trial: FrozenTrial,
}

#[derive(Default)]
struct Inner {
    studies: Vec<StudyRecord>,
    trials: Vec<TrialRecord>,
}

impl Inner {
    fn study(&self, study_id: u64) -> Result<&StudyRecord> {
        usize::try_from(study_id)
            .ok()
            .and_then(|i| self.studies.get(i))
            .ok_or(Error::StudyNotFound(study_id))
    }

    fn study_mut(&mut self, study_id: u64) -> Result<&mut StudyRecord> {
        usize::try_from(study_id)
            .ok()
            .and_then(|i| self.studies.get_mut(i))
            .ok_or(Error::StudyNotFound(study_id))
    }

    fn trial(&self, trial_id: u64) -> Result<&TrialRecord> {
        usize::try_from(trial_id)
            .ok()
            .and_then(|i| self.trials.get(i))
            .ok_or(Error::TrialNotFound(trial_id))
    }

    /// Mutable access to a trial that is still running.
    fn running_trial_mut(&mut self, trial_id: u64) -> Result<&mut FrozenTrial> {
        let record = usize::try_from(trial_id)
            .ok()
            .and_then(|i| self.trials.get_mut(i))
            .ok_or(Error::TrialNotFound(trial_id))?;
        if record.trial.state.is_finished() {
            return Err(Error::TrialFinished(trial_id));
        }
        Ok(&mut record.trial)
    }

    fn study_trials(&self, study_id: u64) -> Result<impl Iterator<Item = &FrozenTrial>> {
        let study = self.study(study_id)?;
        Ok(study
            .trial_ids
            .iter()
            .filter_map(|&id| self.trial(id).ok())
            .map(|record| &record.trial))
    }

    fn best_trial(&self, study_id: u64) -> Result<Option<FrozenTrial>> {
        let direction = self.study(study_id)?.direction;
        let best = self
            .study_trials(study_id)?
            .filter(|t| t.state == TrialState::Complete)
            .filter_map(|t| t.value.filter(|v| !v.is_nan()).map(|v| (v, t)))
            .min_by(|(a, _), (b, _)| match direction {
                Direction::Minimize => a.total_cmp(b),
                Direction::Maximize => b.total_cmp(a),
            })
            .map(|(_, t)| t.clone());
        Ok(best)
    }
}

/// In-memory trial storage (the default).
///
/// Ids are dense and start at zero for both studies and trials; trial ids
/// are shared across studies, so they increase with creation order
/// storage-wide. All state lives behind a single `parking_lot::RwLock`.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{MemoryStorage, Storage, TrialState};
///
/// let storage = MemoryStorage::new();
/// let study = storage.create_new_study(Some("demo")).unwrap();
/// let trial = storage.create_new_trial(study).unwrap();
/// storage.set_trial_value(trial, 0.5).unwrap();
/// storage.set_trial_state(trial, TrialState::Complete).unwrap();
///
/// assert_eq!(storage.get_n_trials(study, Some(TrialState::Complete)).unwrap(), 1);
/// ```
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn create_new_study(&self, study_name: Option<&str>) -> Result<u64> {
        let mut inner = self.inner.write();
        let study_id = inner.studies.len() as u64;
        let name = match study_name {
            Some(name) => {
                if inner.studies.iter().any(|s| s.name == name) {
                    return Err(Error::DuplicateStudyName(name.to_owned()));
                }
                name.to_owned()
            }
            None => format!("no-name-{study_id}"),
        };
        inner.studies.push(StudyRecord {
            name,
            direction: Direction::Minimize,
            user_attrs: HashMap::new(),
            system_attrs: HashMap::new(),
            trial_ids: Vec::new(),
        });
        Ok(study_id)
    }

    fn set_study_direction(&self, study_id: u64, direction: Direction) -> Result<()> {
        self.inner.write().study_mut(study_id)?.direction = direction;
        Ok(())
    }

    fn set_study_user_attr(&self, study_id: u64, key: &str, value: AttrValue) -> Result<()> {
        self.inner
            .write()
            .study_mut(study_id)?
            .user_attrs
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn set_study_system_attr(&self, study_id: u64, key: &str, value: AttrValue) -> Result<()> {
        self.inner
            .write()
            .study_mut(study_id)?
            .system_attrs
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn get_study_id_from_name(&self, study_name: &str) -> Result<u64> {
        self.inner
            .read()
            .studies
            .iter()
            .position(|s| s.name == study_name)
            .map(|i| i as u64)
            .ok_or_else(|| Error::StudyNameNotFound(study_name.to_owned()))
    }

    fn get_study_id_from_trial_id(&self, trial_id: u64) -> Result<u64> {
        Ok(self.inner.read().trial(trial_id)?.study_id)
    }

    fn get_study_name_from_id(&self, study_id: u64) -> Result<String> {
        Ok(self.inner.read().study(study_id)?.name.clone())
    }

    fn get_study_direction(&self, study_id: u64) -> Result<Direction> {
        Ok(self.inner.read().study(study_id)?.direction)
    }

    fn get_study_user_attrs(&self, study_id: u64) -> Result<HashMap<String, AttrValue>> {
        Ok(self.inner.read().study(study_id)?.user_attrs.clone())
    }

    fn get_study_system_attrs(&self, study_id: u64) -> Result<HashMap<String, AttrValue>> {
        Ok(self.inner.read().study(study_id)?.system_attrs.clone())
    }

    fn get_all_study_summaries(&self) -> Result<Vec<StudySummary>> {
        let inner = self.inner.read();
        (0..inner.studies.len() as u64)
            .map(|study_id| {
                let study = inner.study(study_id)?;
                Ok(StudySummary {
                    study_id,
                    study_name: study.name.clone(),
                    direction: study.direction,
                    n_trials: study.trial_ids.len(),
                    best_trial: inner.best_trial(study_id)?,
                    user_attrs: study.user_attrs.clone(),
                    system_attrs: study.system_attrs.clone(),
                })
            })
            .collect()
    }

    fn create_new_trial(&self, study_id: u64) -> Result<u64> {
        let mut inner = self.inner.write();
        let trial_id = inner.trials.len() as u64;
        let study = inner.study_mut(study_id)?;
        let number = study.trial_ids.len() as u64;
        study.trial_ids.push(trial_id);
        inner.trials.push(TrialRecord {
            study_id,
            trial: FrozenTrial::new(trial_id, number),
        });
        Ok(trial_id)
    }

    fn set_trial_state(&self, trial_id: u64, state: TrialState) -> Result<()> {
        self.inner.write().running_trial_mut(trial_id)?.state = state;
        Ok(())
    }

    fn set_trial_param(
        &self,
        trial_id: u64,
        param_name: &str,
        value: ParamValue,
        distribution: Distribution,
    ) -> Result<bool> {
        let mut inner = self.inner.write();
        let trial = inner.running_trial_mut(trial_id)?;
        if trial.params.contains_key(param_name) {
            return Ok(false);
        }
        trial.params.insert(param_name.to_owned(), value);
        trial
            .distributions
            .insert(param_name.to_owned(), distribution);
        Ok(true)
    }

    fn get_trial_number_from_id(&self, trial_id: u64) -> Result<u64> {
        Ok(self.inner.read().trial(trial_id)?.trial.number)
    }

    fn get_trial_param(&self, trial_id: u64, param_name: &str) -> Result<ParamValue> {
        self.inner
            .read()
            .trial(trial_id)?
            .trial
            .params
            .get(param_name)
            .cloned()
            .ok_or_else(|| Error::ParamNotFound {
                trial_id,
                name: param_name.to_owned(),
            })
    }

    fn set_trial_value(&self, trial_id: u64, value: f64) -> Result<()> {
        self.inner.write().running_trial_mut(trial_id)?.value = Some(value);
        Ok(())
    }

    fn set_trial_intermediate_value(&self, trial_id: u64, step: u64, value: f64) -> Result<bool> {
        let mut inner = self.inner.write();
        let trial = inner.running_trial_mut(trial_id)?;
        if trial.intermediate_values.iter().any(|&(s, _)| s == step) {
            return Ok(false);
        }
        trial.intermediate_values.push((step, value));
        Ok(true)
    }

    fn set_trial_user_attr(&self, trial_id: u64, key: &str, value: AttrValue) -> Result<()> {
        self.inner
            .write()
            .running_trial_mut(trial_id)?
            .user_attrs
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn set_trial_system_attr(&self, trial_id: u64, key: &str, value: AttrValue) -> Result<()> {
        self.inner
            .write()
            .running_trial_mut(trial_id)?
            .system_attrs
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn get_trial(&self, trial_id: u64) -> Result<FrozenTrial> {
        Ok(self.inner.read().trial(trial_id)?.trial.clone())
    }

    fn get_all_trials(&self, study_id: u64) -> Result<Vec<FrozenTrial>> {
        Ok(self
            .inner
            .read()
            .study_trials(study_id)?
            .cloned()
            .collect())
    }

    fn get_n_trials(&self, study_id: u64, state: Option<TrialState>) -> Result<usize> {
        Ok(self
            .inner
            .read()
            .study_trials(study_id)?
            .filter(|t| state.is_none_or(|s| t.state == s))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(storage: &MemoryStorage, study_id: u64, value: Option<f64>) -> u64 {
        let trial_id = storage.create_new_trial(study_id).unwrap();
        match value {
            Some(v) => {
                storage.set_trial_value(trial_id, v).unwrap();
                storage
                    .set_trial_state(trial_id, TrialState::Complete)
                    .unwrap();
            }
            None => storage
                .set_trial_state(trial_id, TrialState::Failed)
                .unwrap(),
        }
        trial_id
    }

    #[test]
    fn studies_get_dense_ids_and_generated_names() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.create_new_study(None).unwrap(), 0);
        assert_eq!(storage.create_new_study(Some("named")).unwrap(), 1);
        assert_eq!(storage.get_study_name_from_id(0).unwrap(), "no-name-0");
        assert_eq!(storage.get_study_id_from_name("named").unwrap(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let storage = MemoryStorage::new();
        storage.create_new_study(Some("a")).unwrap();
        assert!(matches!(
            storage.create_new_study(Some("a")),
            Err(Error::DuplicateStudyName(name)) if name == "a"
        ));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.get_study_direction(3),
            Err(Error::StudyNotFound(3))
        ));
        assert!(matches!(storage.get_trial(9), Err(Error::TrialNotFound(9))));
        assert!(matches!(
            storage.get_study_id_from_name("missing"),
            Err(Error::StudyNameNotFound(_))
        ));
    }

    #[test]
    fn trial_ids_are_global_and_numbers_per_study() {
        let storage = MemoryStorage::new();
        let a = storage.create_new_study(None).unwrap();
        let b = storage.create_new_study(None).unwrap();
        let t0 = storage.create_new_trial(a).unwrap();
        let t1 = storage.create_new_trial(b).unwrap();
        let t2 = storage.create_new_trial(a).unwrap();
        assert_eq!((t0, t1, t2), (0, 1, 2));
        assert_eq!(storage.get_trial_number_from_id(t2).unwrap(), 1);
        assert_eq!(storage.get_trial_number_from_id(t1).unwrap(), 0);
        assert_eq!(storage.get_study_id_from_trial_id(t1).unwrap(), b);

        let ids: Vec<u64> = storage
            .get_all_trials(a)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn finished_trials_are_frozen() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        let trial = finished(&storage, study, Some(1.0));
        assert!(matches!(
            storage.set_trial_value(trial, 2.0),
            Err(Error::TrialFinished(id)) if id == trial
        ));
        assert!(matches!(
            storage.set_trial_state(trial, TrialState::Running),
            Err(Error::TrialFinished(_))
        ));
        assert_eq!(storage.get_trial(trial).unwrap().value, Some(1.0));
    }

    #[test]
    fn params_are_set_once() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        let trial = storage.create_new_trial(study).unwrap();
        let dist = Distribution::Int(crate::distribution::IntDistribution {
            low: 0,
            high: 9,
            log_scale: false,
            step: None,
        });
        assert!(
            storage
                .set_trial_param(trial, "n", ParamValue::Int(3), dist.clone())
                .unwrap()
        );
        assert!(
            !storage
                .set_trial_param(trial, "n", ParamValue::Int(4), dist)
                .unwrap()
        );
        assert_eq!(storage.get_trial_param(trial, "n").unwrap(), ParamValue::Int(3));
        assert!(matches!(
            storage.get_trial_param(trial, "m"),
            Err(Error::ParamNotFound { .. })
        ));
    }

    #[test]
    fn counts_respect_state_filter() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        finished(&storage, study, Some(1.0));
        finished(&storage, study, None);
        storage.create_new_trial(study).unwrap();
        assert_eq!(storage.get_n_trials(study, None).unwrap(), 3);
        assert_eq!(
            storage
                .get_n_trials(study, Some(TrialState::Complete))
                .unwrap(),
            1
        );
        assert_eq!(
            storage
                .get_n_trials(study, Some(TrialState::Running))
                .unwrap(),
            1
        );
    }

    #[test]
    fn summaries_pick_best_by_direction() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(Some("max")).unwrap();
        storage
            .set_study_direction(study, Direction::Maximize)
            .unwrap();
        finished(&storage, study, Some(1.0));
        let best = finished(&storage, study, Some(3.0));
        finished(&storage, study, Some(2.0));
        finished(&storage, study, None);

        let summaries = storage.get_all_study_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].study_name, "max");
        assert_eq!(summaries[0].n_trials, 4);
        assert_eq!(summaries[0].best_trial.as_ref().map(|t| t.id), Some(best));
    }

    #[test]
    fn nan_values_never_win() {
        let storage = MemoryStorage::new();
        let max = storage.create_new_study(None).unwrap();
        storage
            .set_study_direction(max, Direction::Maximize)
            .unwrap();
        finished(&storage, max, Some(1.0));
        finished(&storage, max, Some(f64::NAN));
        let best_max = finished(&storage, max, Some(2.0));

        let min = storage.create_new_study(None).unwrap();
        let best_min = finished(&storage, min, Some(1.0));
        finished(&storage, min, Some(-f64::NAN));

        let only_nan = storage.create_new_study(None).unwrap();
        finished(&storage, only_nan, Some(f64::NAN));

        let best: Vec<Option<u64>> = storage
            .get_all_study_summaries()
            .unwrap()
            .iter()
            .map(|s| s.best_trial.as_ref().map(|t| t.id))
            .collect();
        assert_eq!(best, vec![Some(best_max), Some(best_min), None]);
    }

    #[test]
    fn study_attrs_are_stored() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        storage
            .set_study_user_attr(study, "owner", "ml-team".into())
            .unwrap();
        storage
            .set_study_system_attr(study, "version", AttrValue::Int(2))
            .unwrap();
        assert_eq!(
            storage.get_study_user_attrs(study).unwrap()["owner"],
            AttrValue::String("ml-team".to_owned())
        );
        assert_eq!(
            storage.get_study_system_attrs(study).unwrap()["version"],
            AttrValue::Int(2)
        );
    }
}
