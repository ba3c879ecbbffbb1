//! Study driver: ask/tell loops over a [`Storage`] and a [`Sampler`].

use core::any::Any;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::sampler::Sampler;
use crate::sampler::random::RandomSampler;
use crate::storage::{MemoryStorage, Storage};
use crate::trial::{AttrValue, FrozenTrial, Trial};
use crate::types::{Direction, TrialState};

/// A study manages the optimization process: it creates trials in its
/// storage, hands them to the objective, and records how they finished.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{Direction, Study};
///
/// let study = Study::builder().direction(Direction::Maximize).build().unwrap();
/// let trial = study.ask().unwrap();
/// let x = trial.suggest_float("x", 0.0, 1.0).unwrap();
/// study.tell(trial, Ok::<_, String>(x)).unwrap();
///
/// assert_eq!(study.best_value().unwrap(), x);
/// ```
pub struct Study {
    storage: Arc<dyn Storage>,
    sampler: Arc<dyn Sampler>,
    study_id: u64,
    direction: Direction,
}

impl core::fmt::Debug for Study {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Study")
            .field("study_id", &self.study_id)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

impl Study {
    /// Starts a builder with the defaults: minimize, [`RandomSampler`], a
    /// fresh [`MemoryStorage`], and an auto-generated study name.
    #[must_use]
    pub fn builder() -> StudyBuilder {
        StudyBuilder::default()
    }

    /// Returns the id of this study in its storage.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.study_id
    }

    /// Returns the optimization direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the storage backing this study.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Creates a new running trial.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn ask(&self) -> Result<Trial> {
        let trial_id = self.storage.create_new_trial(self.study_id)?;
        Ok(Trial::new(
            trial_id,
            self.study_id,
            Arc::clone(&self.storage),
            Arc::clone(&self.sampler),
        ))
    }

    /// Finishes `trial` with the objective's outcome.
    ///
    /// `Ok(value)` completes the trial. An error that is
    /// [`Error::TrialPruned`] or [`TrialPruned`](crate::TrialPruned) marks it
    /// pruned; any other error marks it failed and stores the message under
    /// the `fail_reason` system attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TrialFinished`] if the trial was already told, and
    /// propagates other storage errors.
    #[allow(clippy::needless_pass_by_value)]
    pub fn tell<E: ToString + 'static>(
        &self,
        trial: Trial,
        result: core::result::Result<f64, E>,
    ) -> Result<()> {
        let id = trial.id();
        match result {
            Ok(value) => {
                self.storage.set_trial_value(id, value)?;
                self.storage.set_trial_state(id, TrialState::Complete)?;
                trace_info!(trial = id, value, "trial completed");
            }
            Err(e) if is_trial_pruned(&e) => {
                self.storage.set_trial_state(id, TrialState::Pruned)?;
                trace_info!(trial = id, "trial pruned");
            }
            Err(e) => {
                let reason = e.to_string();
                trace_info!(trial = id, reason = %reason, "trial failed");
                self.storage
                    .set_trial_system_attr(id, "fail_reason", AttrValue::String(reason))?;
                self.storage.set_trial_state(id, TrialState::Failed)?;
            }
        }
        Ok(())
    }

    /// Runs `n_trials` sequential ask/evaluate/tell rounds.
    ///
    /// Objective errors do not stop the loop; they are recorded as described
    /// in [`tell`](Self::tell).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if the study has no completed
    /// trial afterwards, and propagates storage errors.
    pub fn optimize<F, E>(&self, n_trials: usize, mut objective: F) -> Result<()>
    where
        F: FnMut(&mut Trial) -> core::result::Result<f64, E>,
        E: ToString + 'static,
    {
        for _ in 0..n_trials {
            let mut trial = self.ask()?;
            let result = objective(&mut trial);
            self.tell(trial, result)?;
        }

        if self
            .storage
            .get_n_trials(self.study_id, Some(TrialState::Complete))?
            == 0
        {
            return Err(Error::NoCompletedTrials);
        }
        Ok(())
    }

    /// Returns every trial of the study in creation order.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn trials(&self) -> Result<Vec<FrozenTrial>> {
        self.storage.get_all_trials(self.study_id)
    }

    /// Returns the completed trial with the best value for the study's
    /// direction. Ties go to the earliest trial.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if no trial has completed.
    pub fn best_trial(&self) -> Result<FrozenTrial> {
        let direction = self.direction;
        self.trials()?
            .into_iter()
            .filter(|t| t.state == TrialState::Complete)
            .filter_map(|t| t.value.filter(|v| !v.is_nan()).map(|v| (v, t)))
            .reduce(|best, candidate| {
                let better = match direction {
                    Direction::Minimize => candidate.0 < best.0,
                    Direction::Maximize => candidate.0 > best.0,
                };
                if better { candidate } else { best }
            })
            .map(|(_, t)| t)
            .ok_or(Error::NoCompletedTrials)
    }

    /// Returns the value of [`best_trial`](Self::best_trial).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if no trial has completed.
    pub fn best_value(&self) -> Result<f64> {
        self.best_trial()?
            .value
            .ok_or(Error::Internal("completed trial without a value"))
    }
}

/// Builder for [`Study`].
pub struct StudyBuilder {
    direction: Direction,
    sampler: Option<Arc<dyn Sampler>>,
    storage: Option<Arc<dyn Storage>>,
    name: Option<String>,
}

impl Default for StudyBuilder {
    fn default() -> Self {
        Self {
            direction: Direction::Minimize,
            sampler: None,
            storage: None,
            name: None,
        }
    }
}

impl StudyBuilder {
    /// Sets the optimization direction.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Shorthand for `direction(Direction::Minimize)`.
    #[must_use]
    pub fn minimize(self) -> Self {
        self.direction(Direction::Minimize)
    }

    /// Shorthand for `direction(Direction::Maximize)`.
    #[must_use]
    pub fn maximize(self) -> Self {
        self.direction(Direction::Maximize)
    }

    /// Sets the sampler used for every suggestion.
    #[must_use]
    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Arc::new(sampler));
        self
    }

    /// Uses `storage` instead of a fresh [`MemoryStorage`]. Several studies
    /// may share one storage.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Names the study. Names must be unique within a storage.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Creates the study in the storage and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateStudyName`] if the name is taken, and
    /// propagates other storage errors.
    pub fn build(self) -> Result<Study> {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let sampler = self
            .sampler
            .unwrap_or_else(|| Arc::new(RandomSampler::new()));
        let study_id = storage.create_new_study(self.name.as_deref())?;
        storage.set_study_direction(study_id, self.direction)?;
        Ok(Study {
            storage,
            sampler,
            study_id,
            direction: self.direction,
        })
    }
}

/// Returns `true` if the error represents a pruned trial.
///
/// Checks via `Any` downcasting whether `e` is `Error::TrialPruned` or
/// the standalone `TrialPruned` struct.
fn is_trial_pruned<E: 'static>(e: &E) -> bool {
    let any: &dyn Any = e;
    if let Some(err) = any.downcast_ref::<Error>() {
        matches!(err, Error::TrialPruned)
    } else {
        any.downcast_ref::<crate::error::TrialPruned>().is_some()
    }
}
