//! Asynchronous successive-halving sampler.
//!
//! Successive halving runs configurations ("arms") on a geometric ladder of
//! observation budgets. An arm that fills its budget at rung `i` is ranked
//! against every arm that finished rung `i` before it; if it lands in the top
//! `1 / reduction_factor` it keeps going with a budget `reduction_factor`
//! times larger, otherwise a fresh arm starts at the bottom. Promotion never
//! waits for a rung to fill up, so the ladder grows one trial at a time.
//!
//! [`SuccessiveHalvingSampler`] does not pick parameter values itself. On
//! every call it replays the study's trials through a [`SuccessiveHalving`]
//! engine, takes the active arm's trials plus the in-flight trial, and asks
//! its base sampler to sample against a
//! [`FilteredStorage`](crate::FilteredStorage) exposing only those trials.
//! A history-aware base sampler therefore concentrates on the arm that is
//! currently being evaluated.
//!
//! # Budget ladder
//!
//! With `min_resource = 2` and `reduction_factor = 3`:
//!
//! | Rung | Budget | Eligible for promotion |
//! |------|--------|------------------------|
//! | 0 | 2 | top third of rung 0 |
//! | 1 | 6 | top third of rung 1 |
//! | 2 | 18 | top third of rung 2 |
//!
//! The engine is rebuilt from the full history on every call, so sampling
//! cost grows linearly with the number of trials.

mod arm;
mod engine;

pub use arm::Arm;
pub use engine::{RungEntry, SuccessiveHalving};

use super::Sampler;
use super::random::RandomSampler;
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::storage::{FilteredStorage, Storage};
use crate::trial::FrozenTrial;

const DEFAULT_MIN_RESOURCE: usize = 20;
const DEFAULT_REDUCTION_FACTOR: usize = 3;

/// A sampler wrapper that narrows the history its base sampler sees to the
/// active successive-halving arm.
///
/// The base sampler receives a [`Storage`] view in which
/// [`get_all_trials`](Storage::get_all_trials) returns the active arm's trials
/// followed by the in-flight trial, and
/// [`get_study_direction`](Storage::get_study_direction) reports
/// [`Minimize`](crate::Direction::Minimize). Trial records are passed through
/// unmodified.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{RandomSampler, Study, SuccessiveHalvingSampler};
///
/// let sampler = SuccessiveHalvingSampler::builder(RandomSampler::with_seed(1))
///     .min_resource(5)
///     .reduction_factor(2)
///     .build()
///     .unwrap();
/// assert_eq!(sampler.min_resource(), 5);
///
/// let study = Study::builder().sampler(sampler).build().unwrap();
/// study
///     .optimize(30, |trial| {
///         let x = trial.suggest_float("x", 0.0, 1.0)?;
///         Ok::<_, optimizer_sha::Error>(x)
///     })
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct SuccessiveHalvingSampler<S = RandomSampler> {
    base: S,
    min_resource: usize,
    reduction_factor: usize,
}

impl<S: Sampler> SuccessiveHalvingSampler<S> {
    /// Wraps `base` with `min_resource = 20` and `reduction_factor = 3`.
    #[must_use]
    pub fn new(base: S) -> Self {
        Self {
            base,
            min_resource: DEFAULT_MIN_RESOURCE,
            reduction_factor: DEFAULT_REDUCTION_FACTOR,
        }
    }

    /// Starts a builder for a sampler wrapping `base`.
    #[must_use]
    pub fn builder(base: S) -> SuccessiveHalvingSamplerBuilder<S> {
        SuccessiveHalvingSamplerBuilder {
            base,
            min_resource: DEFAULT_MIN_RESOURCE,
            reduction_factor: DEFAULT_REDUCTION_FACTOR,
        }
    }

    /// Number of trials an arm gets at rung 0.
    #[must_use]
    pub fn min_resource(&self) -> usize {
        self.min_resource
    }

    /// Budget multiplier per promotion; also the inverse of the promoted
    /// fraction of each rung.
    #[must_use]
    pub fn reduction_factor(&self) -> usize {
        self.reduction_factor
    }

    /// The wrapped sampler.
    #[must_use]
    pub fn base_sampler(&self) -> &S {
        &self.base
    }

    /// Returns the trial list the base sampler would see for the next call.
    ///
    /// All trials of the study except the newest one are replayed, in id
    /// order, into a fresh [`SuccessiveHalving`] engine. The newest trial is
    /// the in-flight one: it is appended after the active arm's trials
    /// without being told to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTrials`] if the study has no trials, and propagates
    /// storage errors unchanged.
    pub fn filtered_history(
        &self,
        storage: &dyn Storage,
        study_id: u64,
    ) -> Result<Vec<FrozenTrial>> {
        let mut trials = storage.get_all_trials(study_id)?;
        trials.sort_by_key(|t| t.id);
        let current = trials.pop().ok_or(Error::NoTrials(study_id))?;
        let direction = storage.get_study_direction(study_id)?;

        let mut engine =
            SuccessiveHalving::new(direction, self.min_resource, self.reduction_factor)?;
        for trial in trials {
            engine.tell(trial)?;
        }

        trace_debug!(
            study_id,
            arm = engine.active().id(),
            n_trials = engine.active().curr_steps() + 1,
            "filtered history"
        );
        let mut history = engine.into_active_trials();
        history.push(current);
        Ok(history)
    }
}

impl<S: Sampler> Sampler for SuccessiveHalvingSampler<S> {
    fn sample(
        &self,
        storage: &dyn Storage,
        study_id: u64,
        trial_id: u64,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue> {
        let history = self.filtered_history(storage, study_id)?;
        let view = FilteredStorage::new(storage, history);
        self.base.sample(&view, study_id, trial_id, param_name, distribution)
    }
}

/// Builder for [`SuccessiveHalvingSampler`].
#[derive(Clone, Debug)]
pub struct SuccessiveHalvingSamplerBuilder<S> {
    base: S,
    min_resource: usize,
    reduction_factor: usize,
}

impl<S: Sampler> SuccessiveHalvingSamplerBuilder<S> {
    /// Sets the rung-0 budget. Must be at least 1.
    #[must_use]
    pub fn min_resource(mut self, min_resource: usize) -> Self {
        self.min_resource = min_resource;
        self
    }

    /// Sets the budget multiplier per promotion. Must be at least 2.
    #[must_use]
    pub fn reduction_factor(mut self, reduction_factor: usize) -> Self {
        self.reduction_factor = reduction_factor;
        self
    }

    /// Validates the configuration and builds the sampler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMinResource`] if `min_resource` is zero and
    /// [`Error::InvalidReductionFactor`] if `reduction_factor` is below 2.
    pub fn build(self) -> Result<SuccessiveHalvingSampler<S>> {
        engine::validate_config(self.min_resource, self.reduction_factor)?;
        Ok(SuccessiveHalvingSampler {
            base: self.base,
            min_resource: self.min_resource,
            reduction_factor: self.reduction_factor,
        })
    }
}

#[cfg(test)]
#[allow(clippy::cast_precision_loss)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::distribution::FloatDistribution;
    use crate::storage::MemoryStorage;
    use crate::types::{Direction, TrialState};

    /// Records what the storage view looked like on each call.
    #[derive(Default)]
    struct Spy {
        seen: Arc<Mutex<Vec<(Direction, Vec<u64>, usize)>>>,
    }

    impl Sampler for Spy {
        fn sample(
            &self,
            storage: &dyn Storage,
            study_id: u64,
            _trial_id: u64,
            _param_name: &str,
            _distribution: &Distribution,
        ) -> Result<ParamValue> {
            let ids = storage
                .get_all_trials(study_id)?
                .iter()
                .map(|t| t.id)
                .collect();
            self.seen.lock().push((
                storage.get_study_direction(study_id)?,
                ids,
                storage.get_n_trials(study_id, None)?,
            ));
            Ok(ParamValue::Float(0.0))
        }
    }

    fn dist() -> Distribution {
        Distribution::Float(FloatDistribution {
            low: 0.0,
            high: 1.0,
            log_scale: false,
            step: None,
        })
    }

    fn complete(storage: &MemoryStorage, study: u64, value: f64) -> u64 {
        let id = storage.create_new_trial(study).unwrap();
        storage.set_trial_value(id, value).unwrap();
        storage.set_trial_state(id, TrialState::Complete).unwrap();
        id
    }

    #[test]
    fn defaults_and_builder_validation() {
        let sampler = SuccessiveHalvingSampler::new(RandomSampler::with_seed(0));
        assert_eq!(sampler.min_resource(), 20);
        assert_eq!(sampler.reduction_factor(), 3);

        assert!(matches!(
            SuccessiveHalvingSampler::builder(RandomSampler::with_seed(0))
                .min_resource(0)
                .build(),
            Err(Error::InvalidMinResource)
        ));
        assert!(matches!(
            SuccessiveHalvingSampler::builder(RandomSampler::with_seed(0))
                .reduction_factor(1)
                .build(),
            Err(Error::InvalidReductionFactor(1))
        ));
    }

    #[test]
    fn empty_study_is_an_error() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        let sampler = SuccessiveHalvingSampler::new(RandomSampler::with_seed(0));
        assert!(matches!(
            sampler.sample(&storage, study, 0, "x", &dist()),
            Err(Error::NoTrials(id)) if id == study
        ));
    }

    #[test]
    fn base_sampler_sees_only_the_active_arm() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        storage
            .set_study_direction(study, Direction::Maximize)
            .unwrap();

        // min_resource 2, eta 2 (maximize): arm A = [5, 6], arm B = [2, 3].
        let a0 = complete(&storage, study, 5.0);
        let a1 = complete(&storage, study, 6.0);
        complete(&storage, study, 2.0);
        complete(&storage, study, 3.0);
        let in_flight = storage.create_new_trial(study).unwrap();

        let spy = Spy::default();
        let seen = Arc::clone(&spy.seen);
        let sampler = SuccessiveHalvingSampler::builder(spy)
            .min_resource(2)
            .reduction_factor(2)
            .build()
            .unwrap();

        // Replaying [a0, a1, b0, b1] leaves arm B active, unranked yet.
        sampler
            .sample(&storage, study, in_flight, "x", &dist())
            .unwrap();
        let (direction, ids, n) = seen.lock()[0].clone();
        assert_eq!(direction, Direction::Minimize);
        assert_eq!(ids, vec![2, 3, in_flight]);
        assert_eq!(n, 3);

        // One more trial files arm B; under maximize arm A (6.0) is promoted.
        storage.set_trial_value(in_flight, 1.0).unwrap();
        storage
            .set_trial_state(in_flight, TrialState::Complete)
            .unwrap();
        let next = storage.create_new_trial(study).unwrap();
        sampler.sample(&storage, study, next, "x", &dist()).unwrap();
        let (_, ids, _) = seen.lock()[1].clone();
        assert_eq!(ids, vec![a0, a1, in_flight, next]);
    }

    #[test]
    fn history_is_replayed_in_id_order() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        for i in 0..7 {
            complete(&storage, study, f64::from(i));
        }
        storage.create_new_trial(study).unwrap();

        let sampler = SuccessiveHalvingSampler::builder(RandomSampler::with_seed(0))
            .min_resource(3)
            .reduction_factor(3)
            .build()
            .unwrap();
        let history = sampler.filtered_history(&storage, study).unwrap();

        // Rung 0 holds two arms, fewer than the reduction factor, so nothing
        // is promoted and trial 6 starts a third arm.
        let ids: Vec<u64> = history.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![6, 7]);
        assert!(history.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(sampler.filtered_history(&storage, study).unwrap(), history);
    }

    #[test]
    fn sampling_is_deterministic_for_a_fixed_history() {
        let storage = MemoryStorage::new();
        let study = storage.create_new_study(None).unwrap();
        for i in 0..10 {
            complete(&storage, study, (i as f64 - 4.5).abs());
        }
        let in_flight = storage.create_new_trial(study).unwrap();

        let draw = || {
            SuccessiveHalvingSampler::builder(RandomSampler::with_seed(11))
                .min_resource(2)
                .build()
                .unwrap()
                .sample(&storage, study, in_flight, "x", &dist())
                .unwrap()
        };
        assert_eq!(draw(), draw());
    }
}
