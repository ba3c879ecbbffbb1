use std::sync::Arc;

use optimizer_sha::prelude::*;
use optimizer_sha::{Distribution, SuccessiveHalving};
use parking_lot::Mutex;

/// Delegates to a seeded `RandomSampler` and records every view it is given.
struct Recorder {
    inner: RandomSampler,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[derive(Clone, Debug)]
struct Call {
    trial_id: u64,
    direction: Direction,
    history: Vec<u64>,
}

impl Recorder {
    fn new(seed: u64) -> (Self, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Self {
            inner: RandomSampler::with_seed(seed),
            calls: Arc::clone(&calls),
        };
        (recorder, calls)
    }
}

impl Sampler for Recorder {
    fn sample(
        &self,
        storage: &dyn Storage,
        study_id: u64,
        trial_id: u64,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue> {
        self.calls.lock().push(Call {
            trial_id,
            direction: storage.get_study_direction(study_id)?,
            history: storage
                .get_all_trials(study_id)?
                .iter()
                .map(|t| t.id)
                .collect(),
        });
        self.inner
            .sample(storage, study_id, trial_id, param_name, distribution)
    }
}

fn sha<S: Sampler>(
    base: S,
    min_resource: usize,
    reduction_factor: usize,
) -> SuccessiveHalvingSampler<S> {
    SuccessiveHalvingSampler::builder(base)
        .min_resource(min_resource)
        .reduction_factor(reduction_factor)
        .build()
        .unwrap()
}

#[test]
fn twenty_first_trial_starts_a_new_arm() {
    let (recorder, calls) = Recorder::new(1);
    let study = Study::builder()
        .sampler(SuccessiveHalvingSampler::new(recorder))
        .build()
        .unwrap();

    study
        .optimize(22, |trial| {
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            Ok::<_, Error>(x)
        })
        .unwrap();

    let lengths: Vec<usize> = calls.lock().iter().map(|c| c.history.len()).collect();
    // Trials 0..=20 all see the first arm (trial 20 is in flight while the
    // first arm sits at exactly 20 trials). Replaying trial 20 files that arm
    // alone on rung 0, so trial 21 shares a fresh arm with trial 20 only.
    let expected: Vec<usize> = (1..=21).chain([2]).collect();
    assert_eq!(lengths, expected);
    assert_eq!(calls.lock()[21].history, vec![20, 21]);
}

#[test]
fn base_sampler_sees_minimize_and_its_own_trial_last() {
    let (recorder, calls) = Recorder::new(2);
    let study = Study::builder()
        .maximize()
        .sampler(sha(recorder, 3, 2))
        .build()
        .unwrap();

    study
        .optimize(40, |trial| {
            let x = trial.suggest_float("x", -1.0, 1.0)?;
            let k = trial.suggest_int("k", 0, 3)?;
            Ok::<_, Error>(-x * x + k as f64)
        })
        .unwrap();

    let calls = calls.lock();
    assert_eq!(calls.len(), 80);
    for call in calls.iter() {
        assert_eq!(call.direction, Direction::Minimize);
        assert_eq!(call.history.last(), Some(&call.trial_id));
        assert!(call.history.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn filtered_history_matches_an_explicit_replay() {
    let study = Study::builder()
        .sampler(RandomSampler::with_seed(5))
        .build()
        .unwrap();
    study
        .optimize(30, |trial| {
            let x = trial.suggest_float("x", -3.0, 3.0)?;
            Ok::<_, Error>(x.abs())
        })
        .unwrap();
    let pending = study.ask().unwrap();

    let sampler = sha(RandomSampler::with_seed(0), 2, 3);
    let history = sampler
        .filtered_history(study.storage().as_ref(), study.id())
        .unwrap();

    let mut engine = SuccessiveHalving::new(Direction::Minimize, 2, 3).unwrap();
    let trials = study.trials().unwrap();
    for trial in &trials[..trials.len() - 1] {
        engine.tell(trial.clone()).unwrap();
    }
    let mut expected: Vec<u64> = engine.active().trials().iter().map(|t| t.id).collect();
    expected.push(pending.id());

    let ids: Vec<u64> = history.iter().map(|t| t.id).collect();
    assert_eq!(ids, expected);
}

#[test]
fn failed_and_pruned_trials_still_fill_budgets() {
    let (recorder, calls) = Recorder::new(3);
    let study = Study::builder()
        .sampler(sha(recorder, 2, 2))
        .build()
        .unwrap();

    let mut n = 0;
    study
        .optimize(12, |trial| {
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            n += 1;
            match n % 3 {
                0 => Err(Error::TrialPruned),
                1 => Err(Error::Internal("objective blew up")),
                _ => Ok(x),
            }
        })
        .unwrap();

    let calls = calls.lock();
    assert_eq!(calls.len(), 12);
    // No arm ever exposes more than its budget plus the in-flight trial.
    // Budgets are 2, 4, 8, ... so twelve trials can reach at most 8 + 1.
    assert!(calls.iter().all(|c| c.history.len() <= 9));
    assert_eq!(calls[0].history, vec![0]);
    assert_eq!(calls[1].history, vec![0, 1]);
    assert_eq!(calls[2].history, vec![0, 1, 2]);
    assert_eq!(calls[3].history, vec![2, 3]);
}

#[test]
fn studies_sharing_a_storage_stay_separate() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let (left_recorder, left_calls) = Recorder::new(4);
    let left = Study::builder()
        .name("left")
        .storage(Arc::clone(&storage))
        .sampler(sha(left_recorder, 2, 2))
        .build()
        .unwrap();
    let right = Study::builder()
        .name("right")
        .storage(Arc::clone(&storage))
        .sampler(sha(RandomSampler::with_seed(4), 2, 2))
        .build()
        .unwrap();

    for _ in 0..10 {
        for study in [&left, &right] {
            let trial = study.ask().unwrap();
            let x = trial.suggest_float("x", 0.0, 1.0).unwrap();
            study.tell(trial, Ok::<_, Error>(x)).unwrap();
        }
    }

    let left_ids: Vec<u64> = left.trials().unwrap().iter().map(|t| t.id).collect();
    for call in left_calls.lock().iter() {
        assert!(call.history.iter().all(|id| left_ids.contains(id)));
    }
    assert_eq!(storage.get_n_trials(left.id(), None).unwrap(), 10);
    assert_eq!(storage.get_n_trials(right.id(), None).unwrap(), 10);
}

#[test]
fn boxed_base_sampler() {
    let base: Box<dyn Sampler> = Box::new(RandomSampler::with_seed(9));
    let study = Study::builder()
        .sampler(sha(base, 3, 3))
        .build()
        .unwrap();

    study
        .optimize(25, |trial| {
            let lr = trial.suggest_float_log("lr", 1e-5, 1e-1)?;
            let layers = trial.suggest_int("layers", 1, 4)?;
            let act = trial.suggest_categorical("act", &["relu", "tanh"])?;
            let bias = if act == "relu" { 0.0 } else { 0.5 };
            Ok::<_, Error>(lr.ln().abs() + layers as f64 + bias)
        })
        .unwrap();

    let best = study.best_trial().unwrap();
    assert_eq!(best.state, TrialState::Complete);
    assert_eq!(best.params.len(), 3);
}

#[test]
fn sampling_with_no_trials_is_an_error() {
    let storage = MemoryStorage::new();
    let study_id = storage.create_new_study(None).unwrap();
    let sampler = SuccessiveHalvingSampler::new(RandomSampler::with_seed(0));
    assert!(matches!(
        sampler.filtered_history(&storage, study_id),
        Err(Error::NoTrials(_))
    ));
    assert!(matches!(
        sampler.filtered_history(&storage, study_id + 1),
        Err(Error::StudyNotFound(_))
    ));
}
