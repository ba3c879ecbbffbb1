//! Error types for the crate.
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `core::result::Result<T, Error>`. The [`Error`] enum covers sampler
//! configuration, replay preconditions, storage lookups, and parameter
//! validation.

/// Errors returned by sampler, storage, and study operations.
///
/// Storage variants are produced by [`MemoryStorage`](crate::MemoryStorage)
/// and travel through [`FilteredStorage`](crate::FilteredStorage) and the
/// samplers untouched. The [`TrialPruned`](Error::TrialPruned) variant is a
/// signal rather than a failure: it marks the trial as pruned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The per-arm observation budget was zero.
    #[error("min_resource must be > 0")]
    InvalidMinResource,

    /// The reduction factor was below 2.
    #[error("reduction_factor must be >= 2, got {0}")]
    InvalidReductionFactor(usize),

    /// A sampling call found no trials at all; the in-flight trial must
    /// already be stored when the sampler runs.
    #[error("study {0} has no trials to replay")]
    NoTrials(u64),

    /// Trials were told to the successive-halving engine out of id order.
    #[error("trial {current} was told after trial {previous}; trial ids must be strictly increasing")]
    TrialOrder {
        /// The id of the last trial accepted by the engine.
        previous: u64,
        /// The id of the rejected trial.
        current: u64,
    },

    /// No study with this id exists in the storage.
    #[error("study {0} not found")]
    StudyNotFound(u64),

    /// No study with this name exists in the storage.
    #[error("study named '{0}' not found")]
    StudyNameNotFound(String),

    /// A study with this name already exists in the storage.
    #[error("study named '{0}' already exists")]
    DuplicateStudyName(String),

    /// No trial with this id exists in the storage.
    #[error("trial {0} not found")]
    TrialNotFound(u64),

    /// The trial has already finished and can no longer be updated.
    #[error("trial {0} has already finished and can not be updated")]
    TrialFinished(u64),

    /// The trial has no value for the requested parameter.
    #[error("trial {trial_id} has no parameter '{name}'")]
    ParamNotFound {
        /// The trial that was queried.
        trial_id: u64,
        /// The missing parameter name.
        name: String,
    },

    /// The lower bound exceeds the upper bound of a float or int distribution.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Log-scale is enabled but the lower bound is not positive (float) or
    /// is less than 1 (integer).
    #[error("invalid log bounds: low must be positive for log scale")]
    InvalidLogBounds,

    /// The step size of a distribution is not positive, or is combined with
    /// log scale.
    #[error("invalid step: step must be positive and cannot be combined with log scale")]
    InvalidStep,

    /// A categorical suggestion was made with no choices.
    #[error("categorical choices cannot be empty")]
    EmptyChoices,

    /// The same parameter name was suggested twice within one trial with a
    /// different distribution.
    #[error("parameter conflict for '{name}': {reason}")]
    ParameterConflict {
        /// The name of the conflicting parameter.
        name: String,
        /// The reason for the conflict.
        reason: String,
    },

    /// [`Study::best_trial`](crate::Study::best_trial) or a full optimization
    /// run finished without any successfully completed trial.
    #[error("no completed trials available")]
    NoCompletedTrials,

    /// The objective signalled that this trial should be pruned. Typically
    /// raised via `Err(TrialPruned)?` inside the objective closure.
    #[error("trial was pruned")]
    TrialPruned,

    /// A [`Sampler`](crate::Sampler) returned a value of the wrong variant
    /// or outside the requested distribution.
    #[error("sampler returned an invalid value: {0}")]
    InvalidSample(&'static str),

    /// An internal invariant was violated. This indicates a bug in the
    /// library rather than a user error.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// A convenience alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Convenience type for signalling a pruned trial from an objective function.
///
/// Implements `Into<Error>` so it can be used with `?` in objectives that
/// return `Result<f64, Error>`.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{Error, TrialPruned};
///
/// fn objective_that_prunes() -> Result<f64, Error> {
///     Err(TrialPruned)?
/// }
///
/// assert!(matches!(objective_that_prunes(), Err(Error::TrialPruned)));
/// ```
#[derive(Debug)]
pub struct TrialPruned;

impl core::fmt::Display for TrialPruned {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "trial was pruned")
    }
}

impl From<TrialPruned> for Error {
    fn from(_: TrialPruned) -> Self {
        Error::TrialPruned
    }
}
