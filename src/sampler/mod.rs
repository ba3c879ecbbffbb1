//! Sampler trait and implementations for parameter sampling.
//!
//! A sampler chooses the value of one parameter for the in-flight trial. It
//! receives the [`Storage`] the study lives in, so history-aware samplers can
//! read past trials through [`Storage::get_all_trials`], plus the study id,
//! the in-flight trial id, the parameter name, and the [`Distribution`] to
//! draw from. The returned [`ParamValue`] must match the distribution
//! variant.
//!
//! # Available samplers
//!
//! | Sampler | Algorithm | Role |
//! |---------|-----------|------|
//! | [`RandomSampler`] | Uniform independent sampling | Baselines, base sampler for wrappers |
//! | [`SuccessiveHalvingSampler`] | Asynchronous successive halving | Narrows the history seen by a base sampler |
//!
//! # Wrapping samplers
//!
//! [`SuccessiveHalvingSampler`] never chooses values itself. It replays the
//! study's history into its rung ladder, then calls its base sampler against
//! a [`FilteredStorage`](crate::FilteredStorage) that only exposes the trials
//! of the currently active arm. Any sampler that reads history through the
//! storage it is handed works as a base sampler.
//!
//! # Implementing a custom sampler
//!
//! ```rust
//! use optimizer_sha::{Distribution, ParamValue, Result, Sampler, Storage};
//!
//! /// A sampler that always picks the lower bound.
//! struct LowSampler;
//!
//! impl Sampler for LowSampler {
//!     fn sample(
//!         &self,
//!         _storage: &dyn Storage,
//!         _study_id: u64,
//!         _trial_id: u64,
//!         _param_name: &str,
//!         distribution: &Distribution,
//!     ) -> Result<ParamValue> {
//!         Ok(match distribution {
//!             Distribution::Float(d) => ParamValue::Float(d.low),
//!             Distribution::Int(d) => ParamValue::Int(d.low),
//!             Distribution::Categorical(_) => ParamValue::Categorical(0),
//!         })
//!     }
//! }
//! ```
//!
//! # Thread safety
//!
//! The [`Sampler`] trait requires `Send + Sync`. [`Study`](crate::Study)
//! stores the sampler as `Arc<dyn Sampler>`. Stateless samplers derive their
//! randomness from a seed, the trial id, and the distribution, using an
//! [`AtomicU64`](core::sync::atomic::AtomicU64) call counter to tell calls
//! within one trial apart; see [`RandomSampler`].

pub mod random;
pub mod successive_halving;

pub use random::RandomSampler;
pub use successive_halving::SuccessiveHalvingSampler;

use crate::distribution::Distribution;
use crate::error::Result;
use crate::param::ParamValue;
use crate::storage::Storage;

/// Trait for pluggable parameter sampling strategies.
pub trait Sampler: Send + Sync {
    /// Samples a value for `param_name` of the in-flight trial `trial_id`.
    ///
    /// # Arguments
    ///
    /// * `storage` - The backend the study lives in; the source of history.
    /// * `study_id` - The study being optimized.
    /// * `trial_id` - The in-flight trial requesting a value.
    /// * `param_name` - The parameter being sampled.
    /// * `distribution` - The domain to sample from.
    ///
    /// # Errors
    ///
    /// Storage errors hit while reading history are returned unchanged.
    fn sample(
        &self,
        storage: &dyn Storage,
        study_id: u64,
        trial_id: u64,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue>;
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn sample(
        &self,
        storage: &dyn Storage,
        study_id: u64,
        trial_id: u64,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue> {
        (**self).sample(storage, study_id, trial_id, param_name, distribution)
    }
}
