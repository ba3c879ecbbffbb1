#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Asynchronous successive-halving (ASHA-style) sampler for hyperparameter
//! search. The [`SuccessiveHalvingSampler`] wraps any base [`Sampler`] and,
//! on every sampling call, narrows the trial history the base sampler sees
//! to the trials of the single arm that is currently being evaluated.
//!
//! # Getting Started
//!
//! ```
//! use optimizer_sha::prelude::*;
//!
//! let sampler = SuccessiveHalvingSampler::builder(RandomSampler::with_seed(7))
//!     .min_resource(4)
//!     .reduction_factor(2)
//!     .build()
//!     .unwrap();
//! let study = Study::builder().minimize().sampler(sampler).build().unwrap();
//!
//! study
//!     .optimize(40, |trial| {
//!         let x = trial.suggest_float("x", -10.0, 10.0)?;
//!         let y = trial.suggest_int("y", -5, 5)?;
//!         Ok::<_, Error>(x * x + y as f64)
//!     })
//!     .unwrap();
//!
//! assert_eq!(study.trials().unwrap().len(), 40);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Arm`] | One competing configuration: its trials and running best value. |
//! | [`RungEntry`] | A rung slot, holding either a waiting arm or a promotion marker. |
//! | [`SuccessiveHalving`] | The rung ladder and promotion state machine, rebuilt by replay. |
//! | [`SuccessiveHalvingSampler`] | Replays history, then calls the base sampler on the active arm. |
//! | [`FilteredStorage`] | A [`Storage`] view that only exposes the active arm's trials. |
//! | [`Study`] | Drives ask/tell loops against a [`Storage`] backend. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on trial records, distributions, and values | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at promotion and sampling points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod distribution;
mod error;
mod param;
mod rng_util;
pub mod sampler;
pub mod storage;
mod study;
mod trial;
mod types;

pub use distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
pub use error::{Error, Result, TrialPruned};
pub use param::ParamValue;
pub use sampler::Sampler;
pub use sampler::random::RandomSampler;
pub use sampler::successive_halving::{
    Arm, RungEntry, SuccessiveHalving, SuccessiveHalvingSampler, SuccessiveHalvingSamplerBuilder,
};
pub use storage::{FilteredStorage, MemoryStorage, Storage, StudySummary};
pub use study::{Study, StudyBuilder};
pub use trial::{AttrValue, FrozenTrial, Trial};
pub use types::{Direction, TrialState};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use optimizer_sha::prelude::*;
/// ```
pub mod prelude {
    pub use crate::distribution::Distribution;
    pub use crate::error::{Error, Result, TrialPruned};
    pub use crate::param::ParamValue;
    pub use crate::sampler::Sampler;
    pub use crate::sampler::random::RandomSampler;
    pub use crate::sampler::successive_halving::SuccessiveHalvingSampler;
    pub use crate::storage::{MemoryStorage, Storage};
    pub use crate::study::{Study, StudyBuilder};
    pub use crate::trial::{AttrValue, FrozenTrial, Trial};
    pub use crate::types::{Direction, TrialState};
}
