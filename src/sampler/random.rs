//! Uniform random sampler.
//!
//! Draws every parameter independently and ignores history. Useful as a
//! baseline and as the base sampler under a
//! [`SuccessiveHalvingSampler`](super::SuccessiveHalvingSampler).

use core::sync::atomic::{AtomicU64, Ordering};

use crate::distribution::Distribution;
use crate::error::Result;
use crate::param::ParamValue;
use crate::rng_util;
use crate::storage::Storage;

use super::Sampler;

/// A sampler that draws uniformly from each distribution.
///
/// Stateless apart from a call counter: the RNG for each call is seeded from
/// the sampler seed, the trial id, a fingerprint of the parameter name and
/// distribution, and the call sequence number.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{Direction, RandomSampler, Study};
///
/// let study = Study::builder()
///     .direction(Direction::Minimize)
///     .sampler(RandomSampler::with_seed(42))
///     .build()
///     .unwrap();
/// ```
pub struct RandomSampler {
    seed: u64,
    call_seq: AtomicU64,
}

impl RandomSampler {
    /// Creates a sampler with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    /// Creates a sampler with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            call_seq: AtomicU64::new(0),
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn draw(rng: &mut fastrand::Rng, distribution: &Distribution) -> ParamValue {
        match distribution {
            Distribution::Float(d) => {
                let value = if d.log_scale {
                    rng_util::f64_range(rng, d.low.ln(), d.high.ln()).exp()
                } else if let Some(step) = d.step {
                    // Tolerance keeps e.g. 0.3 / 0.1 = 2.999... from losing the top point.
                    let n_steps = ((d.high - d.low) / step + 1e-9).floor() as u64;
                    d.low + rng.u64(0..=n_steps) as f64 * step
                } else {
                    rng_util::f64_range(rng, d.low, d.high)
                };
                ParamValue::Float(value.clamp(d.low, d.high))
            }
            Distribution::Int(d) => {
                let value = if d.log_scale {
                    let (log_low, log_high) = ((d.low as f64).ln(), (d.high as f64 + 1.0).ln());
                    let raw = rng_util::f64_range(rng, log_low, log_high).exp().floor() as i64;
                    raw.clamp(d.low, d.high)
                } else if let Some(step) = d.step {
                    // Widened so spans near the i64 limits cannot overflow.
                    let n_steps = d.high.abs_diff(d.low) / step.unsigned_abs();
                    let offset = i128::from(rng.u64(0..=n_steps)) * i128::from(step);
                    i64::try_from(i128::from(d.low) + offset).unwrap_or(d.high)
                } else {
                    rng.i64(d.low..=d.high)
                };
                ParamValue::Int(value)
            }
            Distribution::Categorical(d) => ParamValue::Categorical(rng.usize(..d.n_choices)),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &self,
        _storage: &dyn Storage,
        _study_id: u64,
        trial_id: u64,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue> {
        let seq = self.call_seq.fetch_add(1, Ordering::Relaxed);
        let fingerprint = rng_util::distribution_fingerprint(param_name, distribution);
        let mut rng = fastrand::Rng::with_seed(rng_util::mix_seed(
            self.seed,
            trial_id,
            fingerprint.wrapping_add(seq),
        ));
        Ok(Self::draw(&mut rng, distribution))
    }
}
