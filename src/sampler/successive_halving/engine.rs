use core::mem;

use super::arm::Arm;
use crate::error::{Error, Result};
use crate::trial::FrozenTrial;
use crate::types::Direction;

/// Checks a `(min_resource, reduction_factor)` pair.
pub(super) fn validate_config(min_resource: usize, reduction_factor: usize) -> Result<()> {
    if min_resource == 0 {
        return Err(Error::InvalidMinResource);
    }
    if reduction_factor < 2 {
        return Err(Error::InvalidReductionFactor(reduction_factor));
    }
    Ok(())
}

/// A slot in a rung: an arm that completed the rung and is waiting, or the
/// marker left behind by an arm that was promoted out of it.
#[derive(Clone, Debug)]
pub enum RungEntry {
    /// An arm that completed this rung and has not been promoted.
    Arm(Arm),
    /// The frozen best value of an arm promoted out of this rung. It only
    /// takes part in ranking and is never promoted again.
    Promoted {
        /// The arm's normalized best value at promotion time.
        best_value: f64,
    },
}

impl RungEntry {
    /// The normalized best value this slot is ranked by.
    #[must_use]
    pub fn best_value(&self) -> f64 {
        match self {
            Self::Arm(arm) => arm.best_value(),
            Self::Promoted { best_value } => *best_value,
        }
    }

    /// Returns `true` for a promotion marker.
    #[must_use]
    pub fn is_promoted(&self) -> bool {
        matches!(self, Self::Promoted { .. })
    }
}

/// The rung ladder and promotion state machine.
///
/// Exactly one arm is active at a time and receives every told trial. When
/// the active arm has filled its budget, the next [`tell`](Self::tell) first
/// files it into its rung and runs the promotion scan:
///
/// 1. The rung is re-sorted by ascending best value. The sort is stable, so
///    among equal values the entry that reached the rung first ranks first.
/// 2. The top `len / reduction_factor` slots are scanned in rank order; the
///    first slot still holding an arm is promoted. Its slot becomes a
///    [`RungEntry::Promoted`] marker and the same arm, history intact, becomes
///    active with its budget multiplied by `reduction_factor`.
/// 3. If no slot qualifies, a fresh arm with an empty history and a budget of
///    `min_resource` becomes active.
///
/// Only then is the incoming trial recorded, into whichever arm is active
/// after the advance.
///
/// The engine is meant to be rebuilt from scratch for each sampling call by
/// replaying the study's trials in id order.
///
/// # Examples
///
/// ```
/// use optimizer_sha::{Direction, FrozenTrial, SuccessiveHalving, TrialState};
///
/// let mut sha = SuccessiveHalving::new(Direction::Minimize, 2, 2).unwrap();
/// for id in 0..3 {
///     let mut trial = FrozenTrial::new(id, id);
///     trial.value = Some(id as f64);
///     trial.state = TrialState::Complete;
///     sha.tell(trial).unwrap();
/// }
///
/// // The first arm filled its budget of 2 alone on rung 0, so the third
/// // trial went to a fresh arm.
/// assert_eq!(sha.active().curr_steps(), 1);
/// assert_eq!(sha.rungs()[0].len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct SuccessiveHalving {
    direction: Direction,
    min_resource: usize,
    reduction_factor: usize,
    active: Arm,
    rungs: Vec<Vec<RungEntry>>,
    next_arm_id: u64,
    last_trial_id: Option<u64>,
}

impl SuccessiveHalving {
    /// Creates an engine with one empty active arm and no rungs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMinResource`] if `min_resource` is zero and
    /// [`Error::InvalidReductionFactor`] if `reduction_factor` is below 2.
    pub fn new(direction: Direction, min_resource: usize, reduction_factor: usize) -> Result<Self> {
        validate_config(min_resource, reduction_factor)?;
        Ok(Self {
            direction,
            min_resource,
            reduction_factor,
            active: Arm::new(0, min_resource, reduction_factor),
            rungs: Vec::new(),
            next_arm_id: 1,
            last_trial_id: None,
        })
    }

    /// Records `trial`, advancing the active arm first if its budget is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TrialOrder`] if `trial.id` is not greater than the id
    /// of the previously told trial. The engine is left unchanged.
    pub fn tell(&mut self, trial: FrozenTrial) -> Result<()> {
        if let Some(previous) = self.last_trial_id
            && trial.id <= previous
        {
            return Err(Error::TrialOrder {
                previous,
                current: trial.id,
            });
        }
        self.last_trial_id = Some(trial.id);

        if self.active.is_rung_complete() {
            self.advance();
        }
        self.active.tell(trial, self.direction);
        Ok(())
    }

    /// The arm currently receiving trials.
    #[must_use]
    pub fn active(&self) -> &Arm {
        &self.active
    }

    /// The rung ladder; `rungs()[i]` holds the entries that completed rung
    /// `i`, sorted by ascending best value as of the last insertion.
    #[must_use]
    pub fn rungs(&self) -> &[Vec<RungEntry>] {
        &self.rungs
    }

    /// The direction trial values are normalized from.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Consumes the engine, returning the active arm's trials.
    #[must_use]
    pub fn into_active_trials(self) -> Vec<FrozenTrial> {
        self.active.into_trials()
    }

    fn advance(&mut self) {
        let rung = self.active.rung();
        while self.rungs.len() <= rung {
            self.rungs.push(Vec::new());
        }

        let fresh = Arm::new(self.next_arm_id, self.min_resource, self.reduction_factor);
        let finished = mem::replace(&mut self.active, fresh);
        let entries = &mut self.rungs[rung];
        entries.push(RungEntry::Arm(finished));
        entries.sort_by(|a, b| a.best_value().total_cmp(&b.best_value()));

        let n_promotable = entries.len() / self.reduction_factor;
        let Some(slot) = entries
            .iter_mut()
            .take(n_promotable)
            .find(|entry| !entry.is_promoted())
        else {
            trace_debug!(rung, arm = self.next_arm_id, "no arm promotable, starting a fresh arm");
            self.next_arm_id += 1;
            return;
        };

        let best_value = slot.best_value();
        if let RungEntry::Arm(mut arm) = mem::replace(slot, RungEntry::Promoted { best_value }) {
            trace_debug!(rung, arm = arm.id(), best_value, "arm promoted");
            arm.promote();
            self.active = arm;
        }
    }
}
