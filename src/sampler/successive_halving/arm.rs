use crate::trial::FrozenTrial;
use crate::types::Direction;

/// One competing configuration: the trials it has accumulated and the best
/// value among them.
///
/// An arm works through rungs of growing observation budgets. Its budget
/// starts at `min_resource` and is multiplied by `reduction_factor` each
/// time it is promoted; its trial history is never reset.
///
/// `best_value` is direction-normalized so lower is always better: maximized
/// objectives are negated, and trials without a usable value (absent or NaN)
/// count as `+inf`.
#[derive(Clone, Debug)]
pub struct Arm {
    id: u64,
    min_resource: usize,
    reduction_factor: usize,
    rung_steps: usize,
    trials: Vec<FrozenTrial>,
    best_value: f64,
}

impl Arm {
    pub(super) fn new(id: u64, min_resource: usize, reduction_factor: usize) -> Self {
        Self {
            id,
            min_resource,
            reduction_factor,
            rung_steps: min_resource,
            trials: Vec::new(),
            best_value: f64::INFINITY,
        }
    }

    /// Lineage id, assigned by the engine when the arm is started. A promoted
    /// arm keeps its id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of trials this arm must hold before its current rung is complete.
    #[must_use]
    pub fn rung_steps(&self) -> usize {
        self.rung_steps
    }

    /// Number of trials told to this arm so far.
    #[must_use]
    pub fn curr_steps(&self) -> usize {
        self.trials.len()
    }

    /// Index `i` of the current rung, where
    /// `rung_steps == min_resource * reduction_factor^i`.
    #[must_use]
    pub fn rung(&self) -> usize {
        let mut steps = self.min_resource;
        let mut rung = 0;
        while steps < self.rung_steps {
            steps = steps.saturating_mul(self.reduction_factor);
            rung += 1;
        }
        rung
    }

    /// Best normalized value seen so far (`+inf` before any usable value).
    #[must_use]
    pub fn best_value(&self) -> f64 {
        self.best_value
    }

    /// Trials in the order they were told.
    #[must_use]
    pub fn trials(&self) -> &[FrozenTrial] {
        &self.trials
    }

    pub(super) fn is_rung_complete(&self) -> bool {
        self.curr_steps() >= self.rung_steps
    }

    pub(super) fn promote(&mut self) {
        self.rung_steps = self.rung_steps.saturating_mul(self.reduction_factor);
    }

    pub(super) fn tell(&mut self, trial: FrozenTrial, direction: Direction) {
        let value = normalized_value(&trial, direction);
        self.trials.push(trial);
        self.best_value = self.best_value.min(value);
    }

    pub(super) fn into_trials(self) -> Vec<FrozenTrial> {
        self.trials
    }
}

/// The trial's objective on a lower-is-better scale.
fn normalized_value(trial: &FrozenTrial, direction: Direction) -> f64 {
    match trial.value {
        Some(v) if !v.is_nan() => match direction {
            Direction::Minimize => v,
            Direction::Maximize => -v,
        },
        _ => f64::INFINITY,
    }
}
