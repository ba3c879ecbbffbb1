//! Study direction and trial lifecycle states.

/// Whether the study minimizes or maximizes the objective value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Lower objective values are better.
    #[default]
    Minimize,
    /// Higher objective values are better.
    Maximize,
}

/// The lifecycle state of a trial.
///
/// A trial starts `Running` and moves to exactly one finished state.
/// Finished trials can no longer be updated in a [`Storage`](crate::Storage).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrialState {
    /// The trial is being evaluated.
    Running,
    /// The objective returned a value.
    Complete,
    /// The objective stopped early via [`TrialPruned`](crate::TrialPruned).
    Pruned,
    /// The objective returned an error.
    Failed,
}

impl TrialState {
    /// Returns `true` for every state except [`Running`](Self::Running).
    #[must_use]
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Running)
    }
}
