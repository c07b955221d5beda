//! Lifecycle phases of a single workshop invocation.
//!
//! One process run walks through these phases once:
//!
//! - `Idle` -> `Selecting` (select/print or a menu selection)
//! - `Idle` -> `Executing` (run/verify)
//! - `Selecting` -> `Ended` once the exercise text is printed
//! - `Executing` -> `Passed` | `Failed` | `Errored`
//! - `Passed` | `Failed` | `Errored` -> `Ended` after cleanup
//! - `Selecting` -> `Errored` when preparing or loading the text fails

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkshopError};

/// Phase of the exercise lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing dispatched yet.
    #[default]
    Idle,
    /// Resolving an exercise and printing its instructions.
    Selecting,
    /// The exercise is running or verifying.
    Executing,
    /// Verification succeeded.
    Passed,
    /// Verification failed.
    Failed,
    /// The exercise or the controller reported an error.
    Errored,
    /// Cleanup finished; the process is about to exit.
    Ended,
}

impl Phase {
    /// Returns `true` if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Returns `true` if the exercise has produced a result.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Errored)
    }

    /// Returns `true` if moving from `self` to `to` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Selecting | Self::Executing)
                | (Self::Selecting, Self::Ended | Self::Errored)
                | (Self::Executing, Self::Passed | Self::Failed | Self::Errored)
                | (Self::Passed | Self::Failed | Self::Errored, Self::Ended)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Selecting => write!(f, "selecting"),
            Self::Executing => write!(f, "executing"),
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Errored => write!(f, "errored"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Tracks the phase of the current invocation and rejects illegal moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifecycle {
    phase: Phase,
    history: Vec<Phase>,
}

impl Lifecycle {
    /// Creates a lifecycle in the `Idle` phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase left so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Moves to `to`.
    ///
    /// # Errors
    ///
    /// Returns `WorkshopError::InvalidStateTransition` if the move is not allowed.
    pub fn transition(&mut self, to: Phase) -> Result<()> {
        if !self.phase.can_transition_to(to) {
            return Err(WorkshopError::invalid_transition(self.phase, to));
        }
        tracing::debug!(from = %self.phase, to = %to, "Lifecycle transition");
        self.history.push(self.phase);
        self.phase = to;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_default_is_idle() {
        assert_eq!(Phase::default(), Phase::Idle);
        assert_eq!(Lifecycle::new().phase(), Phase::Idle);
    }

    #[test]
    fn test_phase_is_resolved() {
        assert!(Phase::Passed.is_resolved());
        assert!(Phase::Failed.is_resolved());
        assert!(Phase::Errored.is_resolved());
        assert!(!Phase::Executing.is_resolved());
        assert!(!Phase::Ended.is_resolved());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Selecting.to_string(), "selecting");
        assert_eq!(Phase::Errored.to_string(), "errored");
    }

    #[test]
    fn test_phase_serialization() {
        assert_eq!(
            serde_json::to_string(&Phase::Executing).unwrap(),
            "\"executing\""
        );
    }

    #[test]
    fn test_verify_pass_path() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.transition(Phase::Executing).unwrap();
        lifecycle.transition(Phase::Passed).unwrap();
        lifecycle.transition(Phase::Ended).unwrap();
        assert!(lifecycle.phase().is_terminal());
        assert_eq!(
            lifecycle.history(),
            &[Phase::Idle, Phase::Executing, Phase::Passed]
        );
    }

    #[test]
    fn test_select_path() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.transition(Phase::Selecting).unwrap();
        lifecycle.transition(Phase::Ended).unwrap();
        assert_eq!(lifecycle.phase(), Phase::Ended);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.transition(Phase::Passed).unwrap_err();
        assert!(err.to_string().contains("cannot go from idle to passed"));

        lifecycle.transition(Phase::Selecting).unwrap();
        assert!(lifecycle.transition(Phase::Passed).is_err());

        lifecycle.transition(Phase::Ended).unwrap();
        assert!(lifecycle.transition(Phase::Idle).is_err());
        assert_eq!(lifecycle.phase(), Phase::Ended);
    }
}
