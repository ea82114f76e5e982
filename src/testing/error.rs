//! Test harness failures.

use crate::composition::DelegateViolation;
use crate::testing::diff::FieldDiff;
use std::time::Duration;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A failed assertion in a [`TestStore`](crate::testing::TestStore) run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HarnessError {
    /// State after an action differs from what the test described
    #[error("State mismatch after {action}:\n  {}", render_diffs(.diffs))]
    StateMismatch {
        action: String,
        diffs: Vec<FieldDiff>,
    },

    /// An effect delivered a different action than the one expected next
    #[error("Expected to receive {expected}, but received {actual}")]
    UnexpectedAction { expected: String, actual: String },

    /// No action arrived before the timeout
    #[error("Expected to receive {expected}, but nothing arrived within {timeout:?}")]
    ReceiveTimeout { expected: String, timeout: Duration },

    /// Receiving with nothing queued and nothing running
    #[error("Expected to receive {expected}, but no effects are in flight")]
    NoEffectsInFlight { expected: String },

    /// Actions delivered by effects that the test never received
    #[error("{} received action(s) were not asserted: {}", .actions.len(), .actions.join(", "))]
    UnreceivedActions { actions: Vec<String> },

    /// Effects still running when the test ended
    #[error("{} effect(s) still running at the end of the test: {}", .effects.len(), .effects.join(", "))]
    LeakedEffects { effects: Vec<String> },

    #[error(transparent)]
    Delegate(#[from] DelegateViolation),

    /// Several failures found together
    #[error("{} failures:\n{}", .0.len(), render_all(.0))]
    Teardown(Vec<HarnessError>),
}

impl HarnessError {
    /// A single failure as itself, several as [`HarnessError::Teardown`].
    pub(crate) fn combine(errors: NonEmptyVec<HarnessError>) -> Self {
        let mut errors: Vec<HarnessError> = errors.iter().cloned().collect();
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            HarnessError::Teardown(errors)
        }
    }
}

fn render_diffs(diffs: &[FieldDiff]) -> String {
    diffs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  ")
}

fn render_all(errors: &[HarnessError]) -> String {
    errors
        .iter()
        .map(|error| format!("- {error}"))
        .collect::<Vec<_>>()
        .join("\n")
}
