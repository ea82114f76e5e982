//! Navigation errors.

use crate::navigation::StackElementId;
use thiserror::Error;

/// Misuse of a navigation stack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StackError {
    /// Pushing with an id at or below one the stack has already held
    #[error("Stack element id {id} was already issued (ids from {floor} up are free). Push with StackState::next_id()")]
    IdAlreadyIssued { id: StackElementId, floor: StackElementId },
}
