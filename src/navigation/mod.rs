//! Navigation: presented children, stacks, and identified collections.
//!
//! Each navigation container pairs a state type with an action type and a
//! reducer combinator:
//!
//! | State | Action | Combinator |
//! |-------|--------|------------|
//! | [`PresentationState`] | [`PresentationAction`] | [`IfLet`] via `Reducer::if_let` |
//! | [`StackState`] | [`StackAction`] | [`ForEachStack`] via `Reducer::for_each_stack` |
//! | `IdentifiedVec` | [`IdentifiedAction`] | [`ForEach`] via `Reducer::for_each` |
//!
//! Actions addressed to something that is no longer there are dropped
//! silently: an effect may legitimately race with the removal of the child
//! it belongs to. Removing a child always cancels the effects it started.

mod error;
mod for_each;
mod presentation;
mod stack;

pub use error::StackError;
pub use for_each::{ForEach, IdentifiedAction};
pub use presentation::{IfLet, PresentationAction, PresentationState};
pub use stack::{ForEachStack, StackAction, StackElementId, StackState};
