//! Test support: the [`TestStore`] harness and its failure reports.
//!
//! Harness methods return `Result<(), HarnessError>` instead of panicking, so
//! tests can `?` or `unwrap()` them and harness behavior itself can be
//! tested. State mismatches carry a list of [`FieldDiff`]s naming each
//! divergent field by its path.

mod diff;
mod error;
mod test_store;

pub use diff::{state_diff, FieldDiff};
pub use error::HarnessError;
pub use test_store::{Exhaustivity, TestStore};

use crate::composition::check_delegate_inert;
use crate::core::Reducer;
use std::fmt::Debug;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Check that `reducer` ignores each of its own delegate `actions` when run
/// from `state`. Every offending action is reported.
///
/// # Example
///
/// ```rust
/// use tether::core::Reduce;
/// use tether::effects::Effect;
/// use tether::testing::{assert_delegates_ignored, HarnessError};
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Action {
///     Save,
///     DelegateSaved,
/// }
///
/// let sloppy = Reduce::new(|saves: &mut u32, _action: Action| {
///     *saves += 1;
///     Effect::none()
/// });
///
/// let result = assert_delegates_ignored(&sloppy, &0, [Action::DelegateSaved]);
/// assert!(matches!(result, Err(HarnessError::Delegate(_))));
/// ```
pub fn assert_delegates_ignored<R, I>(
    reducer: &R,
    state: &R::State,
    actions: I,
) -> Result<(), HarnessError>
where
    R: Reducer,
    R::State: Clone + PartialEq,
    R::Action: Debug,
    I: IntoIterator<Item = R::Action>,
{
    let checks: Vec<Validation<(), NonEmptyVec<HarnessError>>> = actions
        .into_iter()
        .map(|action| match check_delegate_inert(reducer, state, action) {
            Ok(()) => Validation::success(()),
            Err(violation) => Validation::fail(HarnessError::from(violation)),
        })
        .collect();

    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Success(()) => Ok(()),
        Validation::Failure(errors) => Err(HarnessError::combine(errors)),
    }
}
