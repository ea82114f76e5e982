//! Delegate actions: child-to-parent notifications.
//!
//! A feature that needs to tell its parent something emits a delegate
//! action. Only an ancestor may act on it; the feature's own reducer must
//! treat its delegate case as a no-op. [`DelegateGuard`] intercepts delegate
//! actions before the wrapped reducer runs and, in debug builds, verifies
//! that the reducer would indeed have done nothing.

use crate::core::Reducer;
use crate::effects::Effect;
use std::fmt::Debug;
use thiserror::Error;
use tracing::error;

/// Actions that carry a delegate case.
///
/// ```rust
/// use tether::composition::Delegating;
///
/// #[derive(Clone, Debug)]
/// enum FormAction {
///     TitleChanged(String),
///     Delegate(FormDelegate),
/// }
///
/// #[derive(Clone, Debug)]
/// enum FormDelegate {
///     Saved,
/// }
///
/// impl Delegating for FormAction {
///     fn is_delegate(&self) -> bool {
///         matches!(self, Self::Delegate(_))
///     }
/// }
///
/// assert!(FormAction::Delegate(FormDelegate::Saved).is_delegate());
/// ```
pub trait Delegating {
    fn is_delegate(&self) -> bool;
}

/// A feature acted on its own delegate action.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DelegateViolation {
    #[error("delegate action {action} mutated its own feature's state")]
    MutatedState { action: String },

    #[error("delegate action {action} returned an effect from its own feature")]
    ReturnedEffect { action: String },
}

/// Check that `reducer` treats `action` as a structural no-op.
///
/// Runs the reducer on a copy of `state`; the returned effect is dropped
/// without being executed.
pub fn check_delegate_inert<R>(
    reducer: &R,
    state: &R::State,
    action: R::Action,
) -> Result<(), DelegateViolation>
where
    R: Reducer,
    R::State: Clone + PartialEq,
    R::Action: Debug,
{
    let label = format!("{action:?}");
    let mut scratch = state.clone();
    let effect = reducer.reduce(&mut scratch, action);
    if scratch != *state {
        return Err(DelegateViolation::MutatedState { action: label });
    }
    if !effect.is_none() {
        return Err(DelegateViolation::ReturnedEffect { action: label });
    }
    Ok(())
}

/// Wraps a feature reducer so its delegate actions never reach it.
pub struct DelegateGuard<R> {
    inner: R,
}

impl<R> DelegateGuard<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R> Reducer for DelegateGuard<R>
where
    R: Reducer,
    R::Action: Delegating + Clone + Debug,
    R::State: Clone + PartialEq + Debug,
{
    type State = R::State;
    type Action = R::Action;

    fn reduce(&self, state: &mut R::State, action: R::Action) -> Effect<R::Action> {
        if !action.is_delegate() {
            return self.inner.reduce(state, action);
        }
        if cfg!(debug_assertions) {
            if let Err(violation) = check_delegate_inert(&self.inner, state, action) {
                error!(%violation, "feature handled its own delegate action");
                panic!("{violation}");
            }
        }
        Effect::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Reduce;

    #[derive(Clone, Debug, PartialEq)]
    enum Action {
        Edit,
        Delegate,
    }

    impl Delegating for Action {
        fn is_delegate(&self) -> bool {
            matches!(self, Self::Delegate)
        }
    }

    fn well_behaved() -> impl Reducer<State = u32, Action = Action> {
        Reduce::new(|state: &mut u32, action: Action| {
            match action {
                Action::Edit => *state += 1,
                Action::Delegate => {}
            }
            Effect::none()
        })
    }

    fn self_consuming() -> impl Reducer<State = u32, Action = Action> {
        Reduce::new(|state: &mut u32, _action: Action| {
            *state += 1;
            Effect::none()
        })
    }

    #[test]
    fn inert_delegate_passes() {
        assert_eq!(check_delegate_inert(&well_behaved(), &0, Action::Delegate), Ok(()));
    }

    #[test]
    fn mutating_delegate_is_reported() {
        assert_eq!(
            check_delegate_inert(&self_consuming(), &0, Action::Delegate),
            Err(DelegateViolation::MutatedState {
                action: "Delegate".to_string()
            })
        );
    }

    #[test]
    fn effectful_delegate_is_reported() {
        let reducer = Reduce::new(|_state: &mut u32, _action: Action| Effect::send(Action::Edit));
        assert!(matches!(
            check_delegate_inert(&reducer, &0, Action::Delegate),
            Err(DelegateViolation::ReturnedEffect { .. })
        ));
    }

    #[test]
    fn guard_forwards_ordinary_actions() {
        let reducer = well_behaved().guard_delegates();
        let mut state = 0;
        let _ = reducer.reduce(&mut state, Action::Edit);
        let _ = reducer.reduce(&mut state, Action::Delegate);
        assert_eq!(state, 1);
    }

    #[test]
    #[should_panic(expected = "mutated its own feature's state")]
    fn guard_panics_on_self_consumed_delegate_in_debug() {
        let reducer = self_consuming().guard_delegates();
        let mut state = 0;
        let _ = reducer.reduce(&mut state, Action::Delegate);
    }
}
