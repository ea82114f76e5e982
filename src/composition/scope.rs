//! Embedding a child reducer into a parent domain.

use crate::composition::lens::{Case, Field, Lens};
use crate::core::{CasePath, Reducer};
use crate::effects::Effect;
use tracing::trace;

/// Runs a child reducer on a region of the parent state.
///
/// Actions are unwrapped through `action`; anything that is not the child's
/// case is ignored. Effects returned by the child are lifted so the actions
/// they emit come back wrapped in the parent case.
///
/// # Example
///
/// ```rust
/// use tether::case;
/// use tether::composition::Scope;
/// use tether::core::{Reduce, Reducer};
/// use tether::effects::Effect;
///
/// #[derive(Default)]
/// struct App {
///     counter: i32,
/// }
///
/// #[derive(Clone, Debug)]
/// enum AppAction {
///     Counter(i32),
///     Other,
/// }
///
/// let counter = Reduce::new(|count: &mut i32, delta: i32| {
///     *count += delta;
///     Effect::none()
/// });
/// let app = Scope::new(|app: &mut App| &mut app.counter, case!(AppAction::Counter), counter);
///
/// let mut state = App::default();
/// let _ = app.reduce(&mut state, AppAction::Counter(3));
/// let _ = app.reduce(&mut state, AppAction::Other);
/// assert_eq!(state.counter, 3);
/// ```
pub struct Scope<PS, PA, C: Reducer> {
    state: Box<dyn Lens<PS, C::State>>,
    action: CasePath<PA, C::Action>,
    child: C,
}

impl<PS, PA, C> Scope<PS, PA, C>
where
    PS: 'static,
    PA: Send + 'static,
    C: Reducer,
    C::State: 'static,
{
    /// Scope into a field of the parent state.
    pub fn new<L>(state: L, action: CasePath<PA, C::Action>, child: C) -> Self
    where
        L: Fn(&mut PS) -> &mut C::State + Send + Sync + 'static,
    {
        Self::with_lens(Field::new(state), action, child)
    }

    /// Scope into one case of an enum parent state. Actions arriving while
    /// the state is in another case are dropped.
    pub fn case<L>(state: L, action: CasePath<PA, C::Action>, child: C) -> Self
    where
        L: Fn(&mut PS) -> Option<&mut C::State> + Send + Sync + 'static,
    {
        Self::with_lens(Case::new(state), action, child)
    }

    pub fn with_lens<L>(state: L, action: CasePath<PA, C::Action>, child: C) -> Self
    where
        L: Lens<PS, C::State> + 'static,
    {
        Self {
            state: Box::new(state),
            action,
            child,
        }
    }
}

impl<PS, PA, C> Reducer for Scope<PS, PA, C>
where
    PA: Send + 'static,
    C: Reducer,
{
    type State = PS;
    type Action = PA;

    fn reduce(&self, state: &mut PS, action: PA) -> Effect<PA> {
        let Some(child_action) = self.action.extract(action) else {
            return Effect::none();
        };
        let Some(child_state) = self.state.project(state) else {
            trace!(
                child = std::any::type_name::<C::State>(),
                "dropping action for inactive state case"
            );
            return Effect::none();
        };
        self.child
            .reduce(child_state, child_action)
            .lift(self.action.embedder(), None)
    }
}
