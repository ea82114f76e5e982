//! Presentation slots: an optional child feature (sheet, alert, drill-down).

use crate::composition::Lens;
use crate::core::{CasePath, Reducer};
use crate::effects::{Effect, ScopeSegment};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone)]
enum Phase<S> {
    Absent,
    Presented(S),
    Dismissing(S),
}

/// Slot holding at most one presented child state.
///
/// The slot moves `absent → presented → dismissing → absent`. Every
/// presentation gets a fresh generation, which namespaces the child's
/// effects; when the presentation ends they are cancelled together.
///
/// Equality and serialization only consider the presented value, so two
/// slots presenting equal states compare equal.
///
/// # Example
///
/// ```rust
/// use tether::navigation::PresentationState;
///
/// let mut sheet = PresentationState::default();
/// assert!(sheet.is_absent());
///
/// sheet.present("draft".to_string());
/// assert_eq!(sheet.get().map(String::as_str), Some("draft"));
///
/// assert!(sheet.dismiss());
/// assert!(!sheet.dismiss());
/// ```
#[derive(Clone)]
pub struct PresentationState<S> {
    phase: Phase<S>,
    generation: u64,
}

impl<S> Default for PresentationState<S> {
    fn default() -> Self {
        Self {
            phase: Phase::Absent,
            generation: 0,
        }
    }
}

impl<S> PresentationState<S> {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn presented(state: S) -> Self {
        Self {
            phase: Phase::Presented(state),
            generation: next_generation(),
        }
    }

    /// Present `state`, replacing whatever was presented before.
    pub fn present(&mut self, state: S) {
        *self = Self::presented(state);
    }

    /// Begin dismissing the presented child.
    ///
    /// Returns `false`, leaving the slot untouched, when nothing is presented
    /// or a dismissal is already under way.
    pub fn dismiss(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Absent) {
            Phase::Presented(state) => {
                self.phase = Phase::Dismissing(state);
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// Remove the child immediately, returning its state.
    pub fn take(&mut self) -> Option<S> {
        match std::mem::replace(&mut self.phase, Phase::Absent) {
            Phase::Presented(state) | Phase::Dismissing(state) => Some(state),
            Phase::Absent => None,
        }
    }

    pub fn is_presented(&self) -> bool {
        matches!(self.phase, Phase::Presented(_))
    }

    pub fn is_dismissing(&self) -> bool {
        matches!(self.phase, Phase::Dismissing(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.phase, Phase::Absent)
    }

    /// The child state while presented or being dismissed.
    pub fn get(&self) -> Option<&S> {
        match &self.phase {
            Phase::Presented(state) | Phase::Dismissing(state) => Some(state),
            Phase::Absent => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut S> {
        match &mut self.phase {
            Phase::Presented(state) | Phase::Dismissing(state) => Some(state),
            Phase::Absent => None,
        }
    }

    fn presented_mut(&mut self) -> Option<&mut S> {
        match &mut self.phase {
            Phase::Presented(state) => Some(state),
            _ => None,
        }
    }

    /// Generation of the current presentation, if any.
    fn live_generation(&self) -> Option<u64> {
        match self.phase {
            Phase::Absent => None,
            _ => Some(self.generation),
        }
    }

    /// Finish a pending dismissal.
    fn settle(&mut self) {
        if self.is_dismissing() {
            self.phase = Phase::Absent;
        }
    }
}

impl<S: PartialEq> PartialEq for PresentationState<S> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.phase, &other.phase) {
            (Phase::Absent, Phase::Absent) => true,
            (Phase::Presented(a), Phase::Presented(b)) => a == b,
            (Phase::Dismissing(a), Phase::Dismissing(b)) => a == b,
            _ => false,
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for PresentationState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.phase {
            Phase::Absent => f.write_str("Absent"),
            Phase::Presented(state) => f.debug_tuple("Presented").field(state).finish(),
            Phase::Dismissing(state) => f.debug_tuple("Dismissing").field(state).finish(),
        }
    }
}

impl<S: Serialize> Serialize for PresentationState<S> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        self.get().serialize(serializer)
    }
}

impl<'de, S: Deserialize<'de>> Deserialize<'de> for PresentationState<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<S>::deserialize(deserializer)? {
            Some(state) => Self::presented(state),
            None => Self::absent(),
        })
    }
}

/// Actions routed through a presentation slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresentationAction<A> {
    /// An action for the presented child.
    Presented(A),
    /// Dismiss the child, from the parent or from the child itself.
    Dismiss,
}

/// Parent reducer with an optional child presented from a slot.
///
/// Built with [`Reducer::if_let`]. For `Presented` actions the child runs
/// first, then the parent. `Dismiss` moves the slot to dismissing before the
/// parent runs, so the parent can still read the child's final state; the
/// slot is cleared at the end of the same reduction. Whenever a presentation
/// ends, every effect the child started is cancelled.
pub struct IfLet<P: Reducer, C: Reducer> {
    parent: P,
    slot: Box<dyn Lens<P::State, PresentationState<C::State>>>,
    action: CasePath<P::Action, PresentationAction<C::Action>>,
    child: C,
}

impl<P, C> IfLet<P, C>
where
    P: Reducer,
    C: Reducer,
{
    pub fn new<L>(
        parent: P,
        slot: L,
        action: CasePath<P::Action, PresentationAction<C::Action>>,
        child: C,
    ) -> Self
    where
        L: Lens<P::State, PresentationState<C::State>> + 'static,
    {
        Self {
            parent,
            slot: Box::new(slot),
            action,
            child,
        }
    }

    fn run_child(
        &self,
        slot: &mut PresentationState<C::State>,
        action: C::Action,
    ) -> Effect<P::Action> {
        let generation = slot.generation;
        let Some(child_state) = slot.presented_mut() else {
            trace!(
                child = std::any::type_name::<C::State>(),
                "dropping action for absent presentation"
            );
            return Effect::none();
        };

        let embed_path = self.action.clone();
        let dismiss_path = self.action.clone();
        self.child
            .reduce(child_state, action)
            .scoped(&ScopeSegment::presentation::<C::State>(generation))
            .lift(
                Arc::new(move |child_action| {
                    embed_path.embed(PresentationAction::Presented(child_action))
                }),
                Some(Arc::new(move || dismiss_path.embed(PresentationAction::Dismiss))),
            )
    }
}

impl<P, C> Reducer for IfLet<P, C>
where
    P: Reducer,
    P::Action: Clone,
    C: Reducer,
{
    type State = P::State;
    type Action = P::Action;

    fn reduce(&self, state: &mut P::State, action: P::Action) -> Effect<P::Action> {
        let before = self
            .slot
            .project(state)
            .and_then(|slot| slot.live_generation());

        let child_effect = match self.action.extract(action.clone()) {
            Some(PresentationAction::Presented(child_action)) => match self.slot.project(state) {
                Some(slot) => self.run_child(slot, child_action),
                None => Effect::none(),
            },
            Some(PresentationAction::Dismiss) => {
                let dismissed = self
                    .slot
                    .project(state)
                    .map(|slot| slot.dismiss())
                    .unwrap_or(false);
                if !dismissed {
                    trace!(
                        child = std::any::type_name::<C::State>(),
                        "ignoring dismiss of a slot that is not presented"
                    );
                    return Effect::none();
                }
                Effect::none()
            }
            None => Effect::none(),
        };

        let parent_effect = self.parent.reduce(state, action);

        let after = self.slot.project(state).and_then(|slot| {
            slot.settle();
            slot.live_generation()
        });

        let teardown = match before {
            Some(generation) if after != Some(generation) => {
                trace!(generation, "presentation ended, cancelling its effects");
                Effect::cancel_scope(vec![ScopeSegment::presentation::<C::State>(generation)])
            }
            _ => Effect::none(),
        };

        Effect::merge([child_effect, parent_effect, teardown])
    }
}
