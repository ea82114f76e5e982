//! Per-element reducers over an identified collection.

use crate::composition::Lens;
use crate::core::{CasePath, Identifiable, IdentifiedVec, Reducer};
use crate::effects::{collection_token, Effect, ScopeSegment};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Action addressed to one element of an [`IdentifiedVec`].
#[derive(Clone, Debug, PartialEq)]
pub enum IdentifiedAction<Id, A> {
    Element { id: Id, action: A },
}

/// Parent reducer running a child reducer for each element of a collection.
///
/// Built with [`Reducer::for_each`]. The addressed element runs first, then
/// the parent. Actions for ids not in the collection are dropped. When the
/// parent removes an element, its in-flight effects are cancelled.
///
/// Each `ForEach` has its own cancellation namespace, so two collections
/// whose ids overlap never cancel each other's effects.
pub struct ForEach<P: Reducer, C: Reducer>
where
    C::State: Identifiable,
{
    parent: P,
    elements: Box<dyn Lens<P::State, IdentifiedVec<C::State>>>,
    action: CasePath<P::Action, IdentifiedAction<<C::State as Identifiable>::Id, C::Action>>,
    child: C,
    token: u64,
}

impl<P, C> ForEach<P, C>
where
    P: Reducer,
    C: Reducer,
    C::State: Identifiable,
{
    pub fn new<L>(
        parent: P,
        elements: L,
        action: CasePath<P::Action, IdentifiedAction<<C::State as Identifiable>::Id, C::Action>>,
        child: C,
    ) -> Self
    where
        L: Lens<P::State, IdentifiedVec<C::State>> + 'static,
    {
        Self {
            parent,
            elements: Box::new(elements),
            action,
            child,
            token: collection_token(),
        }
    }
}

impl<P, C> Reducer for ForEach<P, C>
where
    P: Reducer,
    P::Action: Clone,
    C: Reducer,
    C::State: Identifiable,
    <C::State as Identifiable>::Id: Send + Sync + 'static,
{
    type State = P::State;
    type Action = P::Action;

    fn reduce(&self, state: &mut P::State, action: P::Action) -> Effect<P::Action> {
        let before: Vec<<C::State as Identifiable>::Id> = self
            .elements
            .project(state)
            .map(|elements| elements.ids().cloned().collect())
            .unwrap_or_default();

        let element_effect = match self.action.extract(action.clone()) {
            Some(IdentifiedAction::Element { id, action }) => {
                match self
                    .elements
                    .project(state)
                    .and_then(|elements| elements.get_mut(&id))
                {
                    Some(element) => {
                        let path = self.action.clone();
                        let segment = ScopeSegment::member::<C::State>(self.token, &id);
                        self.child.reduce(element, action).scoped(&segment).lift(
                            Arc::new(move |action| {
                                path.embed(IdentifiedAction::Element {
                                    id: id.clone(),
                                    action,
                                })
                            }),
                            None,
                        )
                    }
                    None => {
                        trace!(?id, "dropping action for element no longer in the collection");
                        Effect::none()
                    }
                }
            }
            None => Effect::none(),
        };

        let parent_effect = self.parent.reduce(state, action);

        let remaining: HashSet<<C::State as Identifiable>::Id> = self
            .elements
            .project(state)
            .map(|elements| elements.ids().cloned().collect())
            .unwrap_or_default();
        let teardown: Vec<Effect<P::Action>> = before
            .into_iter()
            .filter(|id| !remaining.contains(id))
            .map(|id| {
                trace!(?id, "element removed, cancelling its effects");
                Effect::cancel_scope(vec![ScopeSegment::member::<C::State>(self.token, &id)])
            })
            .collect();

        Effect::merge([element_effect, parent_effect].into_iter().chain(teardown))
    }
}
