//! Navigation stacks: an ordered, identity-keyed history of pushed features.

use crate::composition::Lens;
use crate::core::{CasePath, Reducer};
use crate::effects::{Effect, ScopeSegment};
use crate::navigation::StackError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, trace};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(0);

/// Identifier of a stack element.
///
/// Ids are drawn from one counter shared by every stack in the process, so
/// an id is never handed out twice, not even to a stack that replaced the
/// one it was first issued by.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackElementId(u64);

impl StackElementId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// A fresh id, distinct from every id issued so far in this process.
    pub fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Keep the process counter past an id that entered from outside, e.g.
    /// a deserialized stack.
    fn reserve(self) {
        NEXT_ELEMENT_ID.fetch_max(self.0.saturating_add(1), Ordering::Relaxed);
    }
}

impl fmt::Display for StackElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for StackElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Ordered stack of child states keyed by [`StackElementId`].
///
/// Ids come from a process-wide counter that only moves forward, so an id
/// popped off the stack is never handed out again, and two stacks never hold
/// the same id. Within a stack ids increase from bottom to top. Popping
/// always removes a contiguous suffix.
///
/// # Example
///
/// ```rust
/// use tether::navigation::StackState;
///
/// let mut path = StackState::new();
/// let list = path.push("list");
/// let detail = path.push("detail");
/// path.push("edit");
///
/// let removed = path.pop_from(detail);
/// assert_eq!(removed.len(), 2);
/// assert_eq!(path.ids().collect::<Vec<_>>(), vec![list]);
///
/// // Ids are not reused.
/// assert_ne!(path.push("again"), detail);
/// ```
#[derive(Clone)]
pub struct StackState<S> {
    elements: IndexMap<StackElementId, S>,
    /// Lowest id this stack still accepts.
    floor: u64,
}

impl<S> Default for StackState<S> {
    fn default() -> Self {
        Self {
            elements: IndexMap::new(),
            floor: 0,
        }
    }
}

impl<S> StackState<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `state` under a freshly issued id.
    pub fn push(&mut self, state: S) -> StackElementId {
        let id = StackElementId::next();
        self.floor = id.0.saturating_add(1);
        self.elements.insert(id, state);
        id
    }

    /// Append `state` under an id chosen ahead of time with [`next_id`].
    ///
    /// Fails if the id is not above every id this stack has held.
    ///
    /// [`next_id`]: StackState::next_id
    pub fn push_with_id(&mut self, id: StackElementId, state: S) -> Result<(), StackError> {
        if id.0 < self.floor {
            return Err(StackError::IdAlreadyIssued {
                id,
                floor: StackElementId(self.floor),
            });
        }
        id.reserve();
        self.floor = id.0.saturating_add(1);
        self.elements.insert(id, state);
        Ok(())
    }

    /// Reserve an id for a [`StackAction::Push`]. Every call returns a new id.
    pub fn next_id(&self) -> StackElementId {
        StackElementId::next()
    }

    /// Remove the element `id` and everything pushed after it.
    ///
    /// Returns the removed elements, bottom first. Popping an id that is not
    /// on the stack removes nothing.
    pub fn pop_from(&mut self, id: StackElementId) -> Vec<(StackElementId, S)> {
        match self.elements.get_index_of(&id) {
            Some(index) => self.elements.split_off(index).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn pop_last(&mut self) -> Option<(StackElementId, S)> {
        self.elements.pop()
    }

    pub fn get(&self, id: StackElementId) -> Option<&S> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: StackElementId) -> Option<&mut S> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: StackElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = StackElementId> + '_ {
        self.elements.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StackElementId, &S)> + '_ {
        self.elements.iter().map(|(id, state)| (*id, state))
    }

    pub fn last(&self) -> Option<(StackElementId, &S)> {
        self.elements.last().map(|(id, state)| (*id, state))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<S: PartialEq> PartialEq for StackState<S> {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self.elements.iter().eq(other.elements.iter())
    }
}

impl<S: fmt::Debug> fmt::Debug for StackState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.elements.iter()).finish()
    }
}

impl<S> FromIterator<S> for StackState<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut stack = Self::new();
        for state in iter {
            stack.push(state);
        }
        stack
    }
}

#[derive(Serialize)]
struct EntryRef<'a, S> {
    id: StackElementId,
    state: &'a S,
}

#[derive(Deserialize)]
struct Entry<S> {
    id: StackElementId,
    state: S,
}

impl<S: Serialize> Serialize for StackState<S> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        serializer.collect_seq(self.iter().map(|(id, state)| EntryRef { id, state }))
    }
}

impl<'de, S: Deserialize<'de>> Deserialize<'de> for StackState<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<Entry<S>>::deserialize(deserializer)?;
        let mut stack = Self::new();
        for entry in entries {
            stack
                .push_with_id(entry.id, entry.state)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(stack)
    }
}

/// Actions routed through a navigation stack.
#[derive(Clone, Debug, PartialEq)]
pub enum StackAction<S, A> {
    /// An action for the element `id`. Dropped if the element is gone.
    Element { id: StackElementId, action: A },
    /// Push `state`; `id` must come from [`StackState::next_id`].
    Push { id: StackElementId, state: S },
    /// Pop `id` and every element above it.
    PopFrom { id: StackElementId },
}

enum Mutation<S> {
    Push(StackElementId, S),
    PopFrom(StackElementId),
}

/// Parent reducer driving a stack of child features.
///
/// Built with [`Reducer::for_each_stack`]. Element actions run the element
/// first, then the parent. For `Push` and `PopFrom` the parent runs first,
/// while the stack is still unchanged, and the mutation is applied after.
/// Any element that leaves the stack, whoever removed it, has its effects
/// cancelled.
pub struct ForEachStack<P: Reducer, C: Reducer> {
    parent: P,
    stack: Box<dyn Lens<P::State, StackState<C::State>>>,
    action: CasePath<P::Action, StackAction<C::State, C::Action>>,
    child: C,
}

impl<P, C> ForEachStack<P, C>
where
    P: Reducer,
    C: Reducer,
    C::State: 'static,
{
    pub fn new<L>(
        parent: P,
        stack: L,
        action: CasePath<P::Action, StackAction<C::State, C::Action>>,
        child: C,
    ) -> Self
    where
        L: Lens<P::State, StackState<C::State>> + 'static,
    {
        Self {
            parent,
            stack: Box::new(stack),
            action,
            child,
        }
    }

    fn run_element(
        &self,
        stack: &mut StackState<C::State>,
        id: StackElementId,
        action: C::Action,
    ) -> Effect<P::Action> {
        let Some(element) = stack.get_mut(id) else {
            trace!(%id, "dropping action for element no longer on the stack");
            return Effect::none();
        };

        let embed_path = self.action.clone();
        let dismiss_path = self.action.clone();
        self.child
            .reduce(element, action)
            .scoped(&ScopeSegment::element::<C::State>(id))
            .lift(
                Arc::new(move |action| embed_path.embed(StackAction::Element { id, action })),
                Some(Arc::new(move || dismiss_path.embed(StackAction::PopFrom { id }))),
            )
    }

    fn apply(&self, stack: &mut StackState<C::State>, mutation: Mutation<C::State>) {
        match mutation {
            Mutation::Push(id, state) => {
                if let Err(err) = stack.push_with_id(id, state) {
                    error!(%err, "rejected stack push");
                    if cfg!(debug_assertions) {
                        panic!("{err}");
                    }
                }
            }
            Mutation::PopFrom(id) => {
                let removed = stack.pop_from(id);
                if removed.is_empty() {
                    trace!(%id, "pop for element no longer on the stack");
                }
            }
        }
    }
}

impl<P, C> Reducer for ForEachStack<P, C>
where
    P: Reducer,
    P::Action: Clone,
    C: Reducer,
    C::State: 'static,
{
    type State = P::State;
    type Action = P::Action;

    fn reduce(&self, state: &mut P::State, action: P::Action) -> Effect<P::Action> {
        let before: Vec<StackElementId> = self
            .stack
            .project(state)
            .map(|stack| stack.ids().collect())
            .unwrap_or_default();

        let (element_effect, mutation) = match self.action.extract(action.clone()) {
            Some(StackAction::Element { id, action }) => {
                let effect = match self.stack.project(state) {
                    Some(stack) => self.run_element(stack, id, action),
                    None => Effect::none(),
                };
                (effect, None)
            }
            Some(StackAction::Push { id, state: pushed }) => {
                (Effect::none(), Some(Mutation::Push(id, pushed)))
            }
            Some(StackAction::PopFrom { id }) => (Effect::none(), Some(Mutation::PopFrom(id))),
            None => (Effect::none(), None),
        };

        let parent_effect = self.parent.reduce(state, action);

        let Some(stack) = self.stack.project(state) else {
            return Effect::merge([element_effect, parent_effect]);
        };
        if let Some(mutation) = mutation {
            self.apply(stack, mutation);
        }

        let remaining: HashSet<StackElementId> = stack.ids().collect();
        let teardown = before
            .into_iter()
            .filter(|id| !remaining.contains(id))
            .map(|id| {
                trace!(%id, "stack element removed, cancelling its effects");
                Effect::cancel_scope(vec![ScopeSegment::element::<C::State>(id)])
            });

        Effect::merge(
            [element_effect, parent_effect]
                .into_iter()
                .chain(teardown)
                .collect::<Vec<_>>(),
        )
    }
}
