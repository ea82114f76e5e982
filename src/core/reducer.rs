//! The transition function abstraction.

use crate::composition::{DelegateGuard, Delegating, Field};
use crate::core::{CasePath, Identifiable, IdentifiedVec};
use crate::effects::Effect;
use crate::navigation::{
    ForEach, ForEachStack, IdentifiedAction, IfLet, PresentationAction, PresentationState,
    StackAction, StackState,
};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// A feature's transition function.
///
/// `reduce` must be pure apart from mutating `state`: it may not perform
/// I/O or block, and all asynchronous work is returned as an [`Effect`].
///
/// # Example
///
/// ```rust
/// use tether::core::Reducer;
/// use tether::effects::Effect;
///
/// #[derive(Debug)]
/// enum CounterAction {
///     Increment,
///     Decrement,
/// }
///
/// struct Counter;
///
/// impl Reducer for Counter {
///     type State = i64;
///     type Action = CounterAction;
///
///     fn reduce(&self, state: &mut i64, action: CounterAction) -> Effect<CounterAction> {
///         match action {
///             CounterAction::Increment => *state += 1,
///             CounterAction::Decrement => *state -= 1,
///         }
///         Effect::none()
///     }
/// }
///
/// let mut count = 0;
/// let effect = Counter.reduce(&mut count, CounterAction::Increment);
/// assert_eq!(count, 1);
/// assert!(effect.is_none());
/// ```
pub trait Reducer {
    type State;
    type Action: Send + 'static;

    fn reduce(&self, state: &mut Self::State, action: Self::Action) -> Effect<Self::Action>;

    /// Run `self`, then `other`, on every action. Effects are merged.
    fn combine<R>(self, other: R) -> Combine<Self, R>
    where
        Self: Sized,
        R: Reducer<State = Self::State, Action = Self::Action>,
    {
        Combine {
            first: self,
            second: other,
        }
    }

    /// Embed an optional child feature presented from `slot`.
    ///
    /// The child runs before `self` for `Presented` actions. When the
    /// presentation ends, all of the child's effects are cancelled.
    fn if_let<C, L>(
        self,
        slot: L,
        action: CasePath<Self::Action, PresentationAction<C::Action>>,
        child: C,
    ) -> IfLet<Self, C>
    where
        Self: Sized,
        C: Reducer,
        C::State: 'static,
        Self::State: 'static,
        L: Fn(&mut Self::State) -> &mut PresentationState<C::State> + Send + Sync + 'static,
    {
        IfLet::new(self, Field::new(slot), action, child)
    }

    /// Embed a navigation stack of child features held in `stack`.
    ///
    /// Elements run before `self` for `Element` actions; `self` runs before
    /// the stack is mutated for `Push` and `PopFrom`. Effects of removed
    /// elements are cancelled.
    fn for_each_stack<C, L>(
        self,
        stack: L,
        action: CasePath<Self::Action, StackAction<C::State, C::Action>>,
        child: C,
    ) -> ForEachStack<Self, C>
    where
        Self: Sized,
        C: Reducer,
        C::State: 'static,
        Self::State: 'static,
        L: Fn(&mut Self::State) -> &mut StackState<C::State> + Send + Sync + 'static,
    {
        ForEachStack::new(self, Field::new(stack), action, child)
    }

    /// Embed a child feature for every element of an identified collection.
    ///
    /// Elements run before `self`. Effects of elements removed from the
    /// collection are cancelled.
    fn for_each<C, L>(
        self,
        elements: L,
        action: CasePath<Self::Action, IdentifiedAction<<C::State as Identifiable>::Id, C::Action>>,
        child: C,
    ) -> ForEach<Self, C>
    where
        Self: Sized,
        C: Reducer,
        C::State: Identifiable + 'static,
        <C::State as Identifiable>::Id: Hash + Send + Sync + 'static,
        Self::State: 'static,
        L: Fn(&mut Self::State) -> &mut IdentifiedVec<C::State> + Send + Sync + 'static,
    {
        ForEach::new(self, Field::new(elements), action, child)
    }

    /// Intercept delegate actions before this reducer sees them.
    fn guard_delegates(self) -> DelegateGuard<Self>
    where
        Self: Sized,
        Self::Action: Delegating + Clone + Debug,
        Self::State: Clone + PartialEq + Debug,
    {
        DelegateGuard::new(self)
    }
}

/// Reducer built from a closure.
///
/// ```rust
/// use tether::core::{Reduce, Reducer};
/// use tether::effects::Effect;
///
/// let double = Reduce::new(|state: &mut u32, factor: u32| {
///     *state *= factor;
///     Effect::none()
/// });
///
/// let mut value = 3;
/// let _ = double.reduce(&mut value, 2);
/// assert_eq!(value, 6);
/// ```
pub struct Reduce<S, A, F> {
    body: F,
    _marker: PhantomData<fn(&mut S, A)>,
}

impl<S, A, F> Reduce<S, A, F>
where
    A: Send + 'static,
    F: Fn(&mut S, A) -> Effect<A>,
{
    pub fn new(body: F) -> Self {
        Self {
            body,
            _marker: PhantomData,
        }
    }
}

impl<S, A, F> Reducer for Reduce<S, A, F>
where
    A: Send + 'static,
    F: Fn(&mut S, A) -> Effect<A>,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &mut S, action: A) -> Effect<A> {
        (self.body)(state, action)
    }
}

/// Two reducers over the same domain, run in declaration order.
pub struct Combine<A, B> {
    first: A,
    second: B,
}

impl<A, B> Reducer for Combine<A, B>
where
    A: Reducer,
    A::Action: Clone,
    B: Reducer<State = A::State, Action = A::Action>,
{
    type State = A::State;
    type Action = A::Action;

    fn reduce(&self, state: &mut Self::State, action: Self::Action) -> Effect<Self::Action> {
        let first = self.first.reduce(state, action.clone());
        let second = self.second.reduce(state, action);
        Effect::merge([first, second])
    }
}

/// Reducer that ignores every action.
pub struct EmptyReducer<S, A>(PhantomData<fn(&mut S, A)>);

impl<S, A> Default for EmptyReducer<S, A> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<S, A> EmptyReducer<S, A> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, A: Send + 'static> Reducer for EmptyReducer<S, A> {
    type State = S;
    type Action = A;

    fn reduce(&self, _state: &mut S, _action: A) -> Effect<A> {
        Effect::none()
    }
}
