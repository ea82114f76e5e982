//! The state container: owns the state and serializes every mutation.

use crate::core::Reducer;
use crate::effects::{CancelId, Effect, EffectRuntime};
use crate::store::builder::StoreBuilder;
use crate::store::handle::StoreHandle;
use std::fmt::Debug;
use tokio::sync::watch;
use tracing::debug;

/// Runtime for one feature tree.
///
/// `send` applies the reducer synchronously and hands the returned effect to
/// the [`EffectRuntime`]. Actions emitted by effects, or sent through a
/// [`StoreHandle`], queue up on a single channel and re-enter the reducer one
/// at a time when the store is driven with [`process_next`] or
/// [`run_until_idle`]. `send` drains that queue before its own action, so
/// actions are reduced in the order they arrived. Nothing else mutates the
/// state.
///
/// Effects are spawned on the ambient tokio runtime, so a store that sends
/// effectful actions must be used from within one.
///
/// [`process_next`]: Store::process_next
/// [`run_until_idle`]: Store::run_until_idle
///
/// # Example
///
/// ```rust
/// use tether::core::Reduce;
/// use tether::effects::Effect;
/// use tether::store::Store;
///
/// #[derive(Clone, Debug)]
/// enum Action {
///     Start,
///     Loaded(u32),
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let reducer = Reduce::new(|total: &mut u32, action: Action| match action {
///     Action::Start => Effect::future(async { Action::Loaded(40) }),
///     Action::Loaded(n) => {
///         *total += n;
///         Effect::none()
///     }
/// });
///
/// let mut store = Store::new(2, reducer);
/// store.send(Action::Start);
/// store.run_until_idle().await;
/// assert_eq!(*store.state(), 42);
/// # });
/// ```
pub struct Store<R: Reducer> {
    reducer: R,
    state: R::State,
    effects: EffectRuntime<R::Action>,
    snapshots: watch::Sender<R::State>,
    label: String,
}

impl<R> Store<R>
where
    R: Reducer,
    R::State: Clone + Send + Sync + 'static,
    R::Action: Debug,
{
    pub fn new(initial: R::State, reducer: R) -> Self {
        Self::with_label(initial, reducer, "store")
    }

    pub fn builder() -> StoreBuilder<R> {
        StoreBuilder::new()
    }

    pub(crate) fn with_label(initial: R::State, reducer: R, label: impl Into<String>) -> Self {
        let (snapshots, _) = watch::channel(initial.clone());
        Self {
            reducer,
            state: initial,
            effects: EffectRuntime::new(),
            snapshots,
            label: label.into(),
        }
    }

    pub fn state(&self) -> &R::State {
        &self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Process `action` and start the effects it returns.
    ///
    /// Actions already waiting in the queue are processed first.
    pub fn send(&mut self, action: R::Action) {
        while let Some(queued) = self.effects.try_next() {
            self.dispatch(queued);
        }
        self.dispatch(action);
    }

    fn dispatch(&mut self, action: R::Action) {
        let effect = self.apply(action);
        self.effects.execute(effect);
    }

    /// Run the reducer without starting the returned effect.
    pub(crate) fn apply(&mut self, action: R::Action) -> Effect<R::Action> {
        debug!(store = %self.label, ?action, "processing action");
        let effect = self.reducer.reduce(&mut self.state, action);
        self.snapshots.send_replace(self.state.clone());
        effect
    }

    /// Handle for sending actions from outside the store, e.g. a view.
    pub fn handle(&self) -> StoreHandle<R::Action> {
        StoreHandle::new(self.effects.external_emitter())
    }

    /// Snapshots of the state, updated after every processed action.
    pub fn observe(&self) -> watch::Receiver<R::State> {
        self.snapshots.subscribe()
    }

    /// Wait for the next queued action and process it.
    pub async fn process_next(&mut self) -> bool {
        match self.effects.recv().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Process queued actions until no effect is running and nothing is
    /// queued. Returns the number of actions processed.
    ///
    /// Effects that never finish keep this from returning; bound it with
    /// `tokio::time::timeout` if the feature runs long-lived effects.
    pub async fn run_until_idle(&mut self) -> usize {
        let mut processed = 0;
        while let Some(action) = self.effects.next_while_busy().await {
            self.dispatch(action);
            processed += 1;
        }
        processed
    }

    /// Cancellation ids with a running effect.
    pub fn in_flight(&self) -> Vec<CancelId> {
        self.effects.in_flight()
    }

    /// Number of running effects, cancellable or not.
    pub fn running(&self) -> usize {
        self.effects.running()
    }

    pub fn cancel(&mut self, id: &CancelId) {
        self.effects.cancel(id);
    }

    /// Cancel every running effect. Returns how many were stopped.
    pub fn cancel_all(&mut self) -> usize {
        self.effects.cancel_all()
    }
}

impl<R: Reducer> Store<R> {
    pub(crate) fn effects_mut(&mut self) -> &mut EffectRuntime<R::Action> {
        &mut self.effects
    }

    pub(crate) fn effects(&self) -> &EffectRuntime<R::Action> {
        &self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Reduce;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum Action {
        Add(i64),
        AddLater(i64),
        Watch,
    }

    #[derive(Debug, Hash)]
    struct Watcher;

    fn counter() -> impl Reducer<State = i64, Action = Action> {
        Reduce::new(|total: &mut i64, action: Action| match action {
            Action::Add(n) => {
                *total += n;
                Effect::none()
            }
            Action::AddLater(n) => Effect::future(async move { Action::Add(n) }),
            Action::Watch => Effect::run(|_emitter| std::future::pending::<()>())
                .cancellable(CancelId::new(Watcher)),
        })
    }

    #[tokio::test]
    async fn send_applies_synchronously() {
        let mut store = Store::new(0, counter());
        store.send(Action::Add(3));
        assert_eq!(*store.state(), 3);
    }

    #[tokio::test]
    async fn effect_actions_reenter_the_reducer() {
        let mut store = Store::new(0, counter());
        store.send(Action::AddLater(5));
        store.send(Action::AddLater(6));

        assert_eq!(store.run_until_idle().await, 2);
        assert_eq!(*store.state(), 11);
    }

    #[tokio::test]
    async fn handle_actions_are_queued_in_order() {
        let mut store = Store::new(1, counter());
        let handle = store.handle();
        assert!(handle.send(Action::Add(1)));
        assert!(handle.send(Action::Add(2)));

        assert!(store.process_next().await);
        assert_eq!(*store.state(), 2);
        assert!(store.process_next().await);
        assert_eq!(*store.state(), 4);
    }

    #[tokio::test]
    async fn send_processes_queued_actions_first() {
        let reducer = Reduce::new(|log: &mut Vec<i64>, action: Action| {
            if let Action::Add(n) = action {
                log.push(n);
            }
            Effect::none()
        });
        let mut store = Store::new(Vec::new(), reducer);
        let handle = store.handle();
        assert!(handle.send(Action::Add(1)));
        assert!(handle.send(Action::Add(2)));

        store.send(Action::Add(3));

        assert_eq!(store.state(), &vec![1, 2, 3]);
        let idle = tokio::time::timeout(Duration::from_secs(1), store.run_until_idle()).await;
        assert_eq!(idle.ok(), Some(0));
    }

    #[tokio::test]
    async fn observers_see_every_update() {
        let mut store = Store::new(0, counter());
        let mut snapshots = store.observe();

        store.send(Action::Add(9));

        assert!(snapshots.has_changed().unwrap());
        assert_eq!(*snapshots.borrow_and_update(), 9);
    }

    #[tokio::test]
    async fn cancel_all_stops_long_running_effects() {
        let mut store = Store::new(0, counter());
        store.send(Action::Watch);
        assert_eq!(store.in_flight().len(), 1);

        assert_eq!(store.cancel_all(), 1);
        assert!(store.in_flight().is_empty());
        let idle = tokio::time::timeout(Duration::from_secs(1), store.run_until_idle()).await;
        assert_eq!(idle.ok(), Some(0));
    }
}
