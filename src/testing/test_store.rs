//! Deterministic driver for asserting a feature's behavior.

use crate::core::Reducer;
use crate::effects::settle;
use crate::store::Store;
use crate::testing::diff::state_diff;
use crate::testing::error::HarnessError;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::warn;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// How strictly a [`TestStore`] checks the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exhaustivity {
    /// Every state change must be described and every effect action received
    #[default]
    On,
    /// Only what the test asserts is checked; the rest is tolerated
    Off { show_skipped_assertions: bool },
}

/// Test driver over a [`Store`].
///
/// Every `send` and `receive` takes a closure describing the expected state
/// change. With [`Exhaustivity::On`] the closure is applied to the state
/// before the action and must reproduce the new state exactly, actions
/// emitted by effects must be received in order, and nothing may be left
/// over. With [`Exhaustivity::Off`] the closure only has to agree with the
/// new state, and unreceived actions are applied as they arrive.
///
/// In both modes [`finish`] fails if any effect is still running.
///
/// [`finish`]: TestStore::finish
///
/// # Example
///
/// ```rust
/// use tether::core::Reduce;
/// use tether::effects::Effect;
/// use tether::testing::TestStore;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Action {
///     Increment,
///     Double,
/// }
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let reducer = Reduce::new(|count: &mut i32, action: Action| match action {
///     Action::Increment => {
///         *count += 1;
///         Effect::send(Action::Double)
///     }
///     Action::Double => {
///         *count *= 2;
///         Effect::none()
///     }
/// });
///
/// let mut store = TestStore::new(1, reducer);
/// store.send(Action::Increment, |count| *count = 2).await.unwrap();
/// store.receive(Action::Double, |count| *count = 4).await.unwrap();
/// store.finish().await.unwrap();
/// # });
/// ```
pub struct TestStore<R: Reducer> {
    store: Store<R>,
    exhaustivity: Exhaustivity,
    timeout: Duration,
    received: VecDeque<R::Action>,
    finished: bool,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug + Serialize + Send + Sync + 'static,
    R::Action: Clone + PartialEq + Debug,
{
    pub fn new(initial: R::State, reducer: R) -> Self {
        Self {
            store: Store::with_label(initial, reducer, "test"),
            exhaustivity: Exhaustivity::default(),
            timeout: DEFAULT_TIMEOUT,
            received: VecDeque::new(),
            finished: false,
        }
    }

    pub fn with_exhaustivity(mut self, exhaustivity: Exhaustivity) -> Self {
        self.exhaustivity = exhaustivity;
        self
    }

    /// How long `receive` and `finish` wait for effects.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn set_exhaustivity(&mut self, exhaustivity: Exhaustivity) {
        self.exhaustivity = exhaustivity;
    }

    pub fn exhaustivity(&self) -> Exhaustivity {
        self.exhaustivity
    }

    pub fn state(&self) -> &R::State {
        self.store.state()
    }

    pub fn store(&self) -> &Store<R> {
        &self.store
    }

    /// Send `action` and check the resulting state.
    ///
    /// In exhaustive mode this fails if effects have delivered actions that
    /// were not yet received.
    pub async fn send<F>(&mut self, action: R::Action, update: F) -> Result<(), HarnessError>
    where
        F: Fn(&mut R::State),
    {
        settle().await;
        self.collect_ready();
        match self.exhaustivity {
            Exhaustivity::On if !self.received.is_empty() => {
                return Err(HarnessError::UnreceivedActions {
                    actions: self.received.iter().map(|a| format!("{a:?}")).collect(),
                });
            }
            Exhaustivity::On => {}
            Exhaustivity::Off { .. } => self.skip_buffered(),
        }

        let label = format!("{action:?}");
        self.step(action, label, update)
    }

    /// Wait for the next action delivered by an effect, check that it is
    /// `expected`, process it and check the resulting state.
    ///
    /// In non-exhaustive mode, other actions arriving first are processed
    /// and skipped.
    pub async fn receive<F>(&mut self, expected: R::Action, update: F) -> Result<(), HarnessError>
    where
        F: Fn(&mut R::State),
    {
        let label = format!("{expected:?}");
        loop {
            let action = self.next_received(&label).await?;
            if action == expected {
                return self.step(action, label, update);
            }
            match self.exhaustivity {
                Exhaustivity::On => {
                    return Err(HarnessError::UnexpectedAction {
                        expected: label,
                        actual: format!("{action:?}"),
                    });
                }
                Exhaustivity::Off {
                    show_skipped_assertions,
                } => {
                    if show_skipped_assertions {
                        warn!(skipped = ?action, expected = %label, "skipping received action");
                    }
                    self.process(action);
                }
            }
        }
    }

    /// Check the current state without sending anything.
    pub fn assert_state<F>(&self, update: F) -> Result<(), HarnessError>
    where
        F: FnOnce(&mut R::State),
    {
        let actual = self.store.state();
        let mut expected = actual.clone();
        update(&mut expected);
        if expected == *actual {
            Ok(())
        } else {
            Err(HarnessError::StateMismatch {
                action: "state assertion".to_string(),
                diffs: state_diff(&expected, actual),
            })
        }
    }

    /// Process every action effects have delivered so far without asserting
    /// on them. Returns how many were skipped.
    pub async fn skip_received_actions(&mut self) -> usize {
        settle().await;
        self.collect_ready();
        let skipped = self.received.len();
        self.skip_buffered();
        skipped
    }

    /// Cancel every running effect. Returns how many were cancelled.
    pub async fn skip_in_flight_effects(&mut self) -> usize {
        settle().await;
        self.collect_ready();
        let described = self.store.effects().describe_in_flight();
        if let Exhaustivity::Off {
            show_skipped_assertions: true,
        } = self.exhaustivity
        {
            for effect in &described {
                warn!(%effect, "cancelling in-flight effect");
            }
        }
        self.store.cancel_all()
    }

    /// End the test.
    ///
    /// Waits up to the timeout for running effects to complete, then reports
    /// every effect still running and, in exhaustive mode, every action that
    /// was delivered but never received. Remaining effects are cancelled.
    pub async fn finish(mut self) -> Result<(), HarnessError> {
        self.finished = true;
        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            let next = tokio::time::timeout_at(deadline, self.store.effects_mut().next_while_busy());
            match next.await {
                Ok(Some(action)) => match self.exhaustivity {
                    Exhaustivity::On => self.received.push_back(action),
                    Exhaustivity::Off { .. } => self.process(action),
                },
                Ok(None) | Err(_) => break,
            }
        }

        let unreceived = if self.received.is_empty() {
            Validation::success(())
        } else {
            Validation::fail(HarnessError::UnreceivedActions {
                actions: self.received.iter().map(|a| format!("{a:?}")).collect(),
            })
        };
        let leaked = if self.store.effects().is_idle() {
            Validation::success(())
        } else {
            Validation::fail(HarnessError::LeakedEffects {
                effects: self.store.effects().describe_in_flight(),
            })
        };
        self.store.cancel_all();

        let checks: Vec<Validation<(), NonEmptyVec<HarnessError>>> = vec![unreceived, leaked];
        match Validation::all_vec(checks).map(|_| ()) {
            Validation::Success(()) => Ok(()),
            Validation::Failure(errors) => Err(HarnessError::combine(errors)),
        }
    }

    fn step<F>(&mut self, action: R::Action, label: String, update: F) -> Result<(), HarnessError>
    where
        F: Fn(&mut R::State),
    {
        let previous = self.store.state().clone();
        self.process(action);
        let actual = self.store.state();

        let expected = match self.exhaustivity {
            Exhaustivity::On => {
                let mut expected = previous;
                update(&mut expected);
                expected
            }
            Exhaustivity::Off {
                show_skipped_assertions,
            } => {
                if show_skipped_assertions {
                    let mut strict = previous;
                    update(&mut strict);
                    if strict != *actual {
                        for diff in state_diff(&strict, actual) {
                            warn!(action = %label, %diff, "state change not asserted");
                        }
                    }
                }
                let mut expected = actual.clone();
                update(&mut expected);
                expected
            }
        };

        if expected == *actual {
            Ok(())
        } else {
            Err(HarnessError::StateMismatch {
                action: label,
                diffs: state_diff(&expected, actual),
            })
        }
    }

    fn process(&mut self, action: R::Action) {
        let effect = self.store.apply(action);
        self.store.effects_mut().execute(effect);
    }

    fn collect_ready(&mut self) {
        while let Some(action) = self.store.effects_mut().try_next() {
            self.received.push_back(action);
        }
    }

    fn skip_buffered(&mut self) {
        while let Some(action) = self.received.pop_front() {
            if let Exhaustivity::Off {
                show_skipped_assertions: true,
            } = self.exhaustivity
            {
                warn!(skipped = ?action, "skipping received action");
            }
            self.process(action);
        }
    }

    async fn next_received(&mut self, expected: &str) -> Result<R::Action, HarnessError> {
        if let Some(action) = self.received.pop_front() {
            return Ok(action);
        }
        let next = tokio::time::timeout(self.timeout, self.store.effects_mut().next_while_busy());
        match next.await {
            Ok(Some(action)) => Ok(action),
            Ok(None) => Err(HarnessError::NoEffectsInFlight {
                expected: expected.to_string(),
            }),
            Err(_) => Err(HarnessError::ReceiveTimeout {
                expected: expected.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

impl<R: Reducer> Drop for TestStore<R> {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        let running = self.store.effects().describe_in_flight();
        if !running.is_empty() {
            panic!(
                "TestStore dropped with {} effect(s) still running: {}. Call finish() or skip_in_flight_effects() before the end of the test",
                running.len(),
                running.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Reduce;
    use crate::effects::{CancelId, Effect};

    #[derive(Clone, Debug, PartialEq, Serialize)]
    struct Counter {
        count: i32,
        loading: bool,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Action {
        Increment,
        Fetch,
        Fetched(i32),
        Listen,
    }

    #[derive(Debug, Hash)]
    struct Listener;

    fn counter() -> impl Reducer<State = Counter, Action = Action> {
        Reduce::new(|state: &mut Counter, action: Action| match action {
            Action::Increment => {
                state.count += 1;
                Effect::none()
            }
            Action::Fetch => {
                state.loading = true;
                Effect::future(async { Action::Fetched(42) })
            }
            Action::Fetched(value) => {
                state.loading = false;
                state.count = value;
                Effect::none()
            }
            Action::Listen => Effect::run(|_emitter| std::future::pending::<()>())
                .cancellable(CancelId::new(Listener)),
        })
    }

    fn initial() -> Counter {
        Counter {
            count: 0,
            loading: false,
        }
    }

    #[tokio::test]
    async fn exhaustive_run_passes() {
        let mut store = TestStore::new(initial(), counter());
        store.send(Action::Fetch, |s| s.loading = true).await.unwrap();
        store
            .receive(Action::Fetched(42), |s| {
                s.loading = false;
                s.count = 42;
            })
            .await
            .unwrap();
        store.finish().await.unwrap();
    }

    #[tokio::test]
    async fn incomplete_description_is_a_mismatch() {
        let mut store = TestStore::new(initial(), counter());
        let error = store.send(Action::Fetch, |_| {}).await.unwrap_err();

        let HarnessError::StateMismatch { action, diffs } = &error else {
            panic!("expected mismatch, got {error}");
        };
        assert_eq!(action, "Fetch");
        assert_eq!(diffs[0].path, "$.loading");
        store.skip_received_actions().await;
    }

    #[tokio::test]
    async fn non_exhaustive_accepts_partial_updates() {
        let mut store = TestStore::new(initial(), counter()).with_exhaustivity(Exhaustivity::Off {
            show_skipped_assertions: false,
        });
        store.send(Action::Increment, |_| {}).await.unwrap();
        store.send(Action::Fetch, |_| {}).await.unwrap();
        store.receive(Action::Fetched(42), |s| s.count = 42).await.unwrap();
        store.finish().await.unwrap();
    }

    #[tokio::test]
    async fn receive_without_effects_fails_fast() {
        let mut store = TestStore::new(initial(), counter());
        let error = store.receive(Action::Fetched(1), |_| {}).await.unwrap_err();
        assert!(matches!(error, HarnessError::NoEffectsInFlight { .. }));
    }

    #[tokio::test]
    async fn leaked_effect_fails_finish() {
        let mut store = TestStore::new(initial(), counter()).with_timeout(Duration::from_millis(20));
        store.send(Action::Listen, |_| {}).await.unwrap();

        let error = store.finish().await.unwrap_err();
        let HarnessError::LeakedEffects { effects } = error else {
            panic!("expected leak, got {error}");
        };
        assert_eq!(effects, vec!["effect #0 [Listener]".to_string()]);
    }

    #[tokio::test]
    async fn skipping_in_flight_effects_allows_clean_finish() {
        let mut store = TestStore::new(initial(), counter());
        store.send(Action::Listen, |_| {}).await.unwrap();
        assert_eq!(store.skip_in_flight_effects().await, 1);
        store.finish().await.unwrap();
    }
}
