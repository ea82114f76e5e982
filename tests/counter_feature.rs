//! End-to-end tests for a counter feature driven by a virtual clock and an
//! injected fact client.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tether::core::{Reduce, Reducer};
use tether::dependencies::{Clock, Dependencies, TestClock};
use tether::effects::{CancelId, Effect};
use tether::store::Store;
use tether::testing::{Exhaustivity, TestStore};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Counter {
    count: i64,
    timer_running: bool,
    loading: bool,
    fact: Option<String>,
    fact_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
enum Action {
    Increment,
    ToggleTimer,
    Tick,
    FactButtonTapped,
    FactResponse(Result<String, String>),
}

#[derive(Debug, Hash)]
enum Cancel {
    Timer,
    Fact,
}

#[derive(Debug, Error)]
enum FactError {
    #[error("fact service unavailable")]
    Unavailable,
}

#[async_trait]
trait FactClient: Send + Sync {
    async fn fetch(&self, number: i64) -> Result<String, FactError>;
}

struct InstantFacts;

#[async_trait]
impl FactClient for InstantFacts {
    async fn fetch(&self, number: i64) -> Result<String, FactError> {
        Ok(format!("{number} is a good number"))
    }
}

struct FailingFacts;

#[async_trait]
impl FactClient for FailingFacts {
    async fn fetch(&self, _number: i64) -> Result<String, FactError> {
        Err(FactError::Unavailable)
    }
}

/// Answers after one second on the given clock.
struct SlowFacts {
    clock: TestClock,
}

#[async_trait]
impl FactClient for SlowFacts {
    async fn fetch(&self, number: i64) -> Result<String, FactError> {
        self.clock.sleep(Duration::from_secs(1)).await;
        Ok(format!("{number} is a slow number"))
    }
}

fn counter(
    deps: Dependencies,
    facts: Arc<dyn FactClient>,
) -> impl Reducer<State = Counter, Action = Action> {
    Reduce::new(move |state: &mut Counter, action: Action| match action {
        Action::Increment => {
            state.count += 1;
            Effect::none()
        }
        Action::ToggleTimer => {
            state.timer_running = !state.timer_running;
            if !state.timer_running {
                return Effect::cancel(CancelId::new(Cancel::Timer));
            }
            let clock = Arc::clone(&deps.clock);
            Effect::run(move |emitter| async move {
                loop {
                    clock.sleep(Duration::from_secs(1)).await;
                    if !emitter.emit(Action::Tick) {
                        break;
                    }
                }
            })
            .cancellable(CancelId::new(Cancel::Timer))
        }
        Action::Tick => {
            state.count += 1;
            Effect::none()
        }
        Action::FactButtonTapped => {
            state.loading = true;
            let facts = Arc::clone(&facts);
            let number = state.count;
            Effect::future(async move {
                Action::FactResponse(facts.fetch(number).await.map_err(|e| e.to_string()))
            })
            .cancellable(CancelId::new(Cancel::Fact))
        }
        Action::FactResponse(Ok(fact)) => {
            state.loading = false;
            state.fact = Some(fact);
            Effect::none()
        }
        Action::FactResponse(Err(message)) => {
            state.loading = false;
            state.fact_error = Some(message);
            Effect::none()
        }
    })
}

fn test_store(
    clock: &TestClock,
    facts: Arc<dyn FactClient>,
) -> TestStore<impl Reducer<State = Counter, Action = Action>> {
    TestStore::new(
        Counter::default(),
        counter(Dependencies::test(clock.clone()), facts),
    )
}

#[tokio::test]
async fn timer_ticks_on_virtual_clock_until_toggled_off() {
    let clock = TestClock::new();
    let mut store = test_store(&clock, Arc::new(InstantFacts));

    store
        .send(Action::ToggleTimer, |s| s.timer_running = true)
        .await
        .unwrap();

    clock.advance(Duration::from_secs(1)).await;
    store.receive(Action::Tick, |s| s.count = 1).await.unwrap();
    clock.advance(Duration::from_secs(1)).await;
    store.receive(Action::Tick, |s| s.count = 2).await.unwrap();

    store
        .send(Action::ToggleTimer, |s| s.timer_running = false)
        .await
        .unwrap();
    clock.advance(Duration::from_secs(10)).await;

    assert_eq!(clock.pending_sleepers(), 0);
    store.finish().await.unwrap();
}

#[tokio::test]
async fn advancing_before_the_deadline_emits_nothing() {
    let clock = TestClock::new();
    let mut store = test_store(&clock, Arc::new(InstantFacts));

    store
        .send(Action::ToggleTimer, |s| s.timer_running = true)
        .await
        .unwrap();
    clock.advance(Duration::from_millis(999)).await;

    // An unexpected tick would be reported as unreceived here.
    store.send(Action::Increment, |s| s.count = 1).await.unwrap();

    clock.advance(Duration::from_millis(1)).await;
    store.receive(Action::Tick, |s| s.count = 2).await.unwrap();
    store
        .send(Action::ToggleTimer, |s| s.timer_running = false)
        .await
        .unwrap();
    store.finish().await.unwrap();
}

#[tokio::test]
async fn fact_request_delivers_response() {
    let clock = TestClock::new();
    let mut store = test_store(&clock, Arc::new(InstantFacts));

    store.send(Action::Increment, |s| s.count = 1).await.unwrap();
    store
        .send(Action::FactButtonTapped, |s| s.loading = true)
        .await
        .unwrap();
    store
        .receive(
            Action::FactResponse(Ok("1 is a good number".to_string())),
            |s| {
                s.loading = false;
                s.fact = Some("1 is a good number".to_string());
            },
        )
        .await
        .unwrap();
    store.finish().await.unwrap();
}

#[tokio::test]
async fn fact_failure_becomes_an_action() {
    let clock = TestClock::new();
    let mut store = test_store(&clock, Arc::new(FailingFacts));

    store
        .send(Action::FactButtonTapped, |s| s.loading = true)
        .await
        .unwrap();
    store
        .receive(
            Action::FactResponse(Err("fact service unavailable".to_string())),
            |s| {
                s.loading = false;
                s.fact_error = Some("fact service unavailable".to_string());
            },
        )
        .await
        .unwrap();
    store.finish().await.unwrap();
}

#[tokio::test]
async fn repeated_fact_request_supersedes_the_first() {
    let clock = TestClock::new();
    let facts = Arc::new(SlowFacts {
        clock: clock.clone(),
    });
    let mut store = test_store(&clock, facts);

    store
        .send(Action::FactButtonTapped, |s| s.loading = true)
        .await
        .unwrap();
    store.send(Action::Increment, |s| s.count = 1).await.unwrap();
    store.send(Action::FactButtonTapped, |_| {}).await.unwrap();
    assert_eq!(store.store().in_flight(), vec![CancelId::new(Cancel::Fact)]);

    clock.advance(Duration::from_secs(1)).await;
    store
        .receive(
            Action::FactResponse(Ok("1 is a slow number".to_string())),
            |s| {
                s.loading = false;
                s.fact = Some("1 is a slow number".to_string());
            },
        )
        .await
        .unwrap();

    // The superseded request never answers.
    store.finish().await.unwrap();
}

#[tokio::test]
async fn non_exhaustive_run_skips_intermediate_ticks() {
    let clock = TestClock::new();
    let mut store = test_store(&clock, Arc::new(InstantFacts)).with_exhaustivity(
        Exhaustivity::Off {
            show_skipped_assertions: true,
        },
    );

    store.send(Action::ToggleTimer, |_| {}).await.unwrap();
    clock.advance(Duration::from_secs(3)).await;

    assert_eq!(store.skip_received_actions().await, 3);
    store.assert_state(|s| s.count = 3).unwrap();

    store
        .send(Action::ToggleTimer, |s| s.timer_running = false)
        .await
        .unwrap();
    store.finish().await.unwrap();
}

#[tokio::test]
async fn live_store_processes_actions_from_a_handle() {
    let mut store = Store::new(
        Counter::default(),
        counter(Dependencies::live(), Arc::new(InstantFacts)),
    );
    let handle = store.handle();
    let mut snapshots = store.observe();

    assert!(handle.send(Action::Increment));
    assert!(store.process_next().await);
    assert_eq!(snapshots.borrow_and_update().count, 1);

    store.send(Action::FactButtonTapped);
    assert_eq!(store.run_until_idle().await, 1);
    assert_eq!(store.state().fact.as_deref(), Some("1 is a good number"));
    assert!(!store.state().loading);
}
