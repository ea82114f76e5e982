//! A standups app composed from a list, a drill-down stack and a single
//! destination slot, exercised end to end through the test store.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tether::case;
use tether::composition::{Delegating, Scope};
use tether::core::{Identifiable, IdentifiedVec, Reduce, Reducer};
use tether::dependencies::{Clock, Dependencies, TestClock};
use tether::effects::{CancelId, Effect};
use tether::navigation::{
    IdentifiedAction, PresentationAction, PresentationState, StackAction, StackElementId,
    StackState,
};
use tether::testing::{assert_delegates_ignored, TestStore};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Standup {
    id: Uuid,
    title: String,
    minutes_elapsed: u32,
}

impl Identifiable for Standup {
    type Id = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }
}

fn standup(n: u128, title: &str) -> Standup {
    Standup {
        id: Uuid::from_u128(n),
        title: title.to_string(),
        minutes_elapsed: 0,
    }
}

// Row

#[derive(Clone, Debug, PartialEq)]
enum RowAction {
    StartMeeting,
    MinuteElapsed,
}

#[derive(Debug, Hash)]
struct Meeting;

fn row(clock: Arc<dyn Clock>) -> impl Reducer<State = Standup, Action = RowAction> {
    Reduce::new(move |standup: &mut Standup, action: RowAction| match action {
        RowAction::StartMeeting => {
            let clock = Arc::clone(&clock);
            Effect::run(move |emitter| async move {
                loop {
                    clock.sleep(Duration::from_secs(60)).await;
                    if !emitter.emit(RowAction::MinuteElapsed) {
                        break;
                    }
                }
            })
            .cancellable(CancelId::new(Meeting))
        }
        RowAction::MinuteElapsed => {
            standup.minutes_elapsed += 1;
            Effect::none()
        }
    })
}

// Detail

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Detail {
    standup: Standup,
}

#[derive(Clone, Debug, PartialEq)]
enum DetailAction {
    TitleChanged(String),
    SaveTapped,
    Delegate(DetailDelegate),
}

#[derive(Clone, Debug, PartialEq)]
enum DetailDelegate {
    Saved(Standup),
}

impl Delegating for DetailAction {
    fn is_delegate(&self) -> bool {
        matches!(self, Self::Delegate(_))
    }
}

fn detail_core() -> impl Reducer<State = Detail, Action = DetailAction> {
    Reduce::new(|detail: &mut Detail, action: DetailAction| match action {
        DetailAction::TitleChanged(title) => {
            detail.standup.title = title;
            Effect::none()
        }
        DetailAction::SaveTapped => {
            let saved = detail.standup.clone();
            Effect::run(move |emitter| async move {
                emitter.emit(DetailAction::Delegate(DetailDelegate::Saved(saved)));
                emitter.dismiss();
            })
        }
        DetailAction::Delegate(_) => Effect::none(),
    })
}

fn detail() -> impl Reducer<State = Detail, Action = DetailAction> {
    detail_core().guard_delegates()
}

// Destinations

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Form {
    title: String,
    suggesting: bool,
}

#[derive(Clone, Debug, PartialEq)]
enum FormAction {
    TitleChanged(String),
    SuggestTitle,
    SuggestionLoaded(String),
}

#[derive(Debug, Hash)]
struct Suggestion;

fn form(clock: Arc<dyn Clock>) -> impl Reducer<State = Form, Action = FormAction> {
    Reduce::new(move |form: &mut Form, action: FormAction| match action {
        FormAction::TitleChanged(title) => {
            form.title = title;
            Effect::none()
        }
        FormAction::SuggestTitle => {
            form.suggesting = true;
            let clock = Arc::clone(&clock);
            Effect::future(async move {
                clock.sleep(Duration::from_secs(2)).await;
                FormAction::SuggestionLoaded("Retro".to_string())
            })
            .cancellable(CancelId::new(Suggestion))
        }
        FormAction::SuggestionLoaded(title) => {
            form.suggesting = false;
            form.title = title;
            Effect::none()
        }
    })
}

/// At most one modal at a time: every destination is a case of one enum.
#[derive(Clone, Debug, PartialEq, Serialize)]
enum Destination {
    Add(Form),
    ConfirmDeletion(Uuid),
}

#[derive(Clone, Debug, PartialEq)]
enum DestinationAction {
    Add(FormAction),
    ConfirmDeletion(AlertAction),
}

#[derive(Clone, Debug, PartialEq)]
enum AlertAction {
    Confirm,
}

fn destination(
    clock: Arc<dyn Clock>,
) -> impl Reducer<State = Destination, Action = DestinationAction> {
    Scope::case(
        |destination: &mut Destination| match destination {
            Destination::Add(form) => Some(form),
            Destination::ConfirmDeletion(_) => None,
        },
        case!(DestinationAction::Add),
        form(clock),
    )
}

// App

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct App {
    standups: IdentifiedVec<Standup>,
    path: StackState<Detail>,
    destination: PresentationState<Destination>,
}

#[derive(Clone, Debug, PartialEq)]
enum AppAction {
    Standups(IdentifiedAction<Uuid, RowAction>),
    Path(StackAction<Detail, DetailAction>),
    Destination(PresentationAction<DestinationAction>),
    AddTapped,
    ConfirmAddTapped,
    DeleteTapped(Uuid),
}

fn app(deps: Dependencies) -> impl Reducer<State = App, Action = AppAction> {
    let uuid = deps.uuid.clone();
    Reduce::new(move |state: &mut App, action: AppAction| {
        match action {
            AppAction::Path(StackAction::Element {
                action: DetailAction::Delegate(DetailDelegate::Saved(saved)),
                ..
            }) => {
                state.standups.insert(saved);
            }
            AppAction::AddTapped => state.destination.present(Destination::Add(Form::default())),
            AppAction::ConfirmAddTapped => {
                let title = match state.destination.get() {
                    Some(Destination::Add(form)) => form.title.clone(),
                    _ => return Effect::none(),
                };
                state.standups.insert(Standup {
                    id: uuid.generate(),
                    title,
                    minutes_elapsed: 0,
                });
                state.destination.dismiss();
            }
            AppAction::DeleteTapped(id) => {
                state.destination.present(Destination::ConfirmDeletion(id));
            }
            AppAction::Destination(PresentationAction::Presented(
                DestinationAction::ConfirmDeletion(AlertAction::Confirm),
            )) => {
                if let Some(Destination::ConfirmDeletion(id)) = state.destination.get().cloned() {
                    state.standups.remove(&id);
                    state.destination.dismiss();
                }
            }
            _ => {}
        }
        Effect::none()
    })
    .for_each(
        |app: &mut App| &mut app.standups,
        case!(AppAction::Standups),
        row(Arc::clone(&deps.clock)),
    )
    .for_each_stack(|app: &mut App| &mut app.path, case!(AppAction::Path), detail())
    .if_let(
        |app: &mut App| &mut app.destination,
        case!(AppAction::Destination),
        destination(Arc::clone(&deps.clock)),
    )
}

fn with_standups(standups: &[Standup]) -> App {
    App {
        standups: standups.iter().cloned().collect(),
        ..App::default()
    }
}

fn row_action(id: Uuid, action: RowAction) -> AppAction {
    AppAction::Standups(IdentifiedAction::Element { id, action })
}

fn detail_action(id: StackElementId, action: DetailAction) -> AppAction {
    AppAction::Path(StackAction::Element { id, action })
}

#[tokio::test]
async fn saving_a_pushed_detail_updates_the_list() {
    let clock = TestClock::new();
    let daily = standup(100, "Daily");
    let mut store = TestStore::new(
        with_standups(&[daily.clone()]),
        app(Dependencies::test(clock)),
    );

    let first = store.state().path.next_id();
    let pushed = Detail {
        standup: daily.clone(),
    };
    store
        .send(
            AppAction::Path(StackAction::Push {
                id: first,
                state: pushed.clone(),
            }),
            |s| {
                s.path.push_with_id(first, pushed.clone()).unwrap();
            },
        )
        .await
        .unwrap();

    store
        .send(
            detail_action(first, DetailAction::TitleChanged("Morning sync".into())),
            |s| {
                if let Some(detail) = s.path.get_mut(first) {
                    detail.standup.title = "Morning sync".into();
                }
            },
        )
        .await
        .unwrap();

    store
        .send(detail_action(first, DetailAction::SaveTapped), |_| {})
        .await
        .unwrap();

    let edited = Standup {
        title: "Morning sync".into(),
        ..daily.clone()
    };
    store
        .receive(
            detail_action(first, DetailAction::Delegate(DetailDelegate::Saved(edited.clone()))),
            |s| {
                s.standups.insert(edited.clone());
            },
        )
        .await
        .unwrap();
    store
        .receive(AppAction::Path(StackAction::PopFrom { id: first }), |s| {
            s.path.pop_from(first);
        })
        .await
        .unwrap();

    assert_eq!(
        store.state().standups.get(&daily.id).map(|s| s.title.as_str()),
        Some("Morning sync")
    );
    store.finish().await.unwrap();
}

#[test]
fn detail_ignores_its_own_delegate_actions() {
    let state = Detail {
        standup: standup(1, "Daily"),
    };
    let delegate = DetailAction::Delegate(DetailDelegate::Saved(standup(1, "Other")));

    assert_delegates_ignored(&detail_core(), &state, [delegate.clone()]).unwrap();

    let mut after = state.clone();
    let effect = detail().reduce(&mut after, delegate);
    assert!(effect.is_none());
    assert_eq!(after, state);
}

#[tokio::test]
async fn actions_for_a_popped_detail_are_dropped() {
    let clock = TestClock::new();
    let daily = standup(100, "Daily");
    let mut store = TestStore::new(
        with_standups(&[daily.clone()]),
        app(Dependencies::test(clock)),
    );

    let first = store.state().path.next_id();
    let pushed = Detail { standup: daily };
    store
        .send(
            AppAction::Path(StackAction::Push {
                id: first,
                state: pushed.clone(),
            }),
            |s| {
                s.path.push_with_id(first, pushed.clone()).unwrap();
            },
        )
        .await
        .unwrap();
    store
        .send(AppAction::Path(StackAction::PopFrom { id: first }), |s| {
            s.path.pop_from(first);
        })
        .await
        .unwrap();

    store
        .send(detail_action(first, DetailAction::TitleChanged("late".into())), |_| {})
        .await
        .unwrap();
    store.finish().await.unwrap();
}

#[tokio::test]
async fn deleting_a_row_stops_its_running_meeting() {
    let clock = TestClock::new();
    let (a, b, c) = (standup(1, "Design"), standup(2, "Eng"), standup(3, "Ops"));
    let mut store = TestStore::new(
        with_standups(&[a.clone(), b.clone(), c.clone()]),
        app(Dependencies::test(clock.clone())),
    );

    store
        .send(row_action(b.id, RowAction::StartMeeting), |_| {})
        .await
        .unwrap();
    clock.advance(Duration::from_secs(60)).await;
    store
        .receive(row_action(b.id, RowAction::MinuteElapsed), |s| {
            s.standups.update(&b.id, |row| row.minutes_elapsed = 1);
        })
        .await
        .unwrap();
    assert!(!store.store().in_flight().is_empty());

    store
        .send(AppAction::DeleteTapped(b.id), |s| {
            s.destination.present(Destination::ConfirmDeletion(b.id));
        })
        .await
        .unwrap();
    store
        .send(
            AppAction::Destination(PresentationAction::Presented(
                DestinationAction::ConfirmDeletion(AlertAction::Confirm),
            )),
            |s| {
                s.standups.remove(&b.id);
                s.destination = PresentationState::absent();
            },
        )
        .await
        .unwrap();

    assert!(store.store().in_flight().is_empty());
    clock.advance(Duration::from_secs(600)).await;
    assert_eq!(
        store.state().standups.ids().copied().collect::<Vec<_>>(),
        vec![a.id, c.id]
    );
    store.finish().await.unwrap();
}

#[tokio::test]
async fn dismissing_the_add_sheet_cancels_its_request() {
    let clock = TestClock::new();
    let mut store = TestStore::new(App::default(), app(Dependencies::test(clock.clone())));

    store
        .send(AppAction::AddTapped, |s| {
            s.destination.present(Destination::Add(Form::default()));
        })
        .await
        .unwrap();
    store
        .send(
            AppAction::Destination(PresentationAction::Presented(DestinationAction::Add(
                FormAction::SuggestTitle,
            ))),
            |s| {
                if let Some(Destination::Add(form)) = s.destination.get_mut() {
                    form.suggesting = true;
                }
            },
        )
        .await
        .unwrap();
    assert_eq!(store.store().in_flight().len(), 2);

    store
        .send(AppAction::Destination(PresentationAction::Dismiss), |s| {
            s.destination = PresentationState::absent();
        })
        .await
        .unwrap();
    assert!(store.store().in_flight().is_empty());

    // Dismissing again changes nothing.
    store
        .send(AppAction::Destination(PresentationAction::Dismiss), |_| {})
        .await
        .unwrap();

    clock.advance(Duration::from_secs(5)).await;
    store.finish().await.unwrap();
}

#[tokio::test]
async fn confirming_the_add_sheet_inserts_a_generated_standup() {
    let clock = TestClock::new();
    let mut store = TestStore::new(App::default(), app(Dependencies::test(clock)));

    store
        .send(AppAction::AddTapped, |s| {
            s.destination.present(Destination::Add(Form::default()));
        })
        .await
        .unwrap();
    store
        .send(
            AppAction::Destination(PresentationAction::Presented(DestinationAction::Add(
                FormAction::TitleChanged("Retro".into()),
            ))),
            |s| {
                if let Some(Destination::Add(form)) = s.destination.get_mut() {
                    form.title = "Retro".into();
                }
            },
        )
        .await
        .unwrap();
    store
        .send(AppAction::ConfirmAddTapped, |s| {
            s.standups.insert(Standup {
                id: Uuid::from_u128(0),
                title: "Retro".into(),
                minutes_elapsed: 0,
            });
            s.destination = PresentationState::absent();
        })
        .await
        .unwrap();
    store.finish().await.unwrap();
}

#[tokio::test]
async fn actions_for_an_inactive_destination_case_are_dropped() {
    let clock = TestClock::new();
    let target = standup(9, "Sync");
    let mut store = TestStore::new(
        with_standups(&[target.clone()]),
        app(Dependencies::test(clock)),
    );

    store
        .send(AppAction::DeleteTapped(target.id), |s| {
            s.destination.present(Destination::ConfirmDeletion(target.id));
        })
        .await
        .unwrap();
    store
        .send(
            AppAction::Destination(PresentationAction::Presented(DestinationAction::Add(
                FormAction::TitleChanged("ignored".into()),
            ))),
            |_| {},
        )
        .await
        .unwrap();
    store.finish().await.unwrap();
}
