//! Tether: a unidirectional state and effect runtime
//!
//! Tether models an application as an explicit state tree, a pure transition
//! function over typed actions, and a supervised set of asynchronous effects.
//! It follows the "pure core, imperative shell" philosophy: reducers only
//! mutate the state they are given and return descriptions of work; the
//! store runs that work and feeds the resulting actions back in, one at a
//! time.
//!
//! # Core Concepts
//!
//! - **Reducer**: a feature's transition function, `(state, action) -> effect`
//! - **Effect**: asynchronous work that may emit further actions, optionally
//!   registered under a cancellation id
//! - **Scope**: embeds a child feature into a parent's state and actions
//! - **Navigation**: presentation slots, stacks and identified collections
//!   whose removal cancels every effect the removed child started
//! - **Store**: owns the state and serializes every mutation
//! - **TestStore**: replays a feature deterministically and reports every
//!   unasserted change, unreceived action and leaked effect
//!
//! # Example
//!
//! ```rust
//! use tether::core::Reduce;
//! use tether::effects::Effect;
//! use tether::testing::TestStore;
//!
//! #[derive(Clone, Debug, PartialEq, serde::Serialize)]
//! struct Counter {
//!     count: i64,
//!     fact: Option<String>,
//! }
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Action {
//!     Increment,
//!     FactButtonTapped,
//!     FactResponse(String),
//! }
//!
//! let counter = Reduce::new(|state: &mut Counter, action: Action| match action {
//!     Action::Increment => {
//!         state.count += 1;
//!         Effect::none()
//!     }
//!     Action::FactButtonTapped => {
//!         let count = state.count;
//!         Effect::future(async move { Action::FactResponse(format!("{count} is a number")) })
//!     }
//!     Action::FactResponse(fact) => {
//!         state.fact = Some(fact);
//!         Effect::none()
//!     }
//! });
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let mut store = TestStore::new(Counter { count: 0, fact: None }, counter);
//! store.send(Action::Increment, |s| s.count = 1).await.unwrap();
//! store.send(Action::FactButtonTapped, |_| {}).await.unwrap();
//! store
//!     .receive(Action::FactResponse("1 is a number".into()), |s| {
//!         s.fact = Some("1 is a number".into());
//!     })
//!     .await
//!     .unwrap();
//! store.finish().await.unwrap();
//! # });
//! ```

pub mod composition;
pub mod core;
pub mod dependencies;
pub mod effects;
pub mod navigation;
pub mod store;
pub mod testing;

// Re-export commonly used types
pub use composition::{Delegating, Scope};
pub use core::{CasePath, Identifiable, IdentifiedVec, Reduce, Reducer};
pub use effects::{CancelId, Effect, Emitter};
pub use navigation::{
    PresentationAction, PresentationState, StackAction, StackElementId, StackState,
};
pub use store::{Store, StoreHandle};
pub use testing::{Exhaustivity, HarnessError, TestStore};
