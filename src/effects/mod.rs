//! Effects: asynchronous work described by reducers and run by the store.
//!
//! This module is the "imperative shell" of the runtime. Reducers stay pure
//! and return [`Effect`] descriptions; the [`EffectRuntime`] turns them into
//! supervised tokio tasks.
//!
//! # Key Concepts
//!
//! - **Effect**: a description of work that may emit actions over time
//! - **Emitter**: the one-way channel an effect uses to report back
//! - **CancelId**: a key grouping in-flight effects for restart and cancel
//! - **Scoped cancellation**: effects of a stack element or presented child
//!   live under that element's namespace and die with it
//!
//! # Ordering
//!
//! Actions emitted by one effect arrive in emission order. Actions from
//! different effects interleave in completion order.

mod cancellation;
mod effect;
mod emitter;
mod runtime;

pub use cancellation::{CancelId, ScopeSegment};
pub(crate) use cancellation::collection_token;
pub use effect::{Effect, Task};
pub use emitter::Emitter;
pub use runtime::EffectRuntime;

#[cfg(test)]
pub(crate) use effect::Operation;
pub(crate) use runtime::settle;
