//! Core types of the runtime.
//!
//! This module contains the pure functional core:
//! - The `Reducer` trait: a feature's `(state, action) -> effect` transition
//! - Case paths for embedding and extracting action cases
//! - Identified collections addressed by stable ids instead of positions
//!
//! Nothing in this module performs I/O or schedules work, following the
//! "pure core, imperative shell" philosophy. Work is described by the
//! effects reducers return and carried out by the store.

mod case_path;
mod identified;
mod reducer;

pub use case_path::CasePath;
pub use identified::{Identifiable, IdentifiedVec};
pub use reducer::{Combine, EmptyReducer, Reduce, Reducer};
