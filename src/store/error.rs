//! Store construction errors.

use thiserror::Error;

/// Errors that can occur when building a store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Reducer not specified. Call .reducer(reducer) before .build()")]
    MissingReducer,
}
