//! Builder for constructing stores.

use crate::core::Reducer;
use crate::store::container::Store;
use crate::store::error::BuildError;
use std::fmt::Debug;

/// Builder for constructing a [`Store`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use tether::core::Reduce;
/// use tether::effects::Effect;
/// use tether::store::{BuildError, Store};
///
/// let reducer = Reduce::new(|count: &mut u8, _action: ()| {
///     *count += 1;
///     Effect::none()
/// });
///
/// let store = Store::builder()
///     .initial(0u8)
///     .reducer(reducer)
///     .label("counter")
///     .build()
///     .unwrap();
/// assert_eq!(store.label(), "counter");
/// ```
pub struct StoreBuilder<R: Reducer> {
    initial: Option<R::State>,
    reducer: Option<R>,
    label: Option<String>,
}

impl<R> StoreBuilder<R>
where
    R: Reducer,
    R::State: Clone + Send + Sync + 'static,
    R::Action: Debug,
{
    pub fn new() -> Self {
        Self {
            initial: None,
            reducer: None,
            label: None,
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: R::State) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the root reducer (required).
    pub fn reducer(mut self, reducer: R) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// Name used in log records for this store.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the store.
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<Store<R>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let reducer = self.reducer.ok_or(BuildError::MissingReducer)?;
        let label = self.label.unwrap_or_else(|| "store".to_string());
        Ok(Store::with_label(initial, reducer, label))
    }
}

impl<R> Default for StoreBuilder<R>
where
    R: Reducer,
    R::State: Clone + Send + Sync + 'static,
    R::Action: Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
