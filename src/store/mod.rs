//! The state container and the surfaces a host application uses.
//!
//! A [`Store`] owns the root state, applies actions one at a time and
//! supervises the effects they return. Hosts read state through
//! [`Store::observe`] snapshots and send actions through a cloneable
//! [`StoreHandle`]; neither can mutate state directly.

mod builder;
mod container;
mod error;
mod handle;

pub use builder::StoreBuilder;
pub use container::Store;
pub use error::BuildError;
pub use handle::StoreHandle;
