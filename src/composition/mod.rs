//! Building larger features out of smaller ones.
//!
//! - [`Lens`] implementations project a child region out of parent state
//! - [`Scope`] runs a child reducer inside a parent domain
//! - [`DelegateGuard`] keeps a feature from consuming its own delegate actions

mod delegate;
mod lens;
mod scope;

pub use delegate::{check_delegate_inert, DelegateGuard, DelegateViolation, Delegating};
pub use lens::{Case, Compose, Field, Lens};
pub use scope::Scope;
