//! Function-valued generators for identifiers and timestamps.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Produces fresh identifiers.
///
/// # Example
///
/// ```rust
/// use tether::dependencies::UuidGenerator;
/// use uuid::Uuid;
///
/// let uuid = UuidGenerator::incrementing();
/// assert_eq!(uuid.generate(), Uuid::from_u128(0));
/// assert_eq!(uuid.generate(), Uuid::from_u128(1));
/// ```
#[derive(Clone)]
pub struct UuidGenerator(Arc<dyn Fn() -> Uuid + Send + Sync>);

impl UuidGenerator {
    pub fn new<F>(generate: F) -> Self
    where
        F: Fn() -> Uuid + Send + Sync + 'static,
    {
        Self(Arc::new(generate))
    }

    /// Random v4 identifiers.
    pub fn live() -> Self {
        Self::new(Uuid::new_v4)
    }

    /// `00000000-0000-0000-0000-000000000000`, then `...0001`, and so on.
    /// Clones share the counter.
    pub fn incrementing() -> Self {
        let next = AtomicU64::new(0);
        Self::new(move || Uuid::from_u128(u128::from(next.fetch_add(1, Ordering::Relaxed))))
    }

    pub fn constant(uuid: Uuid) -> Self {
        Self::new(move || uuid)
    }

    pub fn generate(&self) -> Uuid {
        (self.0)()
    }
}

impl fmt::Debug for UuidGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UuidGenerator")
    }
}

/// Produces the current date.
#[derive(Clone)]
pub struct DateGenerator(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl DateGenerator {
    pub fn new<F>(now: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self(Arc::new(now))
    }

    pub fn live() -> Self {
        Self::new(Utc::now)
    }

    pub fn constant(date: DateTime<Utc>) -> Self {
        Self::new(move || date)
    }

    /// Constant at the Unix epoch.
    pub fn epoch() -> Self {
        Self::constant(Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl fmt::Debug for DateGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DateGenerator")
    }
}
