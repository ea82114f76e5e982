//! Injectable capabilities for effects.
//!
//! A feature receives a [`Dependencies`] bundle when it is constructed and
//! captures what it needs into the effects it returns. Production code uses
//! [`Dependencies::live`]; tests pass [`Dependencies::test`] with a
//! [`TestClock`] they control, so time, identifiers and dates are
//! deterministic without touching feature code.
//!
//! Capabilities specific to one application (a network client, a
//! permission prompt) follow the same shape: a trait with one async
//! operation, a live implementation, and a test double.

mod clock;
mod generators;

pub use clock::{Clock, ContinuousClock, TestClock};
pub use generators::{DateGenerator, UuidGenerator};

use std::fmt;
use std::sync::Arc;

/// Capability bundle passed down to features.
#[derive(Clone)]
pub struct Dependencies {
    pub clock: Arc<dyn Clock>,
    pub uuid: UuidGenerator,
    pub date: DateGenerator,
}

impl Dependencies {
    pub fn live() -> Self {
        Self {
            clock: Arc::new(ContinuousClock::new()),
            uuid: UuidGenerator::live(),
            date: DateGenerator::live(),
        }
    }

    /// Deterministic bundle: `clock`, incrementing uuids, and a date fixed at
    /// the Unix epoch.
    pub fn test(clock: TestClock) -> Self {
        Self {
            clock: Arc::new(clock),
            uuid: UuidGenerator::incrementing(),
            date: DateGenerator::epoch(),
        }
    }

    pub fn with_uuid(mut self, uuid: UuidGenerator) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_date(mut self, date: DateGenerator) -> Self {
        self.date = date;
        self
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("uuid", &self.uuid)
            .field("date", &self.date)
            .finish_non_exhaustive()
    }
}
