//! Clocks: the time capability effects sleep on.

use crate::effects::settle;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::trace;

/// Source of time for effects.
///
/// Features never call `tokio::time` directly; they sleep on the clock they
/// were given, so tests can substitute a [`TestClock`].
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct ContinuousClock {
    origin: Instant,
}

impl ContinuousClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for ContinuousClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ContinuousClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

struct Sleeper {
    deadline: Duration,
    seq: u64,
    wake: oneshot::Sender<()>,
}

#[derive(Default)]
struct Timeline {
    now: Duration,
    next_seq: u64,
    sleepers: Vec<Sleeper>,
}

impl Timeline {
    /// Remove the earliest sleeper due at or before `target`.
    fn pop_due(&mut self, target: Duration) -> Option<Sleeper> {
        self.sleepers.retain(|sleeper| !sleeper.wake.is_closed());
        let index = self
            .sleepers
            .iter()
            .enumerate()
            .filter(|(_, sleeper)| sleeper.deadline <= target)
            .min_by_key(|(_, sleeper)| (sleeper.deadline, sleeper.seq))
            .map(|(index, _)| index)?;
        Some(self.sleepers.swap_remove(index))
    }
}

/// Virtual clock that only moves when told to.
///
/// Sleeping on a `TestClock` parks the effect until [`advance`] moves time
/// past its deadline. Sleepers are woken in deadline order, and the
/// scheduler is given a chance to run each woken effect before the next one
/// fires, so an interval timer ticks once per elapsed interval.
///
/// Clones share the same timeline.
///
/// [`advance`]: TestClock::advance
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tether::dependencies::{Clock, TestClock};
///
/// # tokio::runtime::Builder::new_current_thread()
/// #     .enable_all()
/// #     .build()
/// #     .unwrap()
/// #     .block_on(async {
/// let clock = TestClock::new();
/// let sleeper = clock.clone();
/// let woke = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(5)).await });
///
/// clock.advance(Duration::from_secs(5)).await;
/// woke.await.unwrap();
/// assert_eq!(clock.now(), Duration::from_secs(5));
/// # });
/// ```
#[derive(Clone, Default)]
pub struct TestClock {
    timeline: Arc<Mutex<Timeline>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn timeline(&self) -> MutexGuard<'_, Timeline> {
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move time forward by `by`, waking every sleeper whose deadline falls
    /// inside the window.
    pub async fn advance(&self, by: Duration) {
        settle().await;
        let target = self.timeline().now + by;
        loop {
            let due = {
                let mut timeline = self.timeline();
                let due = timeline.pop_due(target);
                if let Some(sleeper) = &due {
                    timeline.now = sleeper.deadline;
                }
                due
            };
            let Some(sleeper) = due else {
                break;
            };
            trace!(deadline = ?sleeper.deadline, "test clock waking sleeper");
            // A sleeper whose effect was cancelled has nobody to wake.
            let _ = sleeper.wake.send(());
            settle().await;
        }
        self.timeline().now = target;
    }

    /// Number of effects currently sleeping on this clock.
    pub fn pending_sleepers(&self) -> usize {
        let mut timeline = self.timeline();
        timeline.sleepers.retain(|sleeper| !sleeper.wake.is_closed());
        timeline.sleepers.len()
    }
}

#[async_trait]
impl Clock for TestClock {
    fn now(&self) -> Duration {
        self.timeline().now
    }

    async fn sleep(&self, duration: Duration) {
        let woken = {
            let mut timeline = self.timeline();
            let (wake, woken) = oneshot::channel();
            let sleeper = Sleeper {
                deadline: timeline.now + duration,
                seq: timeline.next_seq,
                wake,
            };
            timeline.next_seq += 1;
            timeline.sleepers.push(sleeper);
            woken
        };
        let _ = woken.await;
    }
}
