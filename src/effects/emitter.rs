//! The one-way channel an effect uses to deliver actions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Sink<A> = Arc<dyn Fn(A) -> bool + Send + Sync>;
type Dismiss = Arc<dyn Fn() -> bool + Send + Sync>;

/// Handle given to a running effect for emitting actions.
///
/// Every emission checks the effect's cancellation flag first, so once an
/// effect has been cancelled it can no longer deliver anything. Emission
/// never blocks.
pub struct Emitter<A> {
    sink: Sink<A>,
    dismiss: Option<Dismiss>,
    cancelled: Arc<AtomicBool>,
}

impl<A> Clone for Emitter<A> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            dismiss: self.dismiss.clone(),
            cancelled: Arc::clone(&self.cancelled),
        }
    }
}

impl<A: 'static> Emitter<A> {
    pub(crate) fn new<F>(cancelled: Arc<AtomicBool>, sink: F) -> Self
    where
        F: Fn(A) -> bool + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
            dismiss: None,
            cancelled,
        }
    }

    /// Deliver `action` to the owning store.
    ///
    /// Returns `false` when the effect was cancelled or the store is gone;
    /// long-running effects should stop when that happens.
    pub fn emit(&self, action: A) -> bool {
        if self.is_cancelled() {
            return false;
        }
        (self.sink)(action)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Ask the enclosing presentation or stack element to dismiss itself.
    ///
    /// Returns `false` if the effect does not run inside a presented feature
    /// or was cancelled.
    pub fn dismiss(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        match &self.dismiss {
            Some(dismiss) => dismiss(),
            None => {
                tracing::warn!("dismiss requested by an effect that is not presented");
                false
            }
        }
    }

    /// Emitter for a child feature whose actions are embedded into `A`.
    ///
    /// `dismiss` replaces the dismissal target when the child is a presented
    /// feature or stack element; otherwise the current target is inherited.
    pub(crate) fn lift<C: 'static>(
        &self,
        embed: Arc<dyn Fn(C) -> A + Send + Sync>,
        dismiss: Option<Arc<dyn Fn() -> A + Send + Sync>>,
    ) -> Emitter<C> {
        let sink = Arc::clone(&self.sink);
        let dismiss = match dismiss {
            Some(make) => {
                let sink = Arc::clone(&self.sink);
                Some(Arc::new(move || sink(make())) as Dismiss)
            }
            None => self.dismiss.clone(),
        };
        Emitter {
            sink: Arc::new(move |action| sink(embed(action))),
            dismiss,
            cancelled: Arc::clone(&self.cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (Emitter<u32>, Arc<Mutex<Vec<u32>>>, Arc<AtomicBool>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let flag = Arc::new(AtomicBool::new(false));
        let sink_log = Arc::clone(&log);
        let emitter = Emitter::new(Arc::clone(&flag), move |value| {
            sink_log.lock().unwrap().push(value);
            true
        });
        (emitter, log, flag)
    }

    #[test]
    fn emits_until_cancelled() {
        let (emitter, log, flag) = recording();
        assert!(emitter.emit(1));
        flag.store(true, Ordering::Release);
        assert!(!emitter.emit(2));
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn lifted_emitter_embeds_actions() {
        let (emitter, log, _) = recording();
        let child: Emitter<u8> = emitter.lift(Arc::new(|value: u8| u32::from(value) * 10), None);
        child.emit(4);
        assert_eq!(*log.lock().unwrap(), vec![40]);
    }

    #[test]
    fn dismiss_routes_to_innermost_target() {
        let (emitter, log, _) = recording();
        let presented: Emitter<u8> =
            emitter.lift(Arc::new(|value: u8| u32::from(value)), Some(Arc::new(|| 99)));
        let nested: Emitter<u8> = presented.lift(Arc::new(|value: u8| value), None);

        assert!(nested.dismiss());
        assert_eq!(*log.lock().unwrap(), vec![99]);
    }

    #[test]
    fn dismiss_without_target_is_refused() {
        let (emitter, log, _) = recording();
        assert!(!emitter.dismiss());
        assert!(log.lock().unwrap().is_empty());
    }
}
