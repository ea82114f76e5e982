//! Sending actions into a store from outside it.

use crate::effects::Emitter;

/// Cloneable sender that enqueues actions for a [`Store`](crate::store::Store).
///
/// Actions sent through a handle take the same serialized path as actions
/// emitted by effects: they are processed, in order, the next time the
/// store is driven or sent an action. A handle never touches state itself.
pub struct StoreHandle<A> {
    emitter: Emitter<A>,
}

impl<A> Clone for StoreHandle<A> {
    fn clone(&self) -> Self {
        Self {
            emitter: self.emitter.clone(),
        }
    }
}

impl<A: 'static> StoreHandle<A> {
    pub(crate) fn new(emitter: Emitter<A>) -> Self {
        Self { emitter }
    }

    /// Enqueue `action`. Returns `false` if the store has been dropped.
    pub fn send(&self, action: A) -> bool {
        self.emitter.emit(action)
    }
}
