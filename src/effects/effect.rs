//! Effect descriptions returned by reducers.

use crate::effects::cancellation::{CancelId, ScopeSegment};
use crate::effects::emitter::Emitter;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Deferred asynchronous work. Invoked once, with the emitter it should use.
pub type Task<A> = Box<dyn FnOnce(Emitter<A>) -> BoxFuture<'static, ()> + Send>;

/// Description of asynchronous work produced by a reducer.
///
/// Reducers never perform work inline: they return an `Effect` and the
/// store's runtime schedules it. An effect may emit any number of actions
/// (including none, or an unbounded stream) through its [`Emitter`].
///
/// # Example
///
/// ```rust
/// use tether::effects::{CancelId, Effect};
///
/// #[derive(Debug)]
/// enum Action {
///     Tick,
/// }
///
/// #[derive(Debug, Hash)]
/// struct TimerId;
///
/// let effect: Effect<Action> = Effect::run(|emitter| async move {
///     emitter.emit(Action::Tick);
/// })
/// .cancellable(CancelId::new(TimerId));
///
/// assert!(!effect.is_none());
/// ```
#[must_use = "effects do nothing unless returned to the store"]
pub struct Effect<A> {
    pub(crate) operation: Operation<A>,
}

pub(crate) enum Operation<A> {
    None,
    Run(Task<A>),
    Merge(Vec<Effect<A>>),
    Cancellable {
        id: CancelId,
        cancel_in_flight: bool,
        effect: Box<Effect<A>>,
    },
    Cancel(CancelId),
    CancelScope(Vec<ScopeSegment>),
}

impl<A: Send + 'static> Effect<A> {
    /// An effect that does nothing.
    pub fn none() -> Self {
        Self {
            operation: Operation::None,
        }
    }

    /// Run `work` on the runtime, emitting actions through the emitter.
    pub fn run<F, Fut>(work: F) -> Self
    where
        F: FnOnce(Emitter<A>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            operation: Operation::Run(Box::new(move |emitter| work(emitter).boxed())),
        }
    }

    /// Emit the action the future resolves to.
    pub fn future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = A> + Send + 'static,
    {
        Self::run(move |emitter| async move {
            let action = future.await;
            emitter.emit(action);
        })
    }

    /// Emit `action` asynchronously, after the current action is processed.
    pub fn send(action: A) -> Self {
        Self::run(move |emitter| async move {
            emitter.emit(action);
        })
    }

    /// Cancel every in-flight effect registered under `id`.
    pub fn cancel(id: CancelId) -> Self {
        Self {
            operation: Operation::Cancel(id),
        }
    }

    /// Cancel every in-flight effect whose id lives under `scope`.
    pub(crate) fn cancel_scope(scope: Vec<ScopeSegment>) -> Self {
        Self {
            operation: Operation::CancelScope(scope),
        }
    }

    /// Run several effects concurrently. `None` members are dropped.
    pub fn merge<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut effects: Vec<Effect<A>> = effects.into_iter().filter(|e| !e.is_none()).collect();
        match effects.len() {
            0 => Self::none(),
            1 => effects.remove(0),
            _ => Self {
                operation: Operation::Merge(effects),
            },
        }
    }

    /// Register this effect under `id`, first cancelling whatever is already
    /// running under it. Restarting supersedes.
    pub fn cancellable(self, id: CancelId) -> Self {
        self.cancellable_with(id, true)
    }

    /// Register this effect under `id`. With `cancel_in_flight == false`
    /// effects under the same id run side by side and are cancelled together.
    pub fn cancellable_with(self, id: CancelId, cancel_in_flight: bool) -> Self {
        if self.is_none() {
            return self;
        }
        Self {
            operation: Operation::Cancellable {
                id,
                cancel_in_flight,
                effect: Box::new(self),
            },
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self.operation, Operation::None)
    }

    /// Transform every action this effect emits.
    pub fn map<B, F>(self, f: F) -> Effect<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.lift(Arc::new(f), None)
    }

    /// Re-home a child effect into its parent's action type.
    pub(crate) fn lift<B: Send + 'static>(
        self,
        embed: Arc<dyn Fn(A) -> B + Send + Sync>,
        dismiss: Option<Arc<dyn Fn() -> B + Send + Sync>>,
    ) -> Effect<B> {
        let operation = match self.operation {
            Operation::None => Operation::None,
            Operation::Run(task) => Operation::Run(Box::new(move |emitter: Emitter<B>| {
                task(emitter.lift(embed, dismiss))
            })),
            Operation::Merge(effects) => Operation::Merge(
                effects
                    .into_iter()
                    .map(|effect| effect.lift(Arc::clone(&embed), dismiss.clone()))
                    .collect(),
            ),
            Operation::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => Operation::Cancellable {
                id,
                cancel_in_flight,
                effect: Box::new(effect.lift(embed, dismiss)),
            },
            Operation::Cancel(id) => Operation::Cancel(id),
            Operation::CancelScope(scope) => Operation::CancelScope(scope),
        };
        Effect { operation }
    }

    /// Move every cancellation id under `segment` and register the whole
    /// effect under the segment's root, so the segment can be torn down as
    /// a unit.
    pub(crate) fn scoped(self, segment: &ScopeSegment) -> Self {
        if self.is_none() {
            return self;
        }
        self.prefix_ids(segment)
            .cancellable_with(CancelId::scope_root(vec![segment.clone()]), false)
    }

    fn prefix_ids(self, segment: &ScopeSegment) -> Self {
        let operation = match self.operation {
            Operation::Merge(effects) => Operation::Merge(
                effects
                    .into_iter()
                    .map(|effect| effect.prefix_ids(segment))
                    .collect(),
            ),
            Operation::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => Operation::Cancellable {
                id: id.prefixed(segment),
                cancel_in_flight,
                effect: Box::new(effect.prefix_ids(segment)),
            },
            Operation::Cancel(id) => Operation::Cancel(id.prefixed(segment)),
            Operation::CancelScope(mut scope) => {
                scope.insert(0, segment.clone());
                Operation::CancelScope(scope)
            }
            other => other,
        };
        Effect { operation }
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Operation::None => f.write_str("Effect::None"),
            Operation::Run(_) => f.write_str("Effect::Run"),
            Operation::Merge(effects) => f.debug_tuple("Effect::Merge").field(effects).finish(),
            Operation::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => f
                .debug_struct("Effect::Cancellable")
                .field("id", id)
                .field("cancel_in_flight", cancel_in_flight)
                .field("effect", effect)
                .finish(),
            Operation::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            Operation::CancelScope(scope) => {
                f.debug_tuple("Effect::CancelScope").field(scope).finish()
            }
        }
    }
}
