//! Supervision of running effects.
//!
//! The runtime spawns each `Run` effect as a tokio task, keeps a registry of
//! which tasks live under which [`CancelId`], and funnels every emitted
//! action through a single channel back to the owning store. Actions are
//! tagged with their task's cancellation flag so anything a cancelled effect
//! managed to emit before it stopped is discarded on receipt.

use crate::effects::cancellation::{CancelId, ScopeSegment};
use crate::effects::effect::{Effect, Operation, Task};
use crate::effects::emitter::Emitter;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

/// Number of scheduler yields used to let freshly woken tasks make progress.
const SETTLE_YIELDS: usize = 16;

/// Yield to the scheduler enough times for ready tasks to run.
pub(crate) async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect #{}", self.0)
    }
}

pub(crate) enum Message<A> {
    Action {
        action: A,
        cancelled: Arc<AtomicBool>,
    },
    Finished(TaskId),
}

struct RunningTask {
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
    ids: Vec<CancelId>,
}

/// Runs effects and delivers their actions in order.
pub struct EffectRuntime<A> {
    sender: mpsc::UnboundedSender<Message<A>>,
    receiver: mpsc::UnboundedReceiver<Message<A>>,
    tasks: BTreeMap<TaskId, RunningTask>,
    registry: HashMap<CancelId, HashSet<TaskId>>,
    next_task: u64,
}

impl<A: Send + 'static> Default for EffectRuntime<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Send + 'static> EffectRuntime<A> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            tasks: BTreeMap::new(),
            registry: HashMap::new(),
            next_task: 0,
        }
    }

    /// Schedule `effect`. Must be called from within a tokio runtime.
    pub fn execute(&mut self, effect: Effect<A>) {
        self.execute_in(effect, &[]);
    }

    fn execute_in(&mut self, effect: Effect<A>, ids: &[CancelId]) {
        match effect.operation {
            Operation::None => {}
            Operation::Run(task) => self.spawn(task, ids),
            Operation::Merge(effects) => {
                for effect in effects {
                    self.execute_in(effect, ids);
                }
            }
            Operation::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => {
                if cancel_in_flight {
                    self.cancel(&id);
                }
                let mut scoped = ids.to_vec();
                scoped.push(id);
                self.execute_in(*effect, &scoped);
            }
            Operation::Cancel(id) => self.cancel(&id),
            Operation::CancelScope(scope) => self.cancel_scope(&scope),
        }
    }

    fn spawn(&mut self, task: Task<A>, ids: &[CancelId]) {
        let task_id = TaskId(self.next_task);
        self.next_task += 1;

        let cancelled = Arc::new(AtomicBool::new(false));
        let sender = self.sender.clone();
        let flag = Arc::clone(&cancelled);
        let emitter = Emitter::new(Arc::clone(&cancelled), move |action| {
            sender
                .send(Message::Action {
                    action,
                    cancelled: Arc::clone(&flag),
                })
                .is_ok()
        });

        let work = task(emitter);
        let done = self.sender.clone();
        let handle = tokio::spawn(async move {
            work.await;
            // The store may already be gone; nothing to report to then.
            let _ = done.send(Message::Finished(task_id));
        });

        debug!(task = %task_id, ids = ?ids, "spawned effect");
        for id in ids {
            self.registry.entry(id.clone()).or_default().insert(task_id);
        }
        self.tasks.insert(
            task_id,
            RunningTask {
                abort: handle.abort_handle(),
                cancelled,
                ids: ids.to_vec(),
            },
        );
    }

    /// Cancel every task registered under `id`.
    pub fn cancel(&mut self, id: &CancelId) {
        let Some(tasks) = self.registry.remove(id) else {
            return;
        };
        debug!(id = %id, count = tasks.len(), "cancelling effects");
        for task_id in tasks {
            self.cancel_task(task_id);
        }
    }

    /// Cancel every task registered under any id inside `scope`.
    pub(crate) fn cancel_scope(&mut self, scope: &[ScopeSegment]) {
        let ids: Vec<CancelId> = self
            .registry
            .keys()
            .filter(|id| id.is_within(scope))
            .cloned()
            .collect();
        for id in ids {
            self.cancel(&id);
        }
    }

    /// Cancel everything that is still running.
    pub fn cancel_all(&mut self) -> usize {
        let task_ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        let count = task_ids.len();
        for task_id in task_ids {
            self.cancel_task(task_id);
        }
        count
    }

    fn cancel_task(&mut self, task_id: TaskId) {
        let Some(task) = self.tasks.remove(&task_id) else {
            return;
        };
        task.cancelled.store(true, Ordering::Release);
        task.abort.abort();
        for id in &task.ids {
            if let Some(members) = self.registry.get_mut(id) {
                members.remove(&task_id);
                if members.is_empty() {
                    self.registry.remove(id);
                }
            }
        }
    }

    fn finish_task(&mut self, task_id: TaskId) {
        let Some(task) = self.tasks.remove(&task_id) else {
            return;
        };
        trace!(task = %task_id, "effect finished");
        for id in &task.ids {
            if let Some(members) = self.registry.get_mut(id) {
                members.remove(&task_id);
                if members.is_empty() {
                    self.registry.remove(id);
                }
            }
        }
    }

    fn accept(&mut self, message: Message<A>) -> Option<A> {
        match message {
            Message::Action { action, cancelled } => {
                if cancelled.load(Ordering::Acquire) {
                    trace!("discarding action emitted by a cancelled effect");
                    None
                } else {
                    Some(action)
                }
            }
            Message::Finished(task_id) => {
                self.finish_task(task_id);
                None
            }
        }
    }

    /// Next action that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<A> {
        while let Ok(message) = self.receiver.try_recv() {
            if let Some(action) = self.accept(message) {
                return Some(action);
            }
        }
        None
    }

    /// Next action, waiting while effects are in flight.
    ///
    /// Returns `None` once nothing is running and nothing is queued.
    pub async fn next_while_busy(&mut self) -> Option<A> {
        loop {
            if let Some(action) = self.try_next() {
                return Some(action);
            }
            if self.tasks.is_empty() {
                return None;
            }
            let message = self.receiver.recv().await?;
            if let Some(action) = self.accept(message) {
                return Some(action);
            }
        }
    }

    /// Next action, waiting indefinitely (for effects or external senders).
    pub async fn recv(&mut self) -> Option<A> {
        loop {
            let message = self.receiver.recv().await?;
            if let Some(action) = self.accept(message) {
                return Some(action);
            }
        }
    }

    /// Emitter for actions originating outside any effect.
    pub(crate) fn external_emitter(&self) -> Emitter<A> {
        let sender = self.sender.clone();
        let never = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&never);
        Emitter::new(never, move |action| {
            sender
                .send(Message::Action {
                    action,
                    cancelled: Arc::clone(&flag),
                })
                .is_ok()
        })
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Cancellation ids with at least one running effect.
    pub fn in_flight(&self) -> Vec<CancelId> {
        let mut ids: Vec<CancelId> = self.registry.keys().cloned().collect();
        ids.sort_by_key(|id| id.to_string());
        ids
    }

    /// Human-readable description of every running task.
    pub(crate) fn describe_in_flight(&self) -> Vec<String> {
        self.tasks
            .iter()
            .map(|(task_id, task)| {
                if task.ids.is_empty() {
                    format!("{task_id} (not cancellable)")
                } else {
                    let ids: Vec<String> = task.ids.iter().map(ToString::to_string).collect();
                    format!("{task_id} [{}]", ids.join(", "))
                }
            })
            .collect()
    }
}

impl<A> Drop for EffectRuntime<A> {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.cancelled.store(true, Ordering::Release);
            task.abort.abort();
        }
    }
}
