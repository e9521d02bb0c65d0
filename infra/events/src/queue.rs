use crate::error::EventBusError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::trace;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Schedules work to run after the current synchronous batch completes.
pub trait TaskQueue: fmt::Debug + Send + Sync {
    /// Queues `task` for later execution. Never runs it inline.
    fn defer(&self, task: Task);
}

/// Defers tasks onto a Tokio runtime.
///
/// On a current-thread runtime a spawned task cannot start until the caller
/// yields, so everything queued in one synchronous stretch observes the
/// final state of that stretch. Multi-thread runtimes give no such ordering.
#[derive(Debug, Clone)]
pub struct TokioQueue {
    handle: Handle,
}

impl TokioQueue {
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Binds to the runtime the caller is executing on.
    ///
    /// # Errors
    /// Returns [`EventBusError::NoRuntime`] when called outside a Tokio runtime.
    pub fn current() -> Result<Self, EventBusError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl TaskQueue for TokioQueue {
    fn defer(&self, task: Task) {
        drop(self.handle.spawn(async move { task() }));
    }
}

/// A queue drained explicitly by the owner.
///
/// Useful for hosts that drive their own loop and for deterministic tests.
#[derive(Clone, Default)]
pub struct ManualQueue {
    pending: Arc<Mutex<VecDeque<Task>>>,
}

impl ManualQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Runs the tasks queued before this call, in FIFO order.
    ///
    /// Tasks deferred while draining wait for the next call.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = self.pending.lock().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        trace!(count, "Drained manual task queue");
        count
    }
}

impl fmt::Debug for ManualQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualQueue").field("pending", &self.len()).finish()
    }
}

impl TaskQueue for ManualQueue {
    fn defer(&self, task: Task) {
        self.pending.lock().push_back(task);
    }
}
