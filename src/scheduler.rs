//! Task scheduling for partition parsing.
//!
//! The translator does not own threads. It submits one [`Task`] per partition
//! to a caller-supplied [`Scheduler`] and later waits on the returned
//! [`TaskHandle`]s in submission order.
//!
//! Two schedulers ship with the crate:
//! - [`InlineScheduler`] runs each task on the calling thread at submit time.
//!   Deterministic, handy for tests and for tiny inputs.
//! - [`RayonScheduler`] spawns tasks on a Rayon thread pool (the global pool,
//!   a dedicated pool of `n` threads, or a pool the caller already owns).
//!
//! Custom schedulers build handles with [`TaskHandle::channel`] and run tasks
//! through [`run_task`] so panics surface as errors instead of tearing down a
//! worker.

use crate::error::TranslateError;
use crate::partition::PartitionOutput;
use anyhow::{Context, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A unit of work: parse one partition.
pub type Task = Box<dyn FnOnce() -> Result<PartitionOutput> + Send + 'static>;

/// Something that can run tasks and hand back a handle to their result.
pub trait Scheduler: Send + Sync {
    /// Enqueue `task`. Must not block waiting for it to finish (the inline
    /// scheduler is the exception: it runs the task before returning).
    fn submit(&self, task: Task) -> TaskHandle;
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const IDLE_BACKOFF: Duration = Duration::from_micros(200);

/// Pending result of a submitted [`Task`].
pub struct TaskHandle {
    rx: Receiver<Result<PartitionOutput>>,
}

/// Sending half of a [`TaskHandle`], held by whoever runs the task.
pub struct TaskSender {
    tx: Sender<Result<PartitionOutput>>,
}

impl TaskSender {
    /// Deliver the task's result. A handle that was already dropped (the
    /// parse failed or was cancelled) just discards it.
    pub fn send(self, result: Result<PartitionOutput>) {
        let _ = self.tx.send(result);
    }
}

impl TaskHandle {
    /// Create a connected sender/handle pair.
    pub fn channel() -> (TaskSender, TaskHandle) {
        let (tx, rx) = mpsc::channel();
        (TaskSender { tx }, TaskHandle { rx })
    }

    /// A handle whose result is already known.
    pub fn ready(result: Result<PartitionOutput>) -> Self {
        let (tx, handle) = Self::channel();
        tx.send(result);
        handle
    }

    /// Block until the task finishes or `cancel` fires.
    ///
    /// Called from a Rayon worker thread, the wait runs other queued jobs of
    /// that pool between polls instead of sleeping, so a parse started inside
    /// the pool that executes its partitions still makes progress.
    ///
    /// # Errors
    /// The task's own error, [`TranslateError::Cancelled`] if the token is
    /// cancelled while waiting, or [`TranslateError::TaskLost`] if the task was
    /// dropped without reporting.
    pub fn wait(self, cancel: &CancellationToken) -> Result<PartitionOutput> {
        if rayon::current_thread_index().is_some() {
            return self.wait_on_worker(cancel);
        }
        loop {
            if cancel.is_cancelled() {
                return Err(TranslateError::Cancelled.into());
            }
            match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TranslateError::TaskLost.into());
                }
            }
        }
    }

    fn wait_on_worker(self, cancel: &CancellationToken) -> Result<PartitionOutput> {
        loop {
            if cancel.is_cancelled() {
                return Err(TranslateError::Cancelled.into());
            }
            match self.rx.try_recv() {
                Ok(result) => return result,
                Err(TryRecvError::Disconnected) => return Err(TranslateError::TaskLost.into()),
                Err(TryRecvError::Empty) => {
                    if !matches!(rayon::yield_now(), Some(rayon::Yield::Executed)) {
                        thread::sleep(IDLE_BACKOFF);
                    }
                }
            }
        }
    }
}

/// Run a task, converting a panic into [`TranslateError::TaskPanicked`].
pub fn run_task(task: Task) -> Result<PartitionOutput> {
    catch_unwind(AssertUnwindSafe(task))
        .unwrap_or_else(|payload| Err(TranslateError::TaskPanicked(panic_message(&*payload)).into()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs every task on the submitting thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn submit(&self, task: Task) -> TaskHandle {
        TaskHandle::ready(run_task(task))
    }
}

/// Runs tasks on a Rayon thread pool.
#[derive(Clone)]
pub struct RayonScheduler {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl RayonScheduler {
    /// Use Rayon's global pool.
    pub fn global() -> Self {
        Self { pool: None }
    }

    /// Build a dedicated pool. `threads: None` uses one thread per CPU.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let threads = threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tsvmap-worker-{i}"))
            .build()
            .context("build partition thread pool")?;
        Ok(Self::from_pool(Arc::new(pool)))
    }

    /// Share a pool the caller already owns.
    pub fn from_pool(pool: Arc<rayon::ThreadPool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Number of worker threads available to this scheduler.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl Scheduler for RayonScheduler {
    fn submit(&self, task: Task) -> TaskHandle {
        let (tx, handle) = TaskHandle::channel();
        let job = move || tx.send(run_task(task));
        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
        handle
    }
}

/// Cooperative cancellation flag shared between a caller and a parse.
///
/// Cloning shares the flag. A [`child`](Self::child) token is cancelled when
/// either it or its parent is.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new token that also observes `self`.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_cancel() {
        let parent = CancellationToken::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn child_cancel_does_not_reach_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn panics_become_errors() {
        let handle = InlineScheduler.submit(Box::new(|| -> Result<PartitionOutput> { panic!("boom") }));
        let err = handle.wait(&CancellationToken::new()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TranslateError>(),
            Some(&TranslateError::TaskPanicked("boom".into()))
        );
    }

    #[test]
    fn dropped_sender_is_task_lost() {
        let (tx, handle) = TaskHandle::channel();
        drop(tx);
        let err = handle.wait(&CancellationToken::new()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TranslateError>(),
            Some(&TranslateError::TaskLost)
        );
    }

    #[test]
    fn cancelled_wait_returns_promptly() {
        let (_tx, handle) = TaskHandle::channel();
        let token = CancellationToken::new();
        token.cancel();
        let err = handle.wait(&token).unwrap_err();
        assert!(crate::error::is_cancelled(&err));
    }

    #[test]
    fn rayon_runs_tasks() {
        let sched = RayonScheduler::new(Some(2)).unwrap();
        assert_eq!(sched.threads(), 2);
        let handle = sched.submit(Box::new(|| -> Result<PartitionOutput> {
            Ok(PartitionOutput::default())
        }));
        assert_eq!(
            handle.wait(&CancellationToken::new()).unwrap(),
            PartitionOutput::default()
        );
    }
}
