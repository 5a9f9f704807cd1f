//! Supervised group of background tasks with a single cancellation point.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, trace};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type TaskMap = HashMap<u64, (&'static str, JoinHandle<()>)>;

/// Result of draining a [`TaskGroup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks stopped by cancellation.
    pub cancelled: usize,
    /// Tasks that had already finished by the time they were awaited.
    pub completed: usize,
    /// Tasks that panicked.
    pub panicked: usize,
}

#[derive(Clone, Default)]
pub struct TaskGroup {
    tasks: Arc<Mutex<TaskMap>>,
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, TaskMap> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn `future` as a member of the group.
    ///
    /// The task removes itself when it finishes. An `Err` result is logged.
    /// Returns `false` (and drops the future) once the group has been cancelled.
    pub fn spawn<F, E>(&self, name: &'static str, future: F) -> bool
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            debug!("Task group closed; not starting '{name}'");
            return false;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tasks = Arc::clone(&self.tasks);
        let (start_tx, start_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            // Wait until the handle is recorded so removal below cannot race insertion.
            if start_rx.await.is_err() {
                return;
            }

            if let Err(e) = future.await {
                error!("Background task '{name}' failed: {e}");
            } else {
                trace!("Background task '{name}' finished");
            }

            tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
        });

        self.tasks().insert(id, (name, handle));
        let _ = start_tx.send(());
        true
    }

    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks().is_empty()
    }

    /// Cancel every member and wait for each to stop.
    ///
    /// Cancellations are expected and logged at debug level; panics are logged
    /// as errors. Nothing is re-raised.
    pub async fn cancel_all(&self) -> DrainReport {
        self.closed.store(true, Ordering::Release);
        let drained: Vec<(&'static str, JoinHandle<()>)> =
            self.tasks().drain().map(|(_, task)| task).collect();

        let mut report = DrainReport::default();
        for (_, handle) in &drained {
            handle.abort();
        }

        for (name, handle) in drained {
            match handle.await {
                Ok(()) => report.completed += 1,
                Err(e) if e.is_cancelled() => {
                    debug!("Background task '{name}' cancelled");
                    report.cancelled += 1;
                }
                Err(e) => {
                    error!("Background task '{name}' ended abnormally: {e}");
                    report.panicked += 1;
                }
            }
        }

        debug!(
            "Task group drained: {} cancelled, {} completed, {} panicked",
            report.cancelled, report.completed, report.panicked
        );
        report
    }
}
