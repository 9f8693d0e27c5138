//! Background task scope owned by a client.
//!
//! All fire-and-forget work of a client runs in one scope. Closing the scope cancels every task
//! still running and, if the scope started its own runtime, shuts that runtime down.
use std::{future::Future, sync::Mutex};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::{sync::CancellationToken, task::AbortOnDropHandle};

use crate::{Error, Result};

pub(crate) struct TaskScope {
    handle: Handle,
    /// Holds the runtime if no ambient tokio runtime was available at construction.
    owned_runtime: Mutex<Option<Runtime>>,
    cancellation: CancellationToken,
}

impl TaskScope {
    /// Create a scope on `handle`, on the ambient runtime, or on a freshly started one, in that
    /// order of preference.
    pub fn new(handle: Option<Handle>) -> std::io::Result<TaskScope> {
        let (handle, owned_runtime) = match handle.or_else(|| Handle::try_current().ok()) {
            Some(handle) => (handle, None),
            None => {
                log::debug!(target: "haumea", "no tokio runtime available, starting one");
                let runtime = Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("haumea-worker")
                    .enable_all()
                    .build()?;
                (runtime.handle().clone(), Some(runtime))
            }
        };

        Ok(TaskScope {
            handle,
            owned_runtime: Mutex::new(owned_runtime),
            cancellation: CancellationToken::new(),
        })
    }

    /// Spawn a task that is dropped as soon as the scope is closed.
    ///
    /// `on_complete` runs with the task's output only if the scope is still open by then.
    pub fn spawn<F, C>(&self, task: F, on_complete: C)
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
        C: FnOnce(F::Output) + Send + 'static,
    {
        let cancellation = self.cancellation.clone();
        self.handle.spawn(async move {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    log::debug!(target: "haumea", "background task cancelled");
                }
                output = task => {
                    if !cancellation.is_cancelled() {
                        on_complete(output);
                    }
                }
            }
        });
    }

    /// Run `task` on the scope's runtime and wait for it.
    ///
    /// Dropping the returned future aborts the task, so a caller that stops waiting also stops
    /// the work.
    pub async fn run<F>(&self, task: F) -> Result<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = AbortOnDropHandle::new(self.handle.spawn(task));
        match task.await {
            Ok(output) => Ok(output),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            // Cancelled: the owned runtime was shut down underneath us.
            Err(_) => Err(Error::Closed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel all tasks in the scope. Idempotent.
    pub fn close(&self) {
        self.cancellation.cancel();

        let owned_runtime = match self.owned_runtime.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(runtime) = owned_runtime {
            // Does not block, so it is safe to call from within an async context.
            runtime.shutdown_background();
        }
    }
}
