//! Keystroke debouncing with explicit, cancellable scheduled tasks.
//!
//! Each `schedule` cancels whatever was pending and starts a fresh delay.
//! Earlier triggers are dropped, never queued.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A delayed task that has not necessarily run yet.
/// Dropping the handle cancels the task.
pub struct ScheduledTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run `task` after `delay` on `runtime` unless cancelled first.
    pub fn spawn<F>(runtime: &Handle, delay: Duration, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let token_for_task = token.clone();
        let handle = runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token_for_task.cancelled() => {}
                _ = tokio::time::sleep(delay) => task(),
            }
        });
        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Ran to completion or observed its cancellation
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct Debouncer {
    delay: Duration,
    runtime: Handle,
    pending: Option<ScheduledTask>,
}

impl Debouncer {
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            runtime,
            pending: None,
        }
    }

    /// Replace any pending task with `task`, to run after the idle delay.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.pending = Some(ScheduledTask::spawn(&self.runtime, self.delay, task));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }

    /// A task is scheduled and has neither run nor been cancelled
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|task| !task.is_cancelled() && !task.is_finished())
    }
}
