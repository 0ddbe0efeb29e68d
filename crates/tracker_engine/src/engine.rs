use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_info, tracker_warn, with_job};

use crate::poll::{poll_task, PollSettings, ProgressSink};
use crate::timer::{IntervalTimer, ScopedTask};
use crate::{JobFailure, TaskApi, TaskId, TaskRef};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Owns the async runtime and every task running on it.
///
/// Poll loops and timers are held as scoped guards, so dropping the handle
/// stops all of them.
pub struct EngineHandle {
    runtime: tokio::runtime::Runtime,
    api: Arc<dyn TaskApi>,
    settings: PollSettings,
    sink: Arc<dyn ProgressSink>,
    tracking: Mutex<HashMap<TaskId, ScopedTask>>,
}

impl EngineHandle {
    pub fn new(
        api: Arc<dyn TaskApi>,
        settings: PollSettings,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tracker-engine")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            api,
            settings,
            sink,
            tracking: Mutex::new(HashMap::new()),
        })
    }

    /// Submits a new editable-PPTX export, blocking until the backend answers.
    pub fn start_export(
        &self,
        project_id: &str,
        filename: Option<&str>,
    ) -> Result<TaskId, JobFailure> {
        let api = self.api.clone();
        self.runtime
            .block_on(async move { api.start_export(project_id, filename).await })
    }

    /// Starts polling `task` in the background; events go to the sink.
    pub fn track(&self, task: TaskRef) {
        let api = self.api.clone();
        let sink = self.sink.clone();
        let settings = self.settings.clone();
        let task_id = task.task_id.clone();
        tracker_info!("Polling {} every {:?}", task.kind, settings.interval);

        let guard = ScopedTask::spawn_on(self.runtime.handle(), move |token| async move {
            let task_id = task.task_id.clone();
            with_job(task_id, async {
                poll_task(api.as_ref(), &task, &settings, sink.as_ref(), &token).await;
            })
            .await;
        });

        let mut tracking = match self.tracking.lock() {
            Ok(tracking) => tracking,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracking.retain(|_, running| !running.is_finished());
        if tracking.insert(task_id.clone(), guard).is_some() {
            tracker_warn!("Replaced an existing poll loop for {}", task_id);
        }
    }

    /// Stops polling `task_id`. Returns whether a poll loop was still running.
    pub fn cancel(&self, task_id: &str) -> bool {
        let removed = match self.tracking.lock() {
            Ok(mut tracking) => tracking.remove(task_id),
            Err(poisoned) => poisoned.into_inner().remove(task_id),
        };
        match removed {
            Some(guard) => {
                let was_running = !guard.is_finished();
                guard.stop();
                was_running
            }
            None => false,
        }
    }

    pub fn interval<F>(&self, period: Duration, on_tick: F) -> IntervalTimer
    where
        F: FnMut() + Send + 'static,
    {
        IntervalTimer::start_on(self.runtime.handle(), period, on_tick)
    }

    /// Runs `on_interrupt` on every Ctrl-C until the returned guard is dropped.
    pub fn on_interrupt<F>(&self, on_interrupt: F) -> ScopedTask
    where
        F: FnMut() + Send + 'static,
    {
        ScopedTask::spawn_on(self.runtime.handle(), move |token| {
            forward_interrupts(tokio::signal::ctrl_c, token, on_interrupt)
        })
    }
}

/// Calls `on_interrupt` for each signal `next_signal` resolves, until `token`
/// is cancelled or the signal source fails.
pub async fn forward_interrupts<S, Fut, F>(
    mut next_signal: S,
    token: CancellationToken,
    mut on_interrupt: F,
) where
    S: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
    F: FnMut(),
{
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            signal = next_signal() => match signal {
                Ok(()) => on_interrupt(),
                Err(err) => {
                    tracker_warn!("Cannot listen for Ctrl-C: {}", err);
                    break;
                }
            },
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let tracking = match self.tracking.get_mut() {
            Ok(tracking) => tracking,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Guards must be dropped while the runtime is still alive.
        tracking.clear();
    }
}
