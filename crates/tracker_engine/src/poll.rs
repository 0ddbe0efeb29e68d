use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::{EngineEvent, FailureKind, JobFailure, TaskApi, TaskOutcome, TaskRef, TaskStatus};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Transport errors in a row before polling gives up.
    pub max_consecutive_errors: u32,
    /// Fail the job when progress has not changed for this long.
    pub stale_after: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_consecutive_errors: 5,
            stale_after: None,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polls `task` until it is terminal, emitting progress changes and exactly one
/// `JobCompleted`, or until `cancel` fires (then nothing more is emitted).
pub async fn poll_task(
    api: &dyn TaskApi,
    task: &TaskRef,
    settings: &PollSettings,
    sink: &dyn ProgressSink,
    cancel: &CancellationToken,
) {
    let mut last_progress = None;
    let mut last_change = Instant::now();
    let mut consecutive_errors = 0u32;

    loop {
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracker_info!("Polling of {} cancelled", task.task_id);
                return;
            }
            status = api.task_status(task) => status,
        };

        match status {
            Ok(TaskStatus::Pending(progress)) | Ok(TaskStatus::Processing(progress)) => {
                consecutive_errors = 0;
                if !progress.is_empty() && last_progress.as_ref() != Some(&progress) {
                    last_change = Instant::now();
                    last_progress = Some(progress.clone());
                    sink.emit(EngineEvent::Progress {
                        task_id: task.task_id.clone(),
                        progress,
                    });
                }
            }
            Ok(TaskStatus::Completed {
                download_url,
                text_blocks_count,
            }) => {
                let result = match download_url {
                    Some(download_url) => Ok(TaskOutcome {
                        download_url,
                        text_blocks_count,
                    }),
                    None => Err(JobFailure::new(
                        FailureKind::MissingDownload,
                        "导出完成但未返回下载地址",
                    )),
                };
                complete(sink, task, result);
                return;
            }
            Ok(TaskStatus::Failed { error }) => {
                let message = error.unwrap_or_else(|| "任务失败".to_string());
                complete(sink, task, Err(JobFailure::new(FailureKind::TaskFailed, message)));
                return;
            }
            Err(err) if is_fatal(&err.kind) => {
                complete(sink, task, Err(err));
                return;
            }
            Err(err) => {
                consecutive_errors += 1;
                tracker_warn!(
                    "Poll {} of {} failed ({}/{}): {}",
                    task.task_id,
                    task.kind,
                    consecutive_errors,
                    settings.max_consecutive_errors,
                    err
                );
                if consecutive_errors >= settings.max_consecutive_errors {
                    let failure = JobFailure::new(
                        FailureKind::GaveUp {
                            attempts: consecutive_errors,
                        },
                        err.message,
                    );
                    complete(sink, task, Err(failure));
                    return;
                }
            }
        }

        if let Some(limit) = settings.stale_after {
            if last_change.elapsed() >= limit {
                complete(
                    sink,
                    task,
                    Err(JobFailure::new(FailureKind::Stale, "任务长时间无进度")),
                );
                return;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracker_info!("Polling of {} cancelled", task.task_id);
                return;
            }
            _ = sleep(settings.interval) => {}
        }
    }
}

fn complete(sink: &dyn ProgressSink, task: &TaskRef, result: Result<TaskOutcome, JobFailure>) {
    match &result {
        Ok(outcome) => tracker_debug!("Task {} completed: {}", task.task_id, outcome.download_url),
        Err(failure) => tracker_warn!("Task {} failed: {}", task.task_id, failure),
    }
    sink.emit(EngineEvent::JobCompleted {
        task_id: task.task_id.clone(),
        result,
    });
}

/// Errors that retrying cannot fix.
fn is_fatal(kind: &FailureKind) -> bool {
    match kind {
        FailureKind::InvalidUrl | FailureKind::NotFound => true,
        FailureKind::Api { code } => code != "SERVER_ERROR",
        _ => false,
    }
}
