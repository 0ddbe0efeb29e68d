use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::{AppState, Effect, JobStatus, Msg, StatusKind, TransitionRejected};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::JobStarted { task_id, total } => {
            // A finished job must be dismissed or retried before the next one.
            if let Err(err) = state.job_mut().start(total) {
                tracker_warn!("Ignoring start of {}: {}", task_id, err);
                return (state, Vec::new());
            }
            tracker_info!("Tracking job {} (total={})", task_id, total);
            state.begin_tracking(task_id);
            state.mark_dirty();
            vec![Effect::StartTimers]
        }
        Msg::ProgressReported {
            task_id,
            notification,
        } => {
            if !state.is_current_task(&task_id) {
                tracker_debug!("Dropping progress for stale job {}", task_id);
                return (state, Vec::new());
            }
            match state.job_mut().apply_update(&notification) {
                Ok(()) => state.mark_dirty(),
                Err(err) => log_rejection(&task_id, "progress", &err),
            }
            Vec::new()
        }
        Msg::JobSucceeded {
            task_id,
            result_url,
            extra_count,
        } => {
            if !state.is_current_task(&task_id) {
                tracker_debug!("Dropping result for stale job {}", task_id);
                return (state, Vec::new());
            }
            let outcome = state.job_mut().mark_success(result_url, extra_count);
            finish(&mut state, &task_id, outcome)
        }
        Msg::JobFailed { task_id, message } => {
            if !state.is_current_task(&task_id) {
                tracker_debug!("Dropping failure for stale job {}", task_id);
                return (state, Vec::new());
            }
            let outcome = state.job_mut().mark_failure(message);
            finish(&mut state, &task_id, outcome)
        }
        Msg::TickerTick => {
            if state.tick_ticker() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::HintTick => {
            if state.tick_hints() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CancelClicked => match (state.job().status_kind(), state.task_id()) {
            (StatusKind::Processing, Some(task_id)) => vec![Effect::CancelJob {
                task_id: task_id.to_owned(),
            }],
            _ => Vec::new(),
        },
        Msg::RetryClicked => {
            if state.job().status_kind() != StatusKind::Error {
                return (state, Vec::new());
            }
            state.clear_job();
            let attempt = state.next_attempt();
            state.mark_dirty();
            vec![Effect::RetryJob { attempt }]
        }
        Msg::DownloadClicked => match state.job().status() {
            JobStatus::Success { result_url } => vec![Effect::OpenDownload {
                url: result_url.clone(),
            }],
            JobStatus::Idle | JobStatus::Processing | JobStatus::Error { .. } => Vec::new(),
        },
        Msg::DismissClicked => {
            if !state.job().is_terminal() {
                // In-flight jobs cannot be dismissed, only cancelled.
                return (state, Vec::new());
            }
            state.clear_job();
            state.mark_dirty();
            vec![Effect::Dismissed]
        }
    };

    (state, effects)
}

fn finish(
    state: &mut AppState,
    task_id: &str,
    outcome: Result<(), TransitionRejected>,
) -> Vec<Effect> {
    if let Err(err) = outcome {
        log_rejection(task_id, "terminal result", &err);
        return Vec::new();
    }
    state.freeze_timers();
    state.mark_dirty();
    let mut effects = vec![Effect::StopTimers];
    if let Some(snapshot) = state.finished_snapshot() {
        tracker_info!("Job {} finished as {:?}", task_id, snapshot.status);
        effects.push(Effect::RecordFinished(snapshot));
    }
    effects
}

fn log_rejection(task_id: &str, what: &str, err: &TransitionRejected) {
    match err {
        // Late or duplicate reports after a terminal state are expected.
        TransitionRejected::WrongStatus { .. } => {
            tracker_debug!("Ignored {} for job {}: {}", what, task_id, err)
        }
        TransitionRejected::EmptyResultUrl | TransitionRejected::EmptyErrorMessage => {
            tracker_warn!("Rejected {} for job {}: {}", what, task_id, err)
        }
    }
}
