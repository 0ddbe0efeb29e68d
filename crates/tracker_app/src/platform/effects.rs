use std::path::PathBuf;
use std::sync::mpsc;

use chrono::Utc;
use tracker_core::{
    Effect, FinishedJobSnapshot, Msg, ProgressNotification, StatusKind, HINT_INTERVAL,
    TICKER_INTERVAL,
};
use tracker_engine::{
    EngineEvent, EngineHandle, IntervalTimer, JobFailure, ProgressSink, TaskKind, TaskProgress,
    TaskRef,
};
use tracker_logging::{set_current_job, tracker_info, tracker_warn};

use super::persistence::{append_history, HistoryEntry};

pub(crate) const CANCELLED_MESSAGE: &str = "已取消";

/// Turns engine events into update messages.
pub(crate) struct MsgSink {
    tx: mpsc::Sender<Msg>,
}

impl MsgSink {
    pub(crate) fn new(tx: mpsc::Sender<Msg>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event_to_msg(event));
    }
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress { task_id, progress } => Msg::ProgressReported {
            task_id,
            notification: to_notification(progress),
        },
        EngineEvent::JobCompleted {
            task_id,
            result: Ok(outcome),
        } => Msg::JobSucceeded {
            task_id,
            result_url: outcome.download_url,
            extra_count: outcome
                .text_blocks_count
                .map(|count| u32::try_from(count.max(0)).unwrap_or(u32::MAX)),
        },
        EngineEvent::JobCompleted {
            task_id,
            result: Err(failure),
        } => Msg::JobFailed {
            task_id,
            message: failure.user_message(),
        },
    }
}

fn to_notification(progress: TaskProgress) -> ProgressNotification {
    ProgressNotification {
        total: progress.total.unwrap_or(0),
        completed: progress.completed,
        current_page: progress.current_page,
        stage: progress.stage,
        stage_name: progress.stage_name,
        text_blocks_count: progress.text_blocks_count,
    }
}

/// Where the tracked task comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JobSource {
    /// Submit a new export of the project, then poll it.
    Export {
        project_id: String,
        filename: Option<String>,
    },
    /// Poll a task that is already running.
    Attach(TaskRef),
}

impl JobSource {
    pub(crate) fn label(&self) -> String {
        match self {
            JobSource::Export { project_id, .. } => TaskKind::EditablePptx {
                project_id: project_id.clone(),
            }
            .to_string(),
            JobSource::Attach(task) => task.kind.to_string(),
        }
    }

    fn history_kind(&self) -> &'static str {
        match self {
            JobSource::Export { .. } => "editable-pptx",
            JobSource::Attach(task) => match task.kind {
                TaskKind::PdfToPptx => "pdf-to-pptx",
                TaskKind::EditablePptx { .. } => "editable-pptx",
            },
        }
    }
}

/// Carries out effects against the engine and reports back through `msg_tx`.
pub(crate) struct EffectRunner {
    // Timers are declared first so they drop before the engine's runtime.
    ticker_timer: Option<IntervalTimer>,
    hint_timer: Option<IntervalTimer>,
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    source: JobSource,
    retries_left: u32,
    history_dir: PathBuf,
    cancelled: bool,
    outcome: Option<StatusKind>,
    finished: bool,
}

impl EffectRunner {
    pub(crate) fn new(
        engine: EngineHandle,
        msg_tx: mpsc::Sender<Msg>,
        source: JobSource,
        retries: u32,
        history_dir: PathBuf,
    ) -> Self {
        Self {
            ticker_timer: None,
            hint_timer: None,
            engine,
            msg_tx,
            source,
            retries_left: retries,
            history_dir,
            cancelled: false,
            outcome: None,
            finished: false,
        }
    }

    pub(crate) fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// True once the result has been shown and dismissed.
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn outcome(&self) -> Option<StatusKind> {
        self.outcome
    }

    /// Submits or attaches to the job and starts polling it.
    pub(crate) fn begin(&mut self) -> Result<(), JobFailure> {
        let task = match &self.source {
            JobSource::Export {
                project_id,
                filename,
            } => {
                let task_id = self.engine.start_export(project_id, filename.as_deref())?;
                tracker_info!("Export of project {} started as task {}", project_id, task_id);
                TaskRef::new(
                    TaskKind::EditablePptx {
                        project_id: project_id.clone(),
                    },
                    task_id,
                )
            }
            JobSource::Attach(task) => task.clone(),
        };

        set_current_job(Some(task.task_id.as_str()));
        self.cancelled = false;
        // JobStarted must be queued before the poll loop can report anything.
        let _ = self.msg_tx.send(Msg::JobStarted {
            task_id: task.task_id.clone(),
            total: 0,
        });
        self.engine.track(task);
        Ok(())
    }

    pub(crate) fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartTimers => self.start_timers(),
                Effect::StopTimers => self.stop_timers(),
                Effect::CancelJob { task_id } => {
                    let was_running = self.engine.cancel(&task_id);
                    tracker_info!("Cancelled task {} (poll loop running: {})", task_id, was_running);
                    self.cancelled = true;
                    self.send(Msg::JobFailed {
                        task_id,
                        message: CANCELLED_MESSAGE.to_string(),
                    });
                }
                Effect::RetryJob { attempt } => {
                    tracker_info!("Retrying, attempt {}", attempt);
                    if let Err(err) = self.begin() {
                        tracker_warn!("Retry failed to start: {}", err);
                        eprintln!("重试失败: {}", err.user_message());
                        self.outcome = Some(StatusKind::Error);
                        self.finished = true;
                    }
                }
                Effect::OpenDownload { url } => {
                    tracker_info!("Download available at {}", url);
                    println!("下载地址: {url}");
                }
                Effect::RecordFinished(snapshot) => self.record(snapshot),
                Effect::Dismissed => {
                    set_current_job(None);
                    self.finished = true;
                }
            }
        }
    }

    fn record(&mut self, snapshot: FinishedJobSnapshot) {
        match HistoryEntry::from_snapshot(&snapshot, self.source.history_kind(), Utc::now()) {
            Some(entry) => append_history(&self.history_dir, entry),
            None => tracker_warn!("Task {} finished without a terminal status", snapshot.task_id),
        }
        self.outcome = Some(snapshot.status);

        match snapshot.status {
            StatusKind::Success => {
                self.send(Msg::DownloadClicked);
                self.send(Msg::DismissClicked);
            }
            StatusKind::Error if self.should_retry() => {
                self.retries_left -= 1;
                self.send(Msg::RetryClicked);
            }
            StatusKind::Error | StatusKind::Idle | StatusKind::Processing => {
                self.send(Msg::DismissClicked);
            }
        }
    }

    fn should_retry(&self) -> bool {
        self.retries_left > 0 && !self.cancelled && matches!(self.source, JobSource::Export { .. })
    }

    fn start_timers(&mut self) {
        self.stop_timers();
        let tx = self.msg_tx.clone();
        self.ticker_timer = Some(self.engine.interval(TICKER_INTERVAL, move || {
            let _ = tx.send(Msg::TickerTick);
        }));
        let tx = self.msg_tx.clone();
        self.hint_timer = Some(self.engine.interval(HINT_INTERVAL, move || {
            let _ = tx.send(Msg::HintTick);
        }));
    }

    fn stop_timers(&mut self) {
        if let Some(timer) = self.ticker_timer.take() {
            timer.stop();
        }
        if let Some(timer) = self.hint_timer.take() {
            timer.stop();
        }
    }

    fn send(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }
}
