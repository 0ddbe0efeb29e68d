use crate::view_model::AppViewModel;
use crate::{present, ElapsedTicker, JobProgress, StageHintRotator, StatusKind};

/// What gets recorded about a job once it reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedJobSnapshot {
    pub task_id: String,
    pub status: StatusKind,
    pub result_url: Option<String>,
    pub error: Option<String>,
    pub extra_count: Option<u32>,
    pub elapsed_seconds: u64,
}

/// Application state around one tracked job.
///
/// Owns the job model and the two display timers; the timers exist only
/// between `JobStarted` and dismissal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    job: JobProgress,
    task_id: Option<String>,
    job_label: Option<String>,
    attempt: u32,
    hint_texts: Vec<String>,
    ticker: Option<ElapsedTicker>,
    hints: Option<StageHintRotator>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hints shown while processing; empty means the built-in list.
    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hint_texts = hints;
        self
    }

    pub fn with_job_label(mut self, label: impl Into<String>) -> Self {
        self.job_label = Some(label.into());
        self
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            job_label: self.job_label.clone(),
            attempt: self.attempt,
            progress: present(&self.job, self.ticker.as_ref(), self.hints.as_ref()),
            dirty: self.dirty,
        }
    }

    pub fn job(&self) -> &JobProgress {
        &self.job
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn ticker(&self) -> Option<&ElapsedTicker> {
        self.ticker.as_ref()
    }

    pub fn hints(&self) -> Option<&StageHintRotator> {
        self.hints.as_ref()
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Snapshot of the tracked job if it is terminal.
    pub fn finished_snapshot(&self) -> Option<FinishedJobSnapshot> {
        if !self.job.is_terminal() {
            return None;
        }
        Some(FinishedJobSnapshot {
            task_id: self.task_id.clone().unwrap_or_default(),
            status: self.job.status_kind(),
            result_url: self.job.result_url().map(ToOwned::to_owned),
            error: self.job.error_message().map(ToOwned::to_owned),
            extra_count: self.job.extra_count(),
            elapsed_seconds: self
                .ticker
                .as_ref()
                .map_or(0, ElapsedTicker::elapsed_seconds),
        })
    }

    pub(crate) fn job_mut(&mut self) -> &mut JobProgress {
        &mut self.job
    }

    pub(crate) fn is_current_task(&self, task_id: &str) -> bool {
        self.task_id.as_deref() == Some(task_id)
    }

    pub(crate) fn begin_tracking(&mut self, task_id: String) {
        self.task_id = Some(task_id);
        if self.attempt == 0 {
            self.attempt = 1;
        }
        let mut ticker = ElapsedTicker::new();
        ticker.start();
        let mut hints = StageHintRotator::new(self.hint_texts.clone());
        hints.start();
        self.ticker = Some(ticker);
        self.hints = Some(hints);
    }

    pub(crate) fn freeze_timers(&mut self) {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.stop();
        }
        if let Some(hints) = self.hints.as_mut() {
            hints.stop();
        }
    }

    pub(crate) fn tick_ticker(&mut self) -> bool {
        match self.ticker.as_mut() {
            Some(ticker) if ticker.is_active() => {
                ticker.tick();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn tick_hints(&mut self) -> bool {
        match self.hints.as_mut() {
            Some(hints) if hints.is_active() => {
                hints.tick();
                true
            }
            _ => false,
        }
    }

    /// Forgets the finished job; the next `JobStarted` gets a fresh model.
    pub(crate) fn clear_job(&mut self) {
        self.job.reset();
        self.task_id = None;
        self.ticker = None;
        self.hints = None;
    }

    pub(crate) fn next_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
