use std::fmt;

/// Backend task identifier (a UUID string).
pub type TaskId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Standalone PDF to PPTX conversion tool.
    PdfToPptx,
    /// OCR-based editable PPTX export of a project.
    EditablePptx { project_id: String },
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::PdfToPptx => write!(f, "pdf-to-pptx"),
            TaskKind::EditablePptx { project_id } => write!(f, "editable-pptx ({project_id})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    pub kind: TaskKind,
    pub task_id: TaskId,
}

impl TaskRef {
    pub fn new(kind: TaskKind, task_id: impl Into<TaskId>) -> Self {
        Self {
            kind,
            task_id: task_id.into(),
        }
    }
}

/// Progress object as reported by the backend, numbers already read leniently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskProgress {
    pub total: Option<i64>,
    pub completed: Option<i64>,
    pub current_page: Option<i64>,
    pub stage: Option<String>,
    pub stage_name: Option<String>,
    pub text_blocks_count: Option<i64>,
}

impl TaskProgress {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One poll answer, with the download location already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending(TaskProgress),
    Processing(TaskProgress),
    Completed {
        download_url: Option<String>,
        text_blocks_count: Option<i64>,
    },
    Failed {
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub download_url: String,
    pub text_blocks_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress {
        task_id: TaskId,
        progress: TaskProgress,
    },
    JobCompleted {
        task_id: TaskId,
        result: Result<TaskOutcome, JobFailure>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text suitable for showing to the user in place of the progress bar.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::TaskFailed | FailureKind::MissingDownload | FailureKind::Stale => {
                self.message.clone()
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    HttpStatus(u16),
    NotFound,
    Api { code: String },
    Decode,
    /// The backend reported the task as failed.
    TaskFailed,
    /// The task completed without a downloadable artifact.
    MissingDownload,
    /// No progress change within the configured staleness window.
    Stale,
    /// Too many consecutive transport errors while polling.
    GaveUp { attempts: u32 },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::NotFound => write!(f, "task not found"),
            FailureKind::Api { code } => write!(f, "api error {code}"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::TaskFailed => write!(f, "task failed"),
            FailureKind::MissingDownload => write!(f, "missing download url"),
            FailureKind::Stale => write!(f, "no progress"),
            FailureKind::GaveUp { attempts } => write!(f, "gave up after {attempts} errors"),
        }
    }
}
