use crate::ProgressNotification;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Backend accepted a job; tracking begins.
    JobStarted { task_id: String, total: u32 },
    /// Backend progress for the tracked job.
    ProgressReported {
        task_id: String,
        notification: ProgressNotification,
    },
    /// Backend reported the job completed with a downloadable artifact.
    JobSucceeded {
        task_id: String,
        result_url: String,
        extra_count: Option<u32>,
    },
    /// Backend reported failure, or tracking was abandoned.
    JobFailed { task_id: String, message: String },
    /// One second elapsed on the elapsed-time ticker.
    TickerTick,
    /// The stage hint interval elapsed.
    HintTick,
    /// User asked to stop tracking the in-flight job.
    CancelClicked,
    /// User asked to run a failed job again.
    RetryClicked,
    /// User asked for the finished artifact.
    DownloadClicked,
    /// User closed a terminal result.
    DismissClicked,
}
