use crate::FinishedJobSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the one-second ticker and the hint rotation timers.
    StartTimers,
    /// Stop both timers. Emitted on every path that leaves `Processing`.
    StopTimers,
    /// Stop tracking the job; the runner answers with `Msg::JobFailed`.
    CancelJob { task_id: String },
    /// Submit a fresh job; the runner answers with `Msg::JobStarted`.
    RetryJob { attempt: u32 },
    OpenDownload { url: String },
    /// A job reached a terminal state and should be recorded.
    RecordFinished(FinishedJobSnapshot),
    /// The terminal result was closed; the view is idle again.
    Dismissed,
}
