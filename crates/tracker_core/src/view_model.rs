use crate::{ElapsedTicker, JobProgress, JobStatus, StageHintRotator, StatusKind};

/// Shown when the backend has not named the current stage.
pub const DEFAULT_STAGE_LABEL: &str = "处理中...";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrimaryAction {
    #[default]
    None,
    Download { url: String },
    ShowError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressView {
    pub status: StatusKind,
    pub percentage: u8,
    pub stage_label: String,
    pub unit_text: String,
    pub can_dismiss: bool,
    pub primary_action: PrimaryAction,
    pub elapsed_text: Option<String>,
    pub hint: Option<String>,
    pub extra_count: Option<u32>,
}

/// Derives everything a renderer needs from the job and its two timers.
pub fn present(
    job: &JobProgress,
    ticker: Option<&ElapsedTicker>,
    hints: Option<&StageHintRotator>,
) -> ProgressView {
    let status = job.status_kind();
    let unit = job.current_unit().unwrap_or(job.display_completed());

    let primary_action = match job.status() {
        JobStatus::Idle | JobStatus::Processing => PrimaryAction::None,
        JobStatus::Success { result_url } => PrimaryAction::Download {
            url: result_url.clone(),
        },
        JobStatus::Error { message } => PrimaryAction::ShowError {
            message: message.clone(),
        },
    };

    let hint = match status {
        StatusKind::Processing => hints.map(|rotator| rotator.current().to_owned()),
        StatusKind::Idle | StatusKind::Success | StatusKind::Error => None,
    };

    ProgressView {
        status,
        percentage: job.percentage(),
        stage_label: job
            .stage_label()
            .unwrap_or(DEFAULT_STAGE_LABEL)
            .to_owned(),
        unit_text: format!("{} / {}", unit, job.total()),
        can_dismiss: job.is_terminal(),
        primary_action,
        elapsed_text: ticker.map(ElapsedTicker::formatted),
        hint,
        extra_count: job.extra_count(),
    }
}

/// Whole-application view: the tracked job plus what the shell needs to label it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub job_label: Option<String>,
    pub attempt: u32,
    pub progress: ProgressView,
    pub dirty: bool,
}
