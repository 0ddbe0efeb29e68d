use thiserror::Error;

/// One progress report from the backend, as delivered by the transport.
///
/// Counts are signed because the wire format is loosely typed; the model
/// clamps them on entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressNotification {
    pub total: i64,
    /// Absent while the backend is still inside a unit (e.g. parsing a page).
    pub completed: Option<i64>,
    pub current_page: Option<i64>,
    pub stage: Option<String>,
    pub stage_name: Option<String>,
    pub text_blocks_count: Option<i64>,
}

/// Coarse lifecycle state without payload, used for comparisons and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Processing,
    Success { result_url: String },
    Error { message: String },
}

impl JobStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            JobStatus::Idle => StatusKind::Idle,
            JobStatus::Processing => StatusKind::Processing,
            JobStatus::Success { .. } => StatusKind::Success,
            JobStatus::Error { .. } => StatusKind::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionRejected {
    #[error("job is {actual:?}, expected {expected:?}")]
    WrongStatus {
        expected: StatusKind,
        actual: StatusKind,
    },
    #[error("success requires a non-empty result url")]
    EmptyResultUrl,
    #[error("failure requires a non-empty error message")]
    EmptyErrorMessage,
}

/// Client-side view of one remote job.
///
/// `completed` stores the latest reported value; `display_floor` is the
/// highest value seen since the job started and is what views show.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobProgress {
    total: u32,
    completed: u32,
    display_floor: u32,
    current_unit: Option<u32>,
    stage_code: Option<String>,
    stage_label: Option<String>,
    extra_count: Option<u32>,
    status: JobStatus,
}

impl JobProgress {
    /// Fresh job already in `Processing`.
    pub fn begin(total: u32) -> Self {
        Self {
            total,
            status: JobStatus::Processing,
            ..Self::default()
        }
    }

    /// `Idle -> Processing` on an existing instance.
    pub fn start(&mut self, total: u32) -> Result<(), TransitionRejected> {
        self.expect(StatusKind::Idle)?;
        *self = Self::begin(total);
        Ok(())
    }

    /// Applies a backend report. Out-of-range values are clamped, never rejected;
    /// only a job that is not processing refuses updates.
    pub fn apply_update(
        &mut self,
        notification: &ProgressNotification,
    ) -> Result<(), TransitionRejected> {
        self.expect(StatusKind::Processing)?;

        let reported_total = to_count(notification.total);
        if reported_total > 0 {
            self.total = reported_total;
        }

        if let Some(completed) = notification.completed {
            self.completed = to_count(completed);
        }
        self.completed = self.clamp_to_total(self.completed);
        self.display_floor = self
            .clamp_to_total(self.display_floor)
            .max(self.completed);
        self.current_unit = self
            .current_unit
            .filter(|_| self.total > 0)
            .map(|unit| self.clamp_to_total(unit));

        if let Some(page) = notification.current_page {
            self.current_unit = match to_count(page) {
                0 => None,
                _ if self.total == 0 => None,
                unit => Some(unit.min(self.total)),
            };
        }
        if let Some(code) = notification.stage.as_deref() {
            self.stage_code = non_blank(code);
        }
        if let Some(label) = notification.stage_name.as_deref() {
            self.stage_label = non_blank(label);
        }
        if let Some(count) = notification.text_blocks_count {
            self.extra_count = Some(to_count(count));
        }
        Ok(())
    }

    pub fn mark_success(
        &mut self,
        result_url: impl Into<String>,
        extra_count: Option<u32>,
    ) -> Result<(), TransitionRejected> {
        self.expect(StatusKind::Processing)?;
        let result_url = result_url.into();
        if result_url.trim().is_empty() {
            return Err(TransitionRejected::EmptyResultUrl);
        }
        if extra_count.is_some() {
            self.extra_count = extra_count;
        }
        self.status = JobStatus::Success { result_url };
        Ok(())
    }

    /// Counters and stage are kept so the view freezes at its last values.
    pub fn mark_failure(&mut self, message: impl Into<String>) -> Result<(), TransitionRejected> {
        self.expect(StatusKind::Processing)?;
        let message = message.into();
        if message.trim().is_empty() {
            return Err(TransitionRejected::EmptyErrorMessage);
        }
        self.status = JobStatus::Error { message };
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn status_kind(&self) -> StatusKind {
        self.status.kind()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            JobStatus::Success { .. } | JobStatus::Error { .. }
        )
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Latest reported value, possibly lower than an earlier report.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn display_completed(&self) -> u32 {
        self.display_floor
    }

    pub fn current_unit(&self) -> Option<u32> {
        self.current_unit
    }

    pub fn stage_code(&self) -> Option<&str> {
        self.stage_code.as_deref()
    }

    pub fn stage_label(&self) -> Option<&str> {
        self.stage_label.as_deref()
    }

    pub fn extra_count(&self) -> Option<u32> {
        self.extra_count
    }

    pub fn result_url(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Success { result_url } => Some(result_url),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Displayed percentage, never below the highest value seen this session.
    pub fn percentage(&self) -> u8 {
        percentage_of(self.display_floor, self.total)
    }

    fn expect(&self, expected: StatusKind) -> Result<(), TransitionRejected> {
        let actual = self.status_kind();
        if actual == expected {
            Ok(())
        } else {
            Err(TransitionRejected::WrongStatus { expected, actual })
        }
    }

    fn clamp_to_total(&self, value: u32) -> u32 {
        value.min(self.total)
    }
}

/// `round(100 * completed / total)` clamped to 0..=100; 0 when `total` is 0.
pub fn percentage_of(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    // Half-up rounding in integers.
    let rounded = (200 * completed + total) / (2 * total);
    rounded.min(100) as u8
}

fn to_count(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
