use std::time::Duration;

/// Period at which the owner is expected to call [`ElapsedTicker::tick`].
pub const TICKER_INTERVAL: Duration = Duration::from_millis(1000);

/// Whole seconds since the ticker was last started.
///
/// The ticker only holds state; something outside (an interval timer) calls
/// `tick` once per [`TICKER_INTERVAL`] while it is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElapsedTicker {
    elapsed_seconds: u64,
    active: bool,
}

impl ElapsedTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to zero and activates. A restart never resumes.
    pub fn start(&mut self) {
        self.elapsed_seconds = 0;
        self.active = true;
    }

    /// Freezes the counter at its current value.
    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn tick(&mut self) {
        if self.active {
            self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn formatted(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }
}

/// `"45 秒"` below a minute, `"1:05"` from there on.
pub fn format_elapsed(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds} 秒")
    } else {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}
