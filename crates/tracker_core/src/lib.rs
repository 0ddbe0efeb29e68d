//! Export tracker core: pure job-progress state machine and view-model helpers.
mod effect;
mod hints;
mod msg;
mod progress;
mod state;
mod ticker;
mod update;
mod view_model;

pub use effect::Effect;
pub use hints::{StageHintRotator, DEFAULT_HINTS, HINT_INTERVAL};
pub use msg::Msg;
pub use progress::{
    percentage_of, JobProgress, JobStatus, ProgressNotification, StatusKind, TransitionRejected,
};
pub use state::{AppState, FinishedJobSnapshot};
pub use ticker::{format_elapsed, ElapsedTicker, TICKER_INTERVAL};
pub use update::update;
pub use view_model::{present, AppViewModel, PrimaryAction, ProgressView, DEFAULT_STAGE_LABEL};
