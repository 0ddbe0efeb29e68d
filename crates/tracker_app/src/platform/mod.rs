mod app;
mod config;
mod effects;
mod logging;
mod persistence;
mod render;

pub(crate) use app::{run_history, run_job};
pub(crate) use config::{LoadedConfig, TrackerConfig};
pub(crate) use effects::JobSource;
pub(crate) use logging::initialize as initialize_logging;
