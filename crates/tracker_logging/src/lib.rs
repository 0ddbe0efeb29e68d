#![deny(missing_docs)]
//! Shared logging utilities for the export tracker workspace.
//!
//! This crate provides the `tracker_*` logging macros used across the codebase,
//! a "current job" tag that the macros prepend to every record, and a minimal
//! test initializer for the global logger.
//!
//! The tag is per thread for synchronous code ([`set_current_job`]) and per
//! task for futures running on a multi-thread runtime ([`with_job`]); the task
//! tag wins when both are set.

use std::cell::RefCell;
use std::future::Future;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Task id of the job the current thread is working on, if any.
    static CURRENT_JOB: RefCell<Option<String>> = const { RefCell::new(None) };
}

tokio::task_local! {
    /// Task id of the job an async task is working on.
    static TASK_JOB: String;
}

/// Runs `future` with every record it logs tagged with `task_id`, whichever
/// runtime thread happens to poll it.
pub async fn with_job<F: Future>(task_id: String, future: F) -> F::Output {
    TASK_JOB.scope(task_id, future).await
}

/// Tags log records emitted from this thread with `task_id`.
/// Pass `None` once the thread stops working on the job.
pub fn set_current_job(task_id: Option<&str>) {
    CURRENT_JOB.with(|job| *job.borrow_mut() = task_id.map(ToOwned::to_owned));
}

/// Returns the task id of the surrounding [`with_job`] scope, else the one
/// set with [`set_current_job`] for this thread.
pub fn current_job() -> Option<String> {
    TASK_JOB
        .try_with(Clone::clone)
        .ok()
        .or_else(|| CURRENT_JOB.with(|job| job.borrow().clone()))
}

/// Prefix prepended by the logging macros, `"[job <id>] "` or empty.
#[doc(hidden)]
pub fn job_prefix() -> String {
    match current_job() {
        Some(id) => format!("[job {id}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}
