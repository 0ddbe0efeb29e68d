use std::io;
use std::process::ExitCode;
use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use tracker_core::{update, AppState, Msg, StatusKind};
use tracker_engine::{EngineHandle, ReqwestTaskApi};
use tracker_logging::{tracker_info, tracker_warn};

use super::config::TrackerConfig;
use super::effects::{EffectRunner, JobSource, MsgSink};
use super::persistence::{load_history, Outcome};
use super::render::TerminalRenderer;

/// Tracks one job to completion, retrying failed exports up to `retries` times.
pub(crate) fn run_job(config: &TrackerConfig, source: JobSource, retries: u32) -> Result<ExitCode> {
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();

    let api = ReqwestTaskApi::new(config.client_settings()).context("invalid backend settings")?;
    let sink = MsgSink::new(msg_tx.clone());
    let engine = EngineHandle::new(Arc::new(api), config.poll_settings(), Arc::new(sink))?;

    let mut state = AppState::new()
        .with_hints(config.hints.clone())
        .with_job_label(source.label());
    let mut runner = EffectRunner::new(
        engine,
        msg_tx.clone(),
        source,
        retries,
        config.history_dir.clone(),
    );

    let mut interrupts = InterruptForwarder::new(msg_tx.clone());
    let _interrupt = runner.engine().on_interrupt(move || {
        if interrupts.press() == InterruptAction::Exit {
            eprintln!("\n再次中断, 立即退出");
            std::process::exit(130);
        }
    });

    runner.begin().context("failed to start tracking")?;

    let mut renderer = TerminalRenderer::new(io::stdout());
    while !runner.is_finished() {
        let Ok(msg) = msg_rx.recv() else {
            tracker_warn!("Message channel closed before the job finished");
            break;
        };
        let (next, effects) = update(std::mem::take(&mut state), msg);
        state = next;

        let view = state.view();
        if state.consume_dirty() {
            if let Err(err) = renderer.render(&view) {
                tracker_warn!("Failed to draw progress: {}", err);
            }
        }
        runner.run(effects);
    }

    let outcome = runner.outcome();
    tracker_info!("Finished with {:?}", outcome);
    Ok(match outcome {
        Some(StatusKind::Success) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    Cancel,
    Exit,
}

/// First Ctrl-C asks the loop to cancel the job; any later one exits.
struct InterruptForwarder {
    tx: mpsc::Sender<Msg>,
    presses: u32,
}

impl InterruptForwarder {
    fn new(tx: mpsc::Sender<Msg>) -> Self {
        Self { tx, presses: 0 }
    }

    fn press(&mut self) -> InterruptAction {
        self.presses += 1;
        if self.presses > 1 {
            return InterruptAction::Exit;
        }
        tracker_info!("Interrupted, cancelling");
        let _ = self.tx.send(Msg::CancelClicked);
        InterruptAction::Cancel
    }
}

/// Prints the most recent `limit` finished jobs, newest first.
pub(crate) fn run_history(config: &TrackerConfig, limit: usize) -> ExitCode {
    let entries = load_history(&config.history_dir);
    if entries.is_empty() {
        println!("暂无记录");
        return ExitCode::SUCCESS;
    }

    for entry in entries.iter().rev().take(limit) {
        let detail = match entry.outcome {
            Outcome::Success => entry.download_url.clone().unwrap_or_default(),
            Outcome::Error => entry.error.clone().unwrap_or_default(),
        };
        let mark = match entry.outcome {
            Outcome::Success => "成功",
            Outcome::Error => "失败",
        };
        println!(
            "{}  {:<14} {}  {}  {}s  {}",
            entry.finished_at, entry.kind, entry.task_id, mark, entry.elapsed_seconds, detail
        );
    }
    ExitCode::SUCCESS
}
