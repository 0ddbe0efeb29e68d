use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// A spawned task that is cancelled when this guard is stopped or dropped.
///
/// Cancellation happens exactly once: `stop` consumes the guard and `Drop`
/// only acts on a handle that has not been taken yet.
#[derive(Debug)]
pub struct ScopedTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ScopedTask {
    /// Spawns `make(token)` on `runtime`. The future should return once the
    /// token is cancelled; it is aborted regardless.
    pub fn spawn_on<F, Fut>(runtime: &Handle, make: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = runtime.spawn(make(token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn stop(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.token.cancel();
            handle.abort();
        }
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Calls `on_tick` once per `period`, first call one period after start.
#[derive(Debug)]
pub struct IntervalTimer {
    task: ScopedTask,
}

impl IntervalTimer {
    /// Starts on the runtime of the calling task.
    pub fn start<F>(period: Duration, on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::start_on(&Handle::current(), period, on_tick)
    }

    pub fn start_on<F>(runtime: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let task = ScopedTask::spawn_on(runtime, move |token| async move {
            let mut interval = interval_at(Instant::now() + period, period);
            // Missed ticks are replayed so the tick count tracks wall-clock time.
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => on_tick(),
                }
            }
        });
        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.stop();
    }
}
