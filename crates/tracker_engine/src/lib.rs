//! Export tracker engine: backend task API, polling and timers.
mod client;
mod decode;
mod engine;
mod persist;
mod poll;
mod timer;
mod types;

pub use client::{ClientSettings, ReqwestTaskApi, TaskApi};
pub use decode::{decode_started, DecodeError};
pub use engine::{forward_interrupts, EngineError, EngineHandle};
pub use persist::{ensure_dir, write_atomically, PersistError};
pub use poll::{poll_task, ChannelProgressSink, PollSettings, ProgressSink};
pub use timer::{IntervalTimer, ScopedTask};
pub use types::{
    EngineEvent, FailureKind, JobFailure, TaskId, TaskKind, TaskOutcome, TaskProgress, TaskRef,
    TaskStatus,
};
