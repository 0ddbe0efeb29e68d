use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracker_core::{FinishedJobSnapshot, StatusKind};
use tracker_engine::write_atomically;
use tracker_logging::{tracker_error, tracker_info, tracker_warn};

const HISTORY_FILENAME: &str = ".export_tracker_history.ron";
const MAX_ENTRIES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Outcome {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HistoryEntry {
    pub task_id: String,
    pub kind: String,
    pub outcome: Outcome,
    pub download_url: Option<String>,
    pub error: Option<String>,
    pub extra_count: Option<u32>,
    pub elapsed_seconds: u64,
    pub finished_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedHistory {
    entries: Vec<HistoryEntry>,
}

impl HistoryEntry {
    /// `None` for snapshots that are not terminal.
    pub(crate) fn from_snapshot(
        snapshot: &FinishedJobSnapshot,
        kind: &str,
        finished_at: DateTime<Utc>,
    ) -> Option<Self> {
        let outcome = match snapshot.status {
            StatusKind::Success => Outcome::Success,
            StatusKind::Error => Outcome::Error,
            StatusKind::Idle | StatusKind::Processing => return None,
        };
        Some(Self {
            task_id: snapshot.task_id.clone(),
            kind: kind.to_string(),
            outcome,
            download_url: snapshot.result_url.clone(),
            error: snapshot.error.clone(),
            extra_count: snapshot.extra_count,
            elapsed_seconds: snapshot.elapsed_seconds,
            finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

/// Oldest first. Unreadable history is treated as empty.
pub(crate) fn load_history(dir: &Path) -> Vec<HistoryEntry> {
    let path = dir.join(HISTORY_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            tracker_warn!("Failed to read history from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    match ron::from_str::<PersistedHistory>(&content) {
        Ok(history) => history.entries,
        Err(err) => {
            tracker_warn!("Failed to parse history from {:?}: {}", path, err);
            Vec::new()
        }
    }
}

pub(crate) fn append_history(dir: &Path, entry: HistoryEntry) {
    let mut entries = load_history(dir);
    entries.push(entry);
    if entries.len() > MAX_ENTRIES {
        let excess = entries.len() - MAX_ENTRIES;
        entries.drain(..excess);
    }

    let history = PersistedHistory { entries };
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&history, pretty) {
        Ok(text) => text,
        Err(err) => {
            tracker_error!("Failed to serialize history: {}", err);
            return;
        }
    };

    let path = dir.join(HISTORY_FILENAME);
    match write_atomically(&path, &content) {
        Ok(_) => tracker_info!("Recorded job in {:?}", path),
        Err(err) => tracker_error!("Failed to write history to {:?}: {}", path, err),
    }
}
