use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{TaskProgress, TaskStatus};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("response is not valid JSON: {0}")]
    Json(String),
    #[error("api error {code}: {message}")]
    Api { code: String, message: String },
    #[error("response envelope has no data")]
    MissingData,
    #[error("unknown task status {0:?}")]
    UnknownStatus(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct StartedData {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatusData {
    status: String,
    #[serde(default)]
    progress: Option<ProgressData>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    download_url_absolute: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProgressData {
    #[serde(default, deserialize_with = "lenient_count")]
    total: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    completed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    current_page: Option<i64>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    stage_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    text_blocks_count: Option<i64>,
}

impl From<ProgressData> for TaskProgress {
    fn from(data: ProgressData) -> Self {
        Self {
            total: data.total,
            completed: data.completed,
            current_page: data.current_page,
            stage: data.stage,
            stage_name: data.stage_name,
            text_blocks_count: data.text_blocks_count,
        }
    }
}

/// Decoded status before the download location is resolved against a base url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawTaskStatus {
    pub status: TaskStatus,
    pub download_path: Option<String>,
}

/// Decode the `task_id` out of a "task created" response.
pub fn decode_started(bytes: &[u8]) -> Result<String, DecodeError> {
    let data: StartedData = open_envelope(bytes)?;
    Ok(data.task_id)
}

/// Decode a task status response. `download_url` in the result is only the
/// absolute url; see [`RawTaskStatus::download_path`] for the relative one.
pub(crate) fn decode_task_status(bytes: &[u8]) -> Result<RawTaskStatus, DecodeError> {
    let data: TaskStatusData = open_envelope(bytes)?;
    let progress = TaskProgress::from(data.progress.unwrap_or_default());

    let status = match data.status.trim().to_ascii_uppercase().as_str() {
        "PENDING" => TaskStatus::Pending(progress),
        "PROCESSING" | "RUNNING" => TaskStatus::Processing(progress),
        "COMPLETED" => TaskStatus::Completed {
            download_url: non_blank(data.download_url_absolute),
            text_blocks_count: progress.text_blocks_count,
        },
        "FAILED" => TaskStatus::Failed {
            error: non_blank(data.error),
        },
        _ => return Err(DecodeError::UnknownStatus(data.status)),
    };

    Ok(RawTaskStatus {
        status,
        download_path: non_blank(data.download_url),
    })
}

/// Pull the error body out of a non-2xx response, if it is an API envelope.
pub(crate) fn decode_api_error(bytes: &[u8]) -> Option<(String, String)> {
    let envelope: Envelope<Value> = serde_json::from_slice(bytes).ok()?;
    envelope.error.map(|err| (err.code, err.message))
}

fn open_envelope<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, DecodeError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(bytes).map_err(|err| DecodeError::Json(err.to_string()))?;
    if !envelope.success {
        let (code, message) = envelope
            .error
            .map(|err| (err.code, err.message))
            .unwrap_or_else(|| ("ERROR".to_string(), String::new()));
        return Err(DecodeError::Api { code, message });
    }
    envelope.data.ok_or(DecodeError::MissingData)
}

/// Accepts integers, floats (rounded) and numeric strings; anything else is absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Number(number) => number.as_i64().or_else(|| round_finite(number.as_f64()?)),
        Value::String(text) => round_finite(text.trim().parse::<f64>().ok()?),
        _ => None,
    }))
}

fn round_finite(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.round() as i64)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_processing_with_loose_numbers() {
        let body = r#"{
            "success": true,
            "message": "Success",
            "data": {
                "task_id": "abc",
                "status": "PROCESSING",
                "progress": {
                    "total": 12.0,
                    "completed": "4",
                    "current_page": 5.6,
                    "stage": "parsing",
                    "stage_name": "解析第 5 页...",
                    "text_blocks_count": null
                }
            }
        }"#
        .as_bytes();

        let raw = decode_task_status(body).unwrap();
        assert_eq!(
            raw.status,
            TaskStatus::Processing(TaskProgress {
                total: Some(12),
                completed: Some(4),
                current_page: Some(6),
                stage: Some("parsing".into()),
                stage_name: Some("解析第 5 页...".into()),
                text_blocks_count: None,
            })
        );
    }

    #[test]
    fn completed_keeps_both_download_forms() {
        let body = br#"{"success": true, "data": {
            "task_id": "abc", "status": "COMPLETED",
            "progress": {"output_path": "/x/y.pptx", "pages_count": 3, "text_blocks_count": 42},
            "download_url": "/files/tools/exports/y.pptx",
            "download_url_absolute": ""
        }}"#;

        let raw = decode_task_status(body).unwrap();
        assert_eq!(
            raw.status,
            TaskStatus::Completed {
                download_url: None,
                text_blocks_count: Some(42),
            }
        );
        assert_eq!(
            raw.download_path.as_deref(),
            Some("/files/tools/exports/y.pptx")
        );
    }

    #[test]
    fn failed_envelope_becomes_api_error() {
        let body = r#"{"success": false, "error": {"code": "TASK_NOT_FOUND", "message": "任务不存在"}}"#.as_bytes();

        assert_eq!(
            decode_task_status(body).unwrap_err(),
            DecodeError::Api {
                code: "TASK_NOT_FOUND".into(),
                message: "任务不存在".into(),
            }
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let body = br#"{"success": true, "data": {"status": "PAUSED"}}"#;
        assert_eq!(
            decode_task_status(body).unwrap_err(),
            DecodeError::UnknownStatus("PAUSED".into())
        );
    }

    #[test]
    fn started_response_yields_task_id() {
        let body = br#"{"success": true, "message": "ok", "data": {"task_id": "t-1", "message": "Export task started"}}"#;
        assert_eq!(decode_started(body).unwrap(), "t-1");
    }
}
