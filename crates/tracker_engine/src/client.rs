use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracker_logging::tracker_debug;
use url::Url;

use crate::decode::{decode_api_error, decode_started, decode_task_status, DecodeError};
use crate::{FailureKind, JobFailure, TaskKind, TaskRef, TaskStatus};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            auth_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The slice of the backend API the tracker needs.
#[async_trait::async_trait]
pub trait TaskApi: Send + Sync {
    /// Submit an editable-PPTX export of `project_id`; returns the new task id.
    async fn start_export(
        &self,
        project_id: &str,
        filename: Option<&str>,
    ) -> Result<String, JobFailure>;

    async fn task_status(&self, task: &TaskRef) -> Result<TaskStatus, JobFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTaskApi {
    base_url: Url,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl ReqwestTaskApi {
    pub fn new(settings: ClientSettings) -> Result<Self, JobFailure> {
        let mut base = settings.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|err| JobFailure::new(FailureKind::InvalidUrl, err.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| JobFailure::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base_url,
            auth_token: settings.auth_token.filter(|token| !token.is_empty()),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, JobFailure> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| JobFailure::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn status_path(task: &TaskRef) -> String {
        match &task.kind {
            TaskKind::PdfToPptx => format!("api/tools/pdf-to-pptx/{}", task.task_id),
            TaskKind::EditablePptx { project_id } => format!(
                "api/projects/{}/export/editable-pptx/{}",
                project_id, task.task_id
            ),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, JobFailure> {
        let response = self.authorize(request).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if status.is_success() {
            return Ok(body.to_vec());
        }
        let api_error = decode_api_error(&body);
        if status == StatusCode::NOT_FOUND {
            let message = api_error
                .map(|(_, message)| message)
                .unwrap_or_else(|| status.to_string());
            return Err(JobFailure::new(FailureKind::NotFound, message));
        }
        Err(match api_error {
            Some((code, message)) => JobFailure::new(FailureKind::Api { code }, message),
            None => JobFailure::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ),
        })
    }

    /// Absolute url from the backend if present, else the relative path joined to the base.
    fn resolve_download(&self, absolute: Option<String>, path: Option<String>) -> Option<String> {
        absolute.or_else(|| {
            path.and_then(|path| self.endpoint(&path).ok())
                .map(String::from)
        })
    }
}

#[async_trait::async_trait]
impl TaskApi for ReqwestTaskApi {
    async fn start_export(
        &self,
        project_id: &str,
        filename: Option<&str>,
    ) -> Result<String, JobFailure> {
        let url = self.endpoint(&format!("api/projects/{project_id}/export/editable-pptx"))?;
        let body = match filename {
            Some(name) => serde_json::json!({ "filename": name }),
            None => serde_json::json!({}),
        };
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());

        let bytes = self.send(request).await?;
        decode_started(&bytes).map_err(map_decode_error)
    }

    async fn task_status(&self, task: &TaskRef) -> Result<TaskStatus, JobFailure> {
        let url = self.endpoint(&Self::status_path(task))?;
        tracker_debug!("GET {}", url);
        let bytes = self.send(self.client.get(url)).await?;
        let raw = decode_task_status(&bytes).map_err(map_decode_error)?;

        Ok(match raw.status {
            TaskStatus::Completed {
                download_url,
                text_blocks_count,
            } => TaskStatus::Completed {
                download_url: self.resolve_download(download_url, raw.download_path),
                text_blocks_count,
            },
            other => other,
        })
    }
}

fn map_decode_error(err: DecodeError) -> JobFailure {
    match err {
        DecodeError::Api { code, message } => JobFailure::new(FailureKind::Api { code }, message),
        other => JobFailure::new(FailureKind::Decode, other.to_string()),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> JobFailure {
    if err.is_timeout() {
        return JobFailure::new(FailureKind::Timeout, err.to_string());
    }
    JobFailure::new(FailureKind::Network, err.to_string())
}
