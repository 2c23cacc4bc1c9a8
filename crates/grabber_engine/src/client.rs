use std::time::Duration;

use grabber_core::{SubmitRequest, TaskId, TaskSnapshot, TaskStatus, DEFAULT_SUBMISSION_MESSAGE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::poller::StatusSource;
use crate::retrieve::RetrieveError;
use crate::{StatusReply, SubmissionError, TransportError};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applied to job creation, discard and artifact retrieval. Status polls run without one.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    url: &'a str,
    format_type: &'a str,
    quality: String,
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
    progress: Option<f64>,
    speed: Option<f64>,
    eta: Option<f64>,
    filename: Option<String>,
    error: Option<String>,
}

impl StatusBody {
    fn into_snapshot(self) -> TaskSnapshot {
        TaskSnapshot {
            status: TaskStatus::parse(&self.status),
            progress: self.progress,
            speed_bytes_per_sec: self.speed,
            eta_seconds: self.eta,
            filename: self.filename.filter(|name| !name.is_empty()),
            error_message: self.error.filter(|message| !message.is_empty()),
        }
    }
}

/// HTTP client for the job backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base: Url,
    settings: ClientSettings,
}

impl BackendClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| TransportError::new(format!("invalid base url: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::new(format!(
                "invalid base url: {}",
                settings.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| TransportError::new(err.to_string()))?;
        Ok(Self {
            client,
            base,
            settings,
        })
    }

    /// `POST /api/download`; one request, no retry.
    pub async fn submit(&self, request: &SubmitRequest) -> Result<TaskId, SubmissionError> {
        let body = SubmitBody {
            url: &request.locator,
            format_type: request.format.as_str(),
            quality: request.quality.to_string(),
        };
        let response = self
            .client
            .post(self.endpoint(&["api", "download"]))
            .timeout(self.settings.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&text),
            });
        }
        parse_task_id(&text)
    }

    /// `GET /api/status/{task_id}`.
    pub async fn status(&self, task_id: &TaskId) -> Result<StatusReply, TransportError> {
        let response = self
            .client
            .get(self.endpoint(&["api", "status", task_id.as_str()]))
            .send()
            .await
            .map_err(|err| TransportError::new(err.to_string()))?;

        if !response.status().is_success() {
            return Ok(StatusReply::Expired);
        }
        let body: StatusBody = response
            .json()
            .await
            .map_err(|err| TransportError::new(format!("unreadable status body: {err}")))?;
        Ok(StatusReply::Snapshot(body.into_snapshot()))
    }

    /// `DELETE /api/task/{task_id}`. Returns whether the backend knew the task.
    pub async fn discard(&self, task_id: &TaskId) -> Result<bool, TransportError> {
        let response = self
            .client
            .delete(self.endpoint(&["api", "task", task_id.as_str()]))
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| TransportError::new(err.to_string()))?;
        Ok(response.status().is_success())
    }

    /// `GET /download/{task_id}`; the body is left unread for streaming.
    pub async fn open_artifact(&self, task_id: &TaskId) -> Result<reqwest::Response, RetrieveError> {
        let response = self
            .client
            .get(self.endpoint(&["download", task_id.as_str()]))
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| RetrieveError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RetrieveError::HttpStatus {
                status: status.as_u16(),
                detail: detail_message(&text).unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                }),
            });
        }
        Ok(response)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait::async_trait]
impl StatusSource for BackendClient {
    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusReply, TransportError> {
        self.status(task_id).await
    }
}

/// Prefers `message`, then `error`, then a generic default.
fn rejection_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|value| value.get(name))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(ToOwned::to_owned)
    };
    field("message")
        .or_else(|| field("error"))
        .unwrap_or_else(|| DEFAULT_SUBMISSION_MESSAGE.to_string())
}

fn detail_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("detail")?
        .as_str()
        .map(ToOwned::to_owned)
}

fn parse_task_id(body: &str) -> Result<TaskId, SubmissionError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| SubmissionError::Malformed(format!("invalid json: {err}")))?;
    value
        .get("task_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(TaskId::new)
        .ok_or_else(|| SubmissionError::Malformed("missing task_id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_prefers_message_then_error() {
        assert_eq!(
            rejection_message(r#"{"error":"Invalid YouTube URL","message":"Please provide a valid YouTube video URL"}"#),
            "Please provide a valid YouTube video URL"
        );
        assert_eq!(rejection_message(r#"{"error":"Invalid format type"}"#), "Invalid format type");
        assert_eq!(rejection_message(r#"{"detail":[{"msg":"bad"}]}"#), DEFAULT_SUBMISSION_MESSAGE);
        assert_eq!(rejection_message("<html>502</html>"), DEFAULT_SUBMISSION_MESSAGE);
    }

    #[test]
    fn task_id_must_be_a_non_empty_string() {
        assert_eq!(parse_task_id(r#"{"task_id":"t1","status":"completed"}"#), Ok(TaskId::new("t1")));
        assert!(matches!(parse_task_id(r#"{"task_id":42}"#), Err(SubmissionError::Malformed(_))));
        assert!(matches!(parse_task_id(r#"{"task_id":""}"#), Err(SubmissionError::Malformed(_))));
        assert!(matches!(parse_task_id("not json"), Err(SubmissionError::Malformed(_))));
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let client = BackendClient::new(ClientSettings {
            base_url: "http://localhost:9000/grabber/".to_string(),
            ..ClientSettings::default()
        })
        .unwrap();
        let url = client.endpoint(&["api", "status", "a/b"]);
        assert_eq!(url.as_str(), "http://localhost:9000/grabber/api/status/a%2Fb");
    }

    #[test]
    fn status_body_maps_empty_strings_to_none() {
        let body: StatusBody = serde_json::from_str(
            r#"{"task_id":"t1","status":"downloading","progress":12.5,"filename":"","error":null,"speed":2048.0,"eta":7}"#,
        )
        .unwrap();
        let snapshot = body.into_snapshot();
        assert_eq!(snapshot.status, TaskStatus::Downloading);
        assert_eq!(snapshot.progress, Some(12.5));
        assert_eq!(snapshot.eta_seconds, Some(7.0));
        assert_eq!(snapshot.filename, None);
        assert_eq!(snapshot.error_message, None);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = BackendClient::new(ClientSettings {
            base_url: "not a url".to_string(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert!(err.message.contains("invalid base url"));
    }
}
