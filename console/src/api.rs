use async_trait::async_trait;
use common::{BrowseListing, ErrorBody, JobConfig, JobId, JobPayload, JobSummary, KillResponse,
             Run, RunId, RunTriggered};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Failure of a single API call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("{0}")]
    Transport(String),
    /// The backend answered with a non-2xx status.
    #[error("{detail}")]
    Status { status: u16, detail: String },
    /// The backend answered 2xx with a body that does not match the wire model.
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait JobsApi: Send + Sync + 'static {
    /// `GET /api/jobs`
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ApiError>;
    /// `GET /api/jobs/{id}`
    async fn get_job(&self, id: &JobId) -> Result<JobConfig, ApiError>;
    /// `POST /api/jobs`
    async fn create_job(&self, payload: &JobPayload) -> Result<JobConfig, ApiError>;
    /// `PUT /api/jobs/{id}`
    async fn update_job(&self, id: &JobId, payload: &JobPayload) -> Result<JobConfig, ApiError>;
    /// `DELETE /api/jobs/{id}`
    async fn delete_job(&self, id: &JobId) -> Result<(), ApiError>;
    /// `POST /api/jobs/{id}/run`
    async fn run_job(&self, id: &JobId) -> Result<RunTriggered, ApiError>;
    /// `POST /api/jobs/{id}/kill`
    async fn kill_job(&self, id: &JobId) -> Result<KillResponse, ApiError>;
    /// `GET /api/jobs/{id}/runs?limit=N`, newest first.
    async fn job_runs(&self, id: &JobId, limit: u32) -> Result<Vec<Run>, ApiError>;
    /// `GET /api/runs?limit=N`, newest first across all jobs.
    async fn all_runs(&self, limit: u32) -> Result<Vec<Run>, ApiError>;
    /// `GET /api/runs/{id}/log`, plain text.
    async fn run_log(&self, id: &RunId) -> Result<String, ApiError>;
    /// `GET /api/browse?path=P`
    async fn browse(&self, path: &str) -> Result<BrowseListing, ApiError>;
}

pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            detail: error_detail(status.as_u16(), &body),
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Message shown for a non-2xx response: the JSON `detail` when the body has
/// one, the raw text otherwise, and the status line for empty bodies.
pub fn error_detail(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message().unwrap_or_else(|| "Request failed".to_string());
    }
    let text = body.trim();
    if text.is_empty() {
        format!("HTTP {}", status)
    } else {
        text.to_string()
    }
}

#[async_trait]
impl JobsApi for HttpApi {
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ApiError> {
        self.json(self.client.get(self.url("/api/jobs"))).await
    }

    async fn get_job(&self, id: &JobId) -> Result<JobConfig, ApiError> {
        self.json(self.client.get(self.url(&format!("/api/jobs/{}", id)))).await
    }

    async fn create_job(&self, payload: &JobPayload) -> Result<JobConfig, ApiError> {
        self.json(self.client.post(self.url("/api/jobs")).json(payload)).await
    }

    async fn update_job(&self, id: &JobId, payload: &JobPayload) -> Result<JobConfig, ApiError> {
        let url = self.url(&format!("/api/jobs/{}", id));
        self.json(self.client.put(url).json(payload)).await
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), ApiError> {
        self.send(self.client.delete(self.url(&format!("/api/jobs/{}", id)))).await?;
        Ok(())
    }

    async fn run_job(&self, id: &JobId) -> Result<RunTriggered, ApiError> {
        self.json(self.client.post(self.url(&format!("/api/jobs/{}/run", id)))).await
    }

    async fn kill_job(&self, id: &JobId) -> Result<KillResponse, ApiError> {
        self.json(self.client.post(self.url(&format!("/api/jobs/{}/kill", id)))).await
    }

    async fn job_runs(&self, id: &JobId, limit: u32) -> Result<Vec<Run>, ApiError> {
        let url = self.url(&format!("/api/jobs/{}/runs", id));
        self.json(self.client.get(url).query(&[("limit", limit)])).await
    }

    async fn all_runs(&self, limit: u32) -> Result<Vec<Run>, ApiError> {
        self.json(self.client.get(self.url("/api/runs")).query(&[("limit", limit)])).await
    }

    async fn run_log(&self, id: &RunId) -> Result<String, ApiError> {
        let response = self.send(self.client.get(self.url(&format!("/api/runs/{}/log", id)))).await?;
        response.text().await.map_err(|e| ApiError::Transport(e.to_string()))
    }

    async fn browse(&self, path: &str) -> Result<BrowseListing, ApiError> {
        self.json(self.client.get(self.url("/api/browse")).query(&[("path", path)])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_json_detail() {
        assert_eq!(error_detail(404, r#"{"detail":"Log not found"}"#), "Log not found");
        assert_eq!(error_detail(500, r#"{"error":"boom"}"#), "Request failed");
    }

    #[test]
    fn test_error_detail_falls_back_to_text_and_status() {
        assert_eq!(error_detail(502, "Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_detail(503, ""), "HTTP 503");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = HttpApi::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.url("/api/jobs"), "http://localhost:8000/api/jobs");
    }
}
