//! Agent backend contract and its HTTP implementation

use super::types::{ErrorBody, JobCreated, SendRequest, SendResponse, SessionHistory};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::job::Job;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Fallback shown when the backend fails without a usable error body
pub const GENERIC_SEND_ERROR: &str = "The agent failed to process your message";

/// Transport seam between the session runtime and an agent backend.
///
/// Every network suspension point of the runtime goes through this trait,
/// so tests can script a backend without touching the wire.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Synchronous send: one request, one terminal response
    async fn send_message(&self, request: &SendRequest) -> Result<SendResponse>;

    /// Create an asynchronous job for the request; returns the job id
    async fn create_job(&self, request: &SendRequest) -> Result<String>;

    /// Fetch the current status of a job
    async fn fetch_job(&self, job_id: &str) -> Result<Job>;

    /// Fetch the stored history of a session.
    ///
    /// `Ok(None)` means the session does not exist yet — a new session,
    /// not an error.
    async fn fetch_session(&self, session_id: &str) -> Result<Option<SessionHistory>>;
}

/// reqwest-backed implementation of [`AgentBackend`]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend client against the configured base URL
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-2xx response to the server-supplied error string, falling
    /// back to a generic message when the body carries none.
    async fn error_from_response(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        match body.message() {
            Some(message) => Error::Api(message.to_string()),
            None => Error::Api(format!("{} ({})", GENERIC_SEND_ERROR, status)),
        }
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn send_message(&self, request: &SendRequest) -> Result<SendResponse> {
        let response = self
            .client
            .post(self.url("/api/agent/message"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn create_job(&self, request: &SendRequest) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/agent/jobs"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let created: JobCreated = response.json().await?;
        Ok(created.job_id)
    }

    async fn fetch_job(&self, job_id: &str) -> Result<Job> {
        let response = self
            .client
            .get(self.url(&format!("/api/agent/jobs/{}", job_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<Option<SessionHistory>> {
        let response = self
            .client
            .get(self.url(&format!("/api/sessions/{}", session_id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..ApiConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();

        assert_eq!(
            backend.url("/api/agent/message"),
            "http://localhost:9000/api/agent/message"
        );
    }

    #[test]
    fn test_job_url_is_path_addressed() {
        let backend = HttpBackend::new(&ApiConfig::default()).unwrap();
        assert_eq!(
            backend.url(&format!("/api/agent/jobs/{}", "j-42")),
            "http://127.0.0.1:8820/api/agent/jobs/j-42"
        );
    }
}
