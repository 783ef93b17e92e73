//! Asynchronous job model and the polling loop that drives it
//!
//! Async delivery creates a server-side job, then fetches its status at a
//! fixed interval until a terminal state or until the attempt budget runs
//! out. Push-based progress frames may arrive independently over the duplex
//! channel, but the poller remains the completion authority.

use crate::api::{AgentBackend, SendResponse};
use crate::config::PollingConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Fallback for a failed job without a server-supplied error
const GENERIC_JOB_ERROR: &str = "The agent job failed";

/// Server-tracked job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states end the poll loop
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// A server-tracked unit of asynchronous work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub progress_message: Option<String>,
    #[serde(default)]
    pub result: Option<SendResponse>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Progress snapshot published to observers on every successful status fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobProgress {
    /// Percent complete, 0–100, never decreasing for one send
    pub percent: u8,
    /// Server-supplied progress message, if any
    pub message: Option<String>,
}

/// Fixed-interval poller for asynchronous jobs.
///
/// One instance is reusable across jobs; all per-job state lives in the
/// [`JobPoller::poll`] call.
pub struct JobPoller {
    backend: Arc<dyn AgentBackend>,
    config: PollingConfig,
}

impl JobPoller {
    /// Create a poller over the given backend
    pub fn new(backend: Arc<dyn AgentBackend>, config: PollingConfig) -> Self {
        Self { backend, config }
    }

    /// Poll `job_id` until it completes, fails, is cancelled server-side, or
    /// the attempt budget is exhausted.
    ///
    /// Progress is published on every successful fetch, clamped so observers
    /// only ever see non-decreasing values. A transient fetch failure is
    /// swallowed and retried on the next interval; only an explicit terminal
    /// status or budget exhaustion ends the loop. The cancellation token
    /// aborts the loop between fetches without further state mutation.
    pub async fn poll(
        &self,
        job_id: &str,
        progress: &watch::Sender<JobProgress>,
        cancel: &CancellationToken,
    ) -> Result<SendResponse> {
        let mut last_percent = 0u8;

        for attempt in 0..self.config.max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self.backend.fetch_job(job_id).await {
                Ok(job) => {
                    last_percent = last_percent.max(job.progress.min(100));
                    progress.send_replace(JobProgress {
                        percent: last_percent,
                        message: job.progress_message.clone(),
                    });

                    if job.status.is_terminal() {
                        return match job.status {
                            JobStatus::Completed => job
                                .result
                                .ok_or_else(|| Error::Job(GENERIC_JOB_ERROR.to_string())),
                            JobStatus::Failed => Err(Error::Job(
                                job.error.unwrap_or_else(|| GENERIC_JOB_ERROR.to_string()),
                            )),
                            _ => Err(Error::Job("The agent job was cancelled".to_string())),
                        };
                    }
                }
                Err(e) => {
                    tracing::debug!(job_id, attempt, "Job status fetch failed, retrying: {}", e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval()) => {}
                _ = cancel.cancelled() => return Err(Error::Cancelled),
            }
        }

        Err(Error::Timeout(self.config.max_attempts))
    }
}
