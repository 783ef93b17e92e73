//! Agent session controller: the orchestrator behind a chat view
//!
//! One controller per session view. It owns the message log exclusively,
//! dispatches sends through the configured delivery mode, and exposes
//! loading/progress/error state for the UI to render. No other component
//! mutates the log.

use crate::api::{AgentBackend, SendRequest};
use crate::channel::ChannelFrame;
use crate::config::{AgentdeckConfig, DeliveryMode};
use crate::error::{Error, Result};
use crate::job::{JobPoller, JobProgress};
use crate::message::{Message, MessageMeta};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

/// Clears the loading flag when dropped, so the flag can never stick even
/// when a send fails or returns early.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn engage(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates message delivery for one agent session view
pub struct SessionController {
    backend: Arc<dyn AgentBackend>,
    session_id: String,
    delivery: DeliveryMode,
    workspace_id: Option<String>,
    poller: JobPoller,
    messages: Arc<RwLock<Vec<Message>>>,
    is_loading: Arc<AtomicBool>,
    error: Arc<RwLock<Option<String>>>,
    /// Guards one-time restoration; set before the first fetch begins
    restored: AtomicBool,
    /// Scratch buffer for streamed content pushed over the duplex channel
    streaming: Arc<RwLock<String>>,
    progress: watch::Sender<JobProgress>,
    cancel: CancellationToken,
}

impl SessionController {
    /// Create a controller for `session_id` over the given backend
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        session_id: impl Into<String>,
        config: &AgentdeckConfig,
    ) -> Self {
        let (progress, _) = watch::channel(JobProgress::default());
        Self {
            poller: JobPoller::new(backend.clone(), config.polling.clone()),
            backend,
            session_id: session_id.into(),
            delivery: config.delivery.mode,
            workspace_id: config.api.workspace_id.clone(),
            messages: Arc::new(RwLock::new(Vec::new())),
            is_loading: Arc::new(AtomicBool::new(false)),
            error: Arc::new(RwLock::new(None)),
            restored: AtomicBool::new(false),
            streaming: Arc::new(RwLock::new(String::new())),
            progress,
            cancel: CancellationToken::new(),
        }
    }

    /// Session this controller sends into
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether a send is in flight. The UI disables input while true, which
    /// keeps sends serialized per session.
    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    /// The current surfaced error, if any
    pub async fn error(&self) -> Option<String> {
        self.error.read().await.clone()
    }

    /// Subscribe to progress updates for the in-flight send
    pub fn progress_rx(&self) -> watch::Receiver<JobProgress> {
        self.progress.subscribe()
    }

    /// Content streamed over the duplex channel for the in-flight send
    pub async fn streaming_content(&self) -> String {
        self.streaming.read().await.clone()
    }

    /// Snapshot of the message log
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Tear down the view: cancels any in-flight poll loop so a completion
    /// can no longer mutate state after unmount.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Restore history from durable storage, at most once per controller.
    ///
    /// A missing session is a new session. Any other failure is swallowed
    /// so the view never blocks on restoration; the controller is marked
    /// restored regardless.
    pub async fn restore(&self) {
        if self.restored.swap(true, Ordering::SeqCst) {
            return;
        }

        match self.backend.fetch_session(&self.session_id).await {
            Ok(Some(history)) => {
                let count = history.messages.len();
                *self.messages.write().await = history.messages;
                tracing::info!(session_id = %self.session_id, count, "Restored session history");
            }
            Ok(None) => {
                tracing::debug!(session_id = %self.session_id, "No stored history, new session");
            }
            Err(e) => {
                tracing::debug!(session_id = %self.session_id, "Session restore failed: {}", e);
            }
        }
    }

    /// Send a user message and deliver the assistant's reply into the log.
    ///
    /// The user message is appended before any network call; the assistant
    /// message is appended only after a successful terminal result. On
    /// failure the error is surfaced through [`SessionController::error`]
    /// and no assistant message is appended. The loading flag is cleared on
    /// every path.
    pub async fn send_message(
        &self,
        content: impl Into<String>,
        metadata: Option<MessageMeta>,
    ) -> Result<()> {
        self.restore().await;

        let content = content.into();
        let metadata = metadata.unwrap_or_default();

        // Reset per-send state before dispatching
        *self.error.write().await = None;
        self.streaming.write().await.clear();
        self.progress.send_replace(JobProgress::default());

        self.messages
            .write()
            .await
            .push(Message::user(content.clone()).with_metadata(metadata.clone()));

        let _guard = LoadingGuard::engage(self.is_loading.clone());

        let request = SendRequest {
            message: content,
            session_id: self.session_id.clone(),
            metadata,
            workspace_id: self.workspace_id.clone(),
            stream: false,
        };

        let outcome = match self.delivery {
            DeliveryMode::Sync => self.backend.send_message(&request).await,
            DeliveryMode::Async => self.deliver_async(request).await,
        };

        match outcome {
            Ok(response) => {
                if self.cancel.is_cancelled() {
                    // The view went away while we were waiting; leave the
                    // log untouched.
                    return Err(Error::Cancelled);
                }
                self.messages.write().await.push(response.into_message());
                Ok(())
            }
            Err(e) => {
                *self.error.write().await = Some(e.to_string());
                tracing::warn!(session_id = %self.session_id, "Send failed: {}", e);
                Err(e)
            }
        }
    }

    /// Async delivery: create a job, then poll it to a terminal outcome
    async fn deliver_async(&self, mut request: SendRequest) -> Result<crate::api::SendResponse> {
        request.stream = true;
        let job_id = self.backend.create_job(&request).await?;
        tracing::debug!(session_id = %self.session_id, job_id = %job_id, "Created agent job");
        self.poller.poll(&job_id, &self.progress, &self.cancel).await
    }

    /// Replace the in-memory log with the stored history of `session_id`.
    ///
    /// A missing session yields an empty log. Fetch failures are recoverable
    /// and surfaced through the same error channel as `send_message`.
    pub async fn load_session(&self, session_id: &str) -> Result<()> {
        match self.backend.fetch_session(session_id).await {
            Ok(history) => {
                *self.messages.write().await =
                    history.map(|h| h.messages).unwrap_or_default();
                Ok(())
            }
            Err(e) => {
                *self.error.write().await = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Empty the in-memory log. Durable storage is untouched.
    pub async fn clear_messages(&self) {
        self.messages.write().await.clear();
    }

    /// Feed a duplex-channel frame into view state.
    ///
    /// Display only: frames update progress and the streaming scratch
    /// buffer but never complete a send — the poller stays the completion
    /// authority.
    pub async fn handle_frame(&self, frame: &ChannelFrame) {
        match frame {
            ChannelFrame::JobProgress {
                progress, message, ..
            } => {
                let current = self.progress.borrow().percent;
                self.progress.send_replace(JobProgress {
                    percent: current.max((*progress).min(100)),
                    message: message.clone(),
                });
            }
            ChannelFrame::ContentChunk { content, .. } => {
                self.streaming.write().await.push_str(content);
            }
            ChannelFrame::ConnectionEstablished { .. } => {
                tracing::debug!(session_id = %self.session_id, "Channel established");
            }
        }
    }
}
