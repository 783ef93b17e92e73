//! Duplex channel connection manager

use super::{ChannelFrame, ChannelState};
use crate::config::ChannelConfig;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Notify, RwLock};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

/// Owns one persistent websocket connection for a mounted view.
///
/// Created on mount, torn down with [`DuplexChannel::shutdown`] (or drop).
/// After a close the manager reconnects automatically with capped
/// exponential backoff; the attempt counter resets only on a successful
/// open or an explicit [`DuplexChannel::reconnect`].
pub struct DuplexChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    config: ChannelConfig,
    state: RwLock<ChannelState>,
    reconnect_attempt: AtomicU32,
    /// Sender into the live connection's write half, when connected
    outbound: RwLock<Option<mpsc::UnboundedSender<WsMessage>>>,
    frames: mpsc::Sender<ChannelFrame>,
    /// Wakes the run loop out of a backoff sleep or a live connection
    reconnect_now: Notify,
    /// Set by `reconnect()` so the run loop skips the scheduled delay
    force_reconnect: AtomicBool,
    shutdown: CancellationToken,
}

impl DuplexChannel {
    /// Create a channel; call [`DuplexChannel::spawn`] to start connecting.
    ///
    /// Inbound frames that parse are delivered on `frames`; everything else
    /// is dropped silently.
    pub fn new(config: ChannelConfig, frames: mpsc::Sender<ChannelFrame>) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                config,
                state: RwLock::new(ChannelState::Disconnected),
                reconnect_attempt: AtomicU32::new(0),
                outbound: RwLock::new(None),
                frames,
                reconnect_now: Notify::new(),
                force_reconnect: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Start the connect/reconnect loop on the current runtime
    pub fn spawn(&self) -> tokio::task::JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(ChannelInner::run(inner))
    }

    /// Current connection state
    pub async fn state(&self) -> ChannelState {
        *self.inner.state.read().await
    }

    /// Whether the channel is currently connected
    pub async fn is_connected(&self) -> bool {
        self.state().await == ChannelState::Connected
    }

    /// Reconnect attempts scheduled since the last successful open
    pub fn reconnect_attempt(&self) -> u32 {
        self.inner.reconnect_attempt.load(Ordering::SeqCst)
    }

    /// Best-effort send of a caller payload.
    ///
    /// A silent no-op unless the channel is connected; callers that need
    /// guaranteed delivery must use the request/response paths.
    pub async fn send(&self, payload: &serde_json::Value) {
        if *self.inner.state.read().await != ChannelState::Connected {
            tracing::debug!("Channel not connected, dropping outbound payload");
            return;
        }
        if let Some(sender) = self.inner.outbound.read().await.as_ref() {
            let _ = sender.send(WsMessage::Text(payload.to_string()));
        }
    }

    /// Force a close-then-reconnect cycle, resetting backoff state and
    /// bypassing any scheduled delay.
    pub fn reconnect(&self) {
        self.inner.reconnect_attempt.store(0, Ordering::SeqCst);
        self.inner.force_reconnect.store(true, Ordering::SeqCst);
        self.inner.reconnect_now.notify_one();
    }

    /// Tear the channel down; the run loop exits and the socket closes.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.reconnect_now.notify_one();
    }
}

impl Drop for DuplexChannel {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl ChannelInner {
    async fn set_state(&self, state: ChannelState) {
        *self.state.write().await = state;
    }

    async fn run(inner: Arc<Self>) {
        loop {
            if inner.shutdown.is_cancelled() {
                break;
            }

            inner.set_state(ChannelState::Connecting).await;
            match connect_async(inner.config.url.as_str()).await {
                Ok((stream, _)) => {
                    inner.reconnect_attempt.store(0, Ordering::SeqCst);
                    inner.set_state(ChannelState::Connected).await;
                    tracing::info!(url = %inner.config.url, "Duplex channel connected");

                    inner.serve_connection(stream).await;

                    *inner.outbound.write().await = None;
                    inner.set_state(ChannelState::Disconnected).await;
                    tracing::debug!(url = %inner.config.url, "Duplex channel disconnected");
                }
                Err(e) => {
                    inner.set_state(ChannelState::Disconnected).await;
                    tracing::warn!(url = %inner.config.url, "Duplex channel connect failed: {}", e);
                }
            }

            if inner.shutdown.is_cancelled() || !inner.config.auto_reconnect {
                break;
            }

            // A manual reconnect skips the scheduled delay entirely
            if inner.force_reconnect.swap(false, Ordering::SeqCst) {
                continue;
            }

            let attempt = inner.reconnect_attempt.fetch_add(1, Ordering::SeqCst);
            let delay = backoff_delay(&inner.config, attempt);
            inner.set_state(ChannelState::Reconnecting).await;
            tracing::debug!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Scheduling channel reconnect"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = inner.reconnect_now.notified() => {}
                _ = inner.shutdown.cancelled() => break,
            }
        }

        inner.set_state(ChannelState::Disconnected).await;
    }

    /// Drive one live connection until it closes, errors, or is interrupted.
    ///
    /// A transport-level error force-closes the connection, funnelling into
    /// the same close/backoff path as a server close.
    async fn serve_connection<S>(&self, stream: WebSocketStream<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<WsMessage>();
        *self.outbound.write().await = Some(outbound_tx);

        loop {
            tokio::select! {
                inbound = source.next() => match inbound {
                    Some(Ok(WsMessage::Text(text))) => self.dispatch(&text).await,
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = sink.send(WsMessage::Pong(data)).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Duplex channel transport error, closing: {}", e);
                        break;
                    }
                },
                outbound = outbound_rx.recv() => match outbound {
                    Some(message) => {
                        if sink.send(message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = self.reconnect_now.notified() => {
                    self.force_reconnect.store(true, Ordering::SeqCst);
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
                _ = self.shutdown.cancelled() => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
            }
        }
    }

    /// Parse and dispatch one inbound frame; malformed frames are dropped.
    async fn dispatch(&self, text: &str) {
        match serde_json::from_str::<ChannelFrame>(text) {
            Ok(frame) => {
                if self.frames.send(frame).await.is_err() {
                    tracing::debug!("Channel frame receiver dropped");
                }
            }
            Err(e) => {
                tracing::debug!("Dropping malformed channel frame: {}", e);
            }
        }
    }
}

/// Reconnect delay for the given attempt: `min(base * 2^attempt, ceiling)`
fn backoff_delay(config: &ChannelConfig, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.min(63)).unwrap_or(u64::MAX);
    let delay = config.backoff_base_ms.saturating_mul(factor);
    Duration::from_millis(delay.min(config.backoff_max_ms))
}
