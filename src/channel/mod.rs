//! Duplex channel: persistent bidirectional connection to the agent backend
//!
//! The channel carries push notifications (job progress, streamed content)
//! that the request/response paths cannot. Delivery is best-effort in both
//! directions; anything that needs guarantees goes through the HTTP API or
//! the job-polling path instead.

mod manager;

pub use manager::DuplexChannel;

use serde::{Deserialize, Serialize};

/// Connection state of a duplex channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Inbound frame, tagged by `type`.
///
/// Frames that fail to parse are dropped by the manager without surfacing
/// an error; malformed input must never take the connection down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelFrame {
    /// Progress update for an in-flight job
    JobProgress {
        job_id: String,
        #[serde(default)]
        progress: u8,
        #[serde(default)]
        message: Option<String>,
    },
    /// Incremental content produced while a job streams
    ContentChunk {
        #[serde(default)]
        session_id: Option<String>,
        content: String,
    },
    /// Server acknowledgement after the connection opens
    ConnectionEstablished {
        #[serde(default)]
        session_id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_progress_frame_parses() {
        let frame: ChannelFrame = serde_json::from_str(
            r#"{"type": "job_progress", "job_id": "j1", "progress": 40, "message": "planning"}"#,
        )
        .unwrap();

        assert_eq!(
            frame,
            ChannelFrame::JobProgress {
                job_id: "j1".to_string(),
                progress: 40,
                message: Some("planning".to_string()),
            }
        );
    }

    #[test]
    fn test_content_chunk_frame_parses() {
        let frame: ChannelFrame =
            serde_json::from_str(r#"{"type": "content_chunk", "content": "partial"}"#).unwrap();

        assert_eq!(
            frame,
            ChannelFrame::ContentChunk {
                session_id: None,
                content: "partial".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_frame_type_is_an_error() {
        let result = serde_json::from_str::<ChannelFrame>(r#"{"type": "heartbeat"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(serde_json::from_str::<ChannelFrame>("not json at all").is_err());
        assert!(serde_json::from_str::<ChannelFrame>(r#"{"no_type": true}"#).is_err());
    }
}
