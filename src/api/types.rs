//! Wire payloads for the agent backend API

use crate::message::{FileRef, Message, MessageMeta};
use serde::{Deserialize, Serialize};

/// Request body shared by the synchronous send and the job-creation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub message: String,
    pub session_id: String,
    #[serde(default)]
    pub metadata: MessageMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// Set on job creation to request incremental delivery
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

/// Response body of the synchronous send call and of a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<FileRef>,
    #[serde(default)]
    pub metadata: MessageMeta,
}

impl SendResponse {
    /// Convert a terminal response into an assistant log entry
    pub fn into_message(self) -> Message {
        Message::assistant(self.content)
            .with_attachments(self.attachments)
            .with_metadata(self.metadata)
    }
}

/// Response body of the job-creation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreated {
    pub job_id: String,
}

/// Structured error body returned by the backend on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Server-supplied error string, if present
    pub fn message(&self) -> Option<&str> {
        self.detail.as_ref()?.error.as_deref()
    }
}

/// Full stored message history for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_send_request_omits_absent_fields() {
        let request = SendRequest {
            message: "hi".to_string(),
            session_id: "s1".to_string(),
            metadata: MessageMeta::empty(),
            workspace_id: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("workspace_id").is_none());
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_send_request_includes_stream_flag() {
        let request = SendRequest {
            message: "hi".to_string(),
            session_id: "s1".to_string(),
            metadata: MessageMeta::empty(),
            workspace_id: Some("w1".to_string()),
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["workspace_id"], "w1");
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": {"error": "quota exceeded"}}"#).unwrap();
        assert_eq!(body.message(), Some("quota exceeded"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail": {}}"#).unwrap();
        assert!(body.message().is_none());

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.message().is_none());
    }

    #[test]
    fn test_send_response_into_message() {
        let response: SendResponse =
            serde_json::from_str(r#"{"content": "done", "metadata": {"phase": "chat"}}"#).unwrap();
        let message = response.into_message();

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "done");
    }
}
