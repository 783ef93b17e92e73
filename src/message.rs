//! Conversation message model
//!
//! The message log is append-only within a session and owned exclusively by
//! the session controller; every other component only reads it. Metadata is
//! fixed at append time and never mutated afterwards, so latest-first scans
//! (artifact extraction) are stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Opaque handle to server-held file content.
///
/// The runtime never interprets the bytes behind `storage_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub filename: String,
    pub content_type: String,
    pub storage_key: String,
    pub size_bytes: u64,
}

/// Pins the `phase` tag of generated-files metadata to the literal
/// `"generated"` during (de)serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedPhase {
    Generated,
}

/// Validation outcome attached to a generated-files bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Metadata for a message produced in the generated-files phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMeta {
    pub phase: GeneratedPhase,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub validation: Option<Validation>,
}

/// Message metadata: known phases as typed variants, everything else kept as
/// an opaque key-value bag for forward compatibility with other producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageMeta {
    Generated(GeneratedMeta),
    Opaque(HashMap<String, serde_json::Value>),
}

impl MessageMeta {
    /// An empty opaque bag
    pub fn empty() -> Self {
        MessageMeta::Opaque(HashMap::new())
    }

    /// The generated-files metadata, if this message carries it
    pub fn as_generated(&self) -> Option<&GeneratedMeta> {
        match self {
            MessageMeta::Generated(meta) => Some(meta),
            MessageMeta::Opaque(_) => None,
        }
    }
}

impl Default for MessageMeta {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single entry in the session message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<FileRef>,
    #[serde(default)]
    pub metadata: MessageMeta,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
            metadata: MessageMeta::empty(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: MessageMeta) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach file references
    pub fn with_attachments(mut self, attachments: Vec<FileRef>) -> Self {
        self.attachments = attachments;
        self
    }
}
