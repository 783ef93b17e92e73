//! Agentdeck error types
//!
//! Nothing here is fatal to the process: every failure resolves to a
//! recoverable state (loading cleared, error string surfaced) that lets the
//! user retry.

use thiserror::Error;

/// Agentdeck error type
#[derive(Error, Debug)]
pub enum Error {
    /// Structured failure returned by the agent backend; the message is the
    /// server-supplied error string, surfaced verbatim
    #[error("{0}")]
    Api(String),

    /// Asynchronous job reached `failed` or `cancelled`
    #[error("{0}")]
    Job(String),

    /// Job polling exhausted its attempt budget
    #[error("Timed out waiting for the agent after {0} status checks")]
    Timeout(u32),

    /// Operation aborted by a cancellation token (view teardown)
    #[error("Operation cancelled")]
    Cancelled,

    /// Transport failure: the request could not be completed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for agentdeck operations
pub type Result<T> = std::result::Result<T, Error>;
