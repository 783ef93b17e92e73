//! Transport-agnostic agent backend API
//!
//! The runtime talks to an agent backend through the [`AgentBackend`] trait;
//! [`HttpBackend`] is the production implementation. Tests substitute
//! scripted backends at the same seam.

mod client;
mod types;

pub use client::{AgentBackend, HttpBackend, GENERIC_SEND_ERROR};
pub use types::{ErrorBody, ErrorDetail, JobCreated, SendRequest, SendResponse, SessionHistory};
