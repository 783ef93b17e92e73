//! Agentdeck - client runtime for operating AI agents
//!
//! Agentdeck is the interaction runtime behind an agent operations console.
//! It turns a chat action into a request against an agent backend that may
//! answer synchronously, asynchronously via a polled job, or incrementally
//! over a duplex channel, and it reconstructs generated file bundles from
//! the conversation log for download — without any server-side archiving
//! endpoint.
//!
//! ## Architecture
//!
//! ```text
//! UI action
//!    │
//!    ▼
//! ┌──────────────────────┐   sync    ┌─────────────────────┐
//! │  SessionController   │──────────▶│ AgentBackend (HTTP) │
//! │  - message log       │   async   ├─────────────────────┤
//! │  - loading/progress  │──────────▶│ create job          │
//! │  - error surface     │           │   └─▶ JobPoller ────┤
//! └──────────┬───────────┘           └─────────────────────┘
//!            │ reads
//!            ▼
//! ┌──────────────────────┐           ┌─────────────────────┐
//! │ bundle::extract_latest│          │   DuplexChannel     │
//! │ bundle::build_archive │          │ push: job progress, │
//! └──────────────────────┘           │ streamed content    │
//!                                    └─────────────────────┘
//! ```
//!
//! The poller is the completion authority for async sends; duplex-channel
//! frames only feed display state. CRUD screens, theming, and i18n live
//! outside this crate and render against the controller's surface.
//!
//! ## Modules
//!
//! - [`session`]: the orchestrator owning the message log
//! - [`api`]: backend contract and HTTP implementation
//! - [`job`]: asynchronous job model and polling loop
//! - [`channel`]: persistent duplex connection with reconnection
//! - [`bundle`]: artifact extraction and archive packaging
//! - [`message`]: the conversation data model
//! - [`config`]: configuration management

pub mod api;
pub mod bundle;
pub mod channel;
pub mod config;
pub mod error;
pub mod job;
pub mod message;
pub mod session;

pub use config::AgentdeckConfig;
pub use error::{Error, Result};
