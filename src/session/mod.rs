//! Session orchestration
//!
//! The session controller owns the message log for one chat view and drives
//! message delivery against the agent backend.

mod controller;

pub use controller::SessionController;
