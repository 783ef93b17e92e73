//! Generated-file bundles
//!
//! The agent-creator flow embeds generated files in message metadata. This
//! module reconstructs the most recent bundle from the conversation log and
//! packages it into a downloadable archive, entirely client-side.

mod archive;
mod extractor;

pub use archive::{build_archive, crc32};
pub use extractor::{extract_latest, GeneratedBundle, DEFAULT_SLUG};
