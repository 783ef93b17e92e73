//! Latest-bundle extraction from the conversation log

use crate::message::{Message, Role, Validation};
use std::collections::BTreeMap;

/// Sentinel slug used when the generating message does not carry one
pub const DEFAULT_SLUG: &str = "agent-bundle";

/// The most recent set of generated files found in a message log.
///
/// Derived on every call and never persisted independently; the message log
/// stays the single source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBundle {
    /// Relative path to text content, keys unique
    pub files: BTreeMap<String, String>,
    /// Download name for the packaged bundle
    pub slug: String,
    /// Validation outcome reported by the generating run
    pub validation: Validation,
}

/// Scan the log newest-first for the most recent assistant message in the
/// generated phase carrying a non-empty file map.
///
/// Pure and idempotent: the same log always yields the same bundle. Cheap
/// enough to run on every render; logs hold at most hundreds of messages.
pub fn extract_latest(messages: &[Message]) -> Option<GeneratedBundle> {
    messages.iter().rev().find_map(|message| {
        if message.role != Role::Assistant {
            return None;
        }
        let meta = message.metadata.as_generated()?;
        if meta.files.is_empty() {
            return None;
        }
        Some(GeneratedBundle {
            files: meta.files.clone(),
            slug: meta
                .slug
                .clone()
                .filter(|slug| !slug.is_empty())
                .unwrap_or_else(|| DEFAULT_SLUG.to_string()),
            validation: meta.validation.clone().unwrap_or_default(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{GeneratedMeta, GeneratedPhase, MessageMeta};

    fn generated(files: &[(&str, &str)], slug: Option<&str>) -> MessageMeta {
        MessageMeta::Generated(GeneratedMeta {
            phase: GeneratedPhase::Generated,
            files: files
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect(),
            slug: slug.map(String::from),
            validation: None,
        })
    }

    #[test]
    fn test_empty_log_has_no_bundle() {
        assert!(extract_latest(&[]).is_none());
    }

    #[test]
    fn test_plain_conversation_has_no_bundle() {
        let log = vec![Message::user("hi"), Message::assistant("hello")];
        assert!(extract_latest(&log).is_none());
    }

    #[test]
    fn test_extracts_generated_files() {
        let log = vec![
            Message::user("build me an agent"),
            Message::assistant("here you go")
                .with_metadata(generated(&[("agent.py", "pass")], Some("my-agent"))),
        ];

        let bundle = extract_latest(&log).unwrap();
        assert_eq!(bundle.slug, "my-agent");
        assert_eq!(bundle.files["agent.py"], "pass");
    }

    #[test]
    fn test_most_recent_bundle_wins() {
        let log = vec![
            Message::assistant("v1").with_metadata(generated(&[("a.py", "v1")], Some("first"))),
            Message::user("try again"),
            Message::assistant("v2").with_metadata(generated(&[("a.py", "v2")], Some("second"))),
        ];

        let bundle = extract_latest(&log).unwrap();
        assert_eq!(bundle.slug, "second");
        assert_eq!(bundle.files["a.py"], "v2");
    }

    #[test]
    fn test_user_authored_generated_metadata_is_ignored() {
        let log = vec![
            Message::assistant("real").with_metadata(generated(&[("a.py", "real")], None)),
            Message::user("spoofed").with_metadata(generated(&[("a.py", "spoofed")], None)),
        ];

        let bundle = extract_latest(&log).unwrap();
        assert_eq!(bundle.files["a.py"], "real");
    }

    #[test]
    fn test_empty_file_map_does_not_qualify() {
        let log = vec![
            Message::assistant("old").with_metadata(generated(&[("a.py", "kept")], None)),
            Message::assistant("empty").with_metadata(generated(&[], None)),
        ];

        // The empty bundle is skipped; the scan continues to the older one
        let bundle = extract_latest(&log).unwrap();
        assert_eq!(bundle.files["a.py"], "kept");
    }

    #[test]
    fn test_slug_defaults_to_sentinel() {
        let log = vec![Message::assistant("x").with_metadata(generated(&[("a", "b")], None))];
        assert_eq!(extract_latest(&log).unwrap().slug, DEFAULT_SLUG);

        let log = vec![Message::assistant("x").with_metadata(generated(&[("a", "b")], Some("")))];
        assert_eq!(extract_latest(&log).unwrap().slug, DEFAULT_SLUG);
    }

    #[test]
    fn test_validation_defaults_when_absent() {
        let log = vec![Message::assistant("x").with_metadata(generated(&[("a", "b")], None))];
        let bundle = extract_latest(&log).unwrap();

        assert!(!bundle.validation.valid);
        assert!(bundle.validation.errors.is_empty());
        assert!(bundle.validation.warnings.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let log = vec![
            Message::user("go"),
            Message::assistant("done")
                .with_metadata(generated(&[("main.py", "print(1)")], Some("bot"))),
        ];

        let first = extract_latest(&log).unwrap();
        let second = extract_latest(&log).unwrap();
        assert_eq!(first, second);
    }
}
