//! # Topic
//!
//! The subject of one article request.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScribeError;

const FILENAME_RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// A validated, non-blank article subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Validate a raw topic. Surrounding whitespace is dropped; nothing else is touched.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ScribeError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ScribeError::InvalidInput(
                "Please enter a topic to generate an article.".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased topic with every whitespace character replaced by `_`.
    /// Path separators and other characters file systems reject become `_`
    /// too, so the stem is always a single path component.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_whitespace() || c.is_control() || FILENAME_RESERVED.contains(&c) {
                    '_'
                } else {
                    c
                }
            })
            .collect::<String>()
            .to_lowercase()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Topic {
    type Error = ScribeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::parse(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        let topic = Topic::parse("AI in Healthcare").unwrap();
        assert_eq!(topic.file_stem(), "ai_in_healthcare");
    }

    #[test]
    fn test_file_stem_tabs_and_newlines() {
        let topic = Topic::parse("Rust\tAsync  IO").unwrap();
        assert_eq!(topic.file_stem(), "rust_async__io");
    }

    #[test]
    fn test_file_stem_is_one_path_component() {
        for raw in ["../x", "a/b", "c:\\temp\\notes", "Why? <Really>"] {
            let stem = Topic::parse(raw).unwrap().file_stem();
            let path = std::path::Path::new("out").join(format!("{}_article.md", stem));
            assert_eq!(path.parent(), Some(std::path::Path::new("out")), "{}", raw);
        }
        assert_eq!(Topic::parse("../x").unwrap().file_stem(), ".._x");
        assert_eq!(Topic::parse("a/b").unwrap().file_stem(), "a_b");
    }

    #[test]
    fn test_empty_topic_rejected() {
        assert!(matches!(Topic::parse(""), Err(ScribeError::InvalidInput(_))));
        assert!(matches!(
            Topic::parse("   \n"),
            Err(ScribeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let topic = Topic::parse("  Climate Change Solutions ").unwrap();
        assert_eq!(topic.as_str(), "Climate Change Solutions");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Topic = serde_json::from_str("\"Digital Marketing\"").unwrap();
        assert_eq!(ok.as_str(), "Digital Marketing");
        assert!(serde_json::from_str::<Topic>("\"\"").is_err());
    }
}
