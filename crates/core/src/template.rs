//! # Prompt Templates
//!
//! Persona and task texts carry `{topic}` substitution points. Registries
//! hold them unbound; the crew binds them once per run.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::topic::Topic;

/// Marker replaced by the topic when a template is bound.
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").expect("valid regex"))
}

/// An unbound prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Substitute every `{topic}` with the topic text.
    pub fn bind(&self, topic: &Topic) -> String {
        self.0.replace(TOPIC_PLACEHOLDER, topic.as_str())
    }

    /// Placeholders present in this template, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        placeholder_pattern()
            .find_iter(&self.0)
            .map(|m| m.as_str())
            .collect()
    }
}

/// True when `text` still contains a `{name}` style placeholder.
pub fn has_unbound_placeholder(text: &str) -> bool {
    placeholder_pattern().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_replaces_every_occurrence() {
        let template = Template::new("Plan content on {topic}. Focus: {topic}.");
        let topic = Topic::parse("Quantum Computing").unwrap();
        let bound = template.bind(&topic);
        assert_eq!(bound, "Plan content on Quantum Computing. Focus: Quantum Computing.");
        assert!(!has_unbound_placeholder(&bound));
    }

    #[test]
    fn test_topic_with_braces_kept_verbatim() {
        let template = Template::new("Write about {topic}");
        let topic = Topic::parse("the {weird} topic").unwrap();
        assert!(template.bind(&topic).contains("the {weird} topic"));
    }

    #[test]
    fn test_placeholders_listed() {
        let template = Template::new("{topic} and {topic}");
        assert_eq!(template.placeholders(), vec!["{topic}", "{topic}"]);
        assert!(Template::new("no markers").placeholders().is_empty());
    }
}
