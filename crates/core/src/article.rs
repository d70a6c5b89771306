//! # Article
//!
//! The final text of a successful run and the summary shown under it.

use serde::Serialize;

use crate::topic::Topic;

/// Final article. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleResult {
    pub topic: Topic,
    pub raw: String,
    /// Length of `raw` in characters
    pub char_count: usize,
}

impl ArticleResult {
    pub fn new(topic: Topic, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let char_count = raw.chars().count();
        Self {
            topic,
            raw,
            char_count,
        }
    }

    pub fn details(&self) -> ArticleDetails {
        ArticleDetails {
            topic: self.topic.to_string(),
            generated_by: "Planner / Writer / Editor crew".to_string(),
            format: "Blog-style (Markdown converted to styled HTML)".to_string(),
            length: format!("{} characters", group_thousands(self.char_count)),
        }
    }
}

/// "Article Details" panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleDetails {
    pub topic: String,
    pub generated_by: String,
    pub format: String,
    pub length: String,
}

/// `12345` → `12,345`
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
