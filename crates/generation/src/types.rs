//! Request and result types shared by generation clients

use serde::{Deserialize, Serialize};

/// A story drafted by the text model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    pub author: String,
    pub content: String,
    /// One-sentence hook
    pub description: String,
}

impl StoryDraft {
    /// Names the first required field that came back blank
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("title", &self.title),
            ("author", &self.author),
            ("content", &self.content),
            ("description", &self.description),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}
