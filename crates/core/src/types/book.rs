//! Book domain model

use crate::types::{Timestamp, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a book within the library
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Wraps an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an identifier from the current time in milliseconds
    pub fn generate() -> Self {
        Self(Timestamp::now().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A library entry
///
/// `content` holds the full narration text. Entries without it cannot
/// produce real audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Data URI or remote URL
    pub cover_url: String,
    pub category: String,
    /// Display string such as "9h 12m"; never parsed
    pub duration: String,
    pub rating: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_generated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Book {
    /// Creates a book with the required catalogue fields
    pub fn new(
        id: impl Into<BookId>,
        title: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            description: String::new(),
            cover_url: String::new(),
            category: category.into(),
            duration: String::new(),
            rating: 0.0,
            is_generated: None,
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Returns the narration text if it contains anything besides whitespace
    pub fn narration(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub fn has_narration(&self) -> bool {
        self.narration().is_some()
    }

    pub fn is_generated(&self) -> bool {
        self.is_generated.unwrap_or(false)
    }

    pub fn word_count(&self) -> usize {
        self.narration()
            .map(|text| text.split_whitespace().count())
            .unwrap_or(0)
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.as_str().trim().is_empty() {
            errors.push("Id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if !(0.0..=5.0).contains(&self.rating) {
            errors.push("Rating must be between 0 and 5".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
