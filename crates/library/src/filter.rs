//! Search and category filtering

use voxlibre_core::{category, Book};

/// Text query plus category
///
/// The query matches title or author case-insensitively; the category must
/// match exactly unless it is "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    query: String,
    category: Option<String>,
}

impl LibraryFilter {
    /// Matches every book
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl AsRef<str>) -> Self {
        self.query = query.as_ref().to_lowercase();
        self
    }

    pub fn with_category(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.category = if category::is_all(&name) { None } else { Some(name) };
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(category::ALL)
    }

    pub fn matches(&self, book: &Book) -> bool {
        let text_match = self.query.is_empty()
            || book.title.to_lowercase().contains(&self.query)
            || book.author.to_lowercase().contains(&self.query);

        let category_match = self
            .category
            .as_ref()
            .map(|c| *c == book.category)
            .unwrap_or(true);

        text_match && category_match
    }
}
