//! Library statistics

use serde::{Deserialize, Serialize};

/// Library-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_books: usize,
    pub generated_books: usize,
    /// Books with narration text
    pub narratable_books: usize,
    /// Words across all narration text
    pub narratable_words: usize,
    /// Distinct categories in use
    pub categories: usize,
}

impl LibraryStats {
    /// Creates empty statistics
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the percentage of books produced by the studio
    pub fn generated_percentage(&self) -> f64 {
        if self.total_books == 0 {
            return 0.0;
        }
        (self.generated_books as f64 / self.total_books as f64) * 100.0
    }
}
