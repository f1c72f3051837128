//! Library categories
//!
//! Categories are an open set of strings. These are the ones the shell
//! offers in its selector.

/// Matches every book when used as a filter
pub const ALL: &str = "All";

/// Category assigned to books produced by the studio
pub const AI_GENERATED: &str = "AI Generated";

/// Selector order
pub const CATEGORIES: [&str; 7] = [
    ALL,
    "Fiction",
    "Sci-Fi",
    "Non-Fiction",
    "History",
    "Self-Help",
    AI_GENERATED,
];

/// Returns true if `category` is the catch-all filter
pub fn is_all(category: &str) -> bool {
    category == ALL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_starts_with_all() {
        assert_eq!(CATEGORIES[0], ALL);
        assert!(CATEGORIES.contains(&AI_GENERATED));
    }

    #[test]
    fn test_is_all_is_exact() {
        assert!(is_all("All"));
        assert!(!is_all("all"));
    }
}
