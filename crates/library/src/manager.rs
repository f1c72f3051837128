//! The ordered book collection and its persistence

use crate::error::{LibraryError, LibraryResult};
use crate::filter::LibraryFilter;
use crate::seed::seed_books;
use crate::store::KeyValueStore;
use std::collections::HashSet;
use std::sync::Arc;
use voxlibre_config::LibraryConfig;
use voxlibre_core::{Book, BookId, LibraryStats, Validator};

/// Ordered collection of books, mirrored to a key-value cache
///
/// Every mutation writes the whole collection under one key. A mutation
/// whose write fails leaves the in-memory collection unchanged.
pub struct Library {
    store: Arc<dyn KeyValueStore>,
    key: String,
    books: Vec<Book>,
}

impl Library {
    /// Loads the collection stored under `key`
    ///
    /// A missing entry yields the seed catalogue (persisted immediately) or
    /// an empty library. An unreadable entry is reported and replaced by the
    /// seed in memory only.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        seed_when_missing: bool,
    ) -> LibraryResult<Self> {
        let key = key.into();

        let library = match store.get(&key)? {
            None if seed_when_missing => {
                log::info!("No cached library under '{}'; using the seed catalogue", key);
                let library = Self {
                    store,
                    key,
                    books: seed_books(),
                };
                library.save(&library.books)?;
                library
            }
            None => Self {
                store,
                key,
                books: Vec::new(),
            },
            Some(raw) => {
                let books = match serde_json::from_str::<Vec<Book>>(&raw) {
                    Ok(books) => dedupe(books),
                    Err(e) => {
                        log::warn!("Cached library under '{}' is unreadable ({}); using the seed catalogue", key, e);
                        seed_books()
                    }
                };
                Self { store, key, books }
            }
        };

        log::debug!("Library loaded with {} books", library.books.len());
        Ok(library)
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &LibraryConfig) -> LibraryResult<Self> {
        Self::load(store, config.storage_key.clone(), config.seed_when_missing)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id == *id)
    }

    /// Adds a book at the front
    pub fn prepend(&mut self, book: Book) -> LibraryResult<()> {
        book.validate()
            .map_err(|errors| LibraryError::InvalidBook(errors.join("; ")))?;
        if self.get(&book.id).is_some() {
            return Err(LibraryError::DuplicateId(book.id.to_string()));
        }

        let mut next = Vec::with_capacity(self.books.len() + 1);
        next.push(book);
        next.extend(self.books.iter().cloned());
        self.commit(next)
    }

    /// Replaces the book with the same id, keeping its position
    pub fn update(&mut self, book: Book) -> LibraryResult<()> {
        book.validate()
            .map_err(|errors| LibraryError::InvalidBook(errors.join("; ")))?;
        let index = self.position(&book.id)?;

        let mut next = self.books.clone();
        next[index] = book;
        self.commit(next)
    }

    pub fn remove(&mut self, id: &BookId) -> LibraryResult<Book> {
        let index = self.position(id)?;

        let mut next = self.books.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        log::info!("Removed '{}' from the library", removed.title);
        Ok(removed)
    }

    /// Books matching `filter`, in library order
    pub fn filter(&self, filter: &LibraryFilter) -> Vec<&Book> {
        self.books.iter().filter(|b| filter.matches(b)).collect()
    }

    /// Distinct categories in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.books
            .iter()
            .map(|b| b.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            total_books: self.books.len(),
            generated_books: self.books.iter().filter(|b| b.is_generated()).count(),
            narratable_books: self.books.iter().filter(|b| b.has_narration()).count(),
            narratable_words: self.books.iter().map(|b| b.word_count()).sum(),
            categories: self.categories().len(),
        }
    }

    fn position(&self, id: &BookId) -> LibraryResult<usize> {
        self.books
            .iter()
            .position(|b| b.id == *id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    fn commit(&mut self, next: Vec<Book>) -> LibraryResult<()> {
        self.save(&next)?;
        self.books = next;
        Ok(())
    }

    fn save(&self, books: &[Book]) -> LibraryResult<()> {
        let json = serde_json::to_string(books)?;
        self.store.set(&self.key, &json)
    }
}

/// Drops later entries whose id was already seen
fn dedupe(books: Vec<Book>) -> Vec<Book> {
    let mut seen = HashSet::new();
    books
        .into_iter()
        .filter(|book| {
            let fresh = seen.insert(book.id.clone());
            if !fresh {
                log::warn!("Dropping duplicate cached book id {}", book.id);
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const KEY: &str = "voxlibre_library";

    fn seeded() -> (Arc<MemoryStore>, Library) {
        let store = Arc::new(MemoryStore::new());
        let library = Library::load(store.clone(), KEY, true).unwrap();
        (store, library)
    }

    fn generated(id: &str) -> Book {
        let mut book = Book::new(id, "The Glass Orchard", "Studio", "AI Generated")
            .with_content("Fruit of glass rang in the wind.");
        book.is_generated = Some(true);
        book.rating = 5.0;
        book
    }

    #[test]
    fn test_missing_entry_seeds_and_persists() {
        let (store, library) = seeded();
        assert_eq!(library.len(), 4);
        assert!(store.get(KEY).unwrap().is_some());
    }

    #[test]
    fn test_missing_entry_without_seed_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let library = Library::load(store.clone(), KEY, false).unwrap();
        assert!(library.is_empty());
        assert!(store.get(KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_entry_falls_back_to_seed() {
        let store = Arc::new(MemoryStore::with_entry(KEY, "{not json"));
        let library = Library::load(store.clone(), KEY, true).unwrap();
        assert_eq!(library.len(), 4);
        // The unreadable value is left alone until the next mutation
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_duplicate_cached_ids_are_dropped() {
        let raw = r#"[
            {"id":"7","title":"First","author":"A","description":"","coverUrl":"","category":"Fiction","duration":"1h","rating":4.0},
            {"id":"7","title":"Second","author":"B","description":"","coverUrl":"","category":"Fiction","duration":"1h","rating":4.0}
        ]"#;
        let store = Arc::new(MemoryStore::with_entry(KEY, raw));
        let library = Library::load(store, KEY, true).unwrap();

        assert_eq!(library.len(), 1);
        assert_eq!(library.books()[0].title, "First");
    }

    #[test]
    fn test_prepend_puts_book_first_and_persists() {
        let (store, mut library) = seeded();
        library.prepend(generated("100")).unwrap();

        assert_eq!(library.books()[0].id.as_str(), "100");
        let reloaded = Library::load(store, KEY, true).unwrap();
        assert_eq!(reloaded.books()[0].id.as_str(), "100");
        assert_eq!(reloaded.len(), 5);
    }

    #[test]
    fn test_prepend_rejects_duplicates_and_invalid_books() {
        let (_store, mut library) = seeded();
        assert!(matches!(
            library.prepend(generated("1")),
            Err(LibraryError::DuplicateId(_))
        ));

        let mut bad = generated("200");
        bad.title.clear();
        assert!(matches!(library.prepend(bad), Err(LibraryError::InvalidBook(_))));
        assert_eq!(library.len(), 4);
    }

    #[test]
    fn test_update_keeps_position() {
        let (_store, mut library) = seeded();
        let mut book = library.get(&BookId::from("3")).cloned().unwrap();
        book.rating = 3.5;

        library.update(book).unwrap();
        assert_eq!(library.books()[2].rating, 3.5);

        let missing = Book::new("999", "Nowhere", "Nobody", "Fiction");
        assert!(matches!(library.update(missing), Err(LibraryError::NotFound(_))));
    }

    #[test]
    fn test_remove() {
        let (_store, mut library) = seeded();
        let removed = library.remove(&BookId::from("4")).unwrap();
        assert_eq!(removed.title, "Dune");
        assert!(library.get(&BookId::from("4")).is_none());
        assert!(library.remove(&BookId::from("4")).is_err());
    }

    #[test]
    fn test_stats() {
        let (_store, mut library) = seeded();
        library.prepend(generated("100")).unwrap();

        let stats = library.stats();
        assert_eq!(stats.total_books, 5);
        assert_eq!(stats.generated_books, 1);
        assert_eq!(stats.narratable_books, 1);
        assert_eq!(stats.narratable_words, 7);
        assert_eq!(stats.categories, 5);
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        let (_store, library) = seeded();
        assert_eq!(
            library.categories(),
            vec!["Fiction", "Sci-Fi", "Self-Help", "Classic Sci-Fi"]
        );
    }
}
