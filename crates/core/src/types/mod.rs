//! Domain types for VoxLibre
//!
//! - `book`: Book and its identifier
//! - `category`: Category constants used by the library filter
//! - `playback`: Transport state published by the engine
//! - `stats`: Library statistics
//! - `common`: Shared traits and utilities

mod book;
pub mod category;
mod common;
mod playback;
mod stats;

pub use book::{Book, BookId};
pub use common::{Duration, Timestamp, Validator};
pub use playback::{PlaybackState, DEFAULT_VOLUME};
pub use stats::LibraryStats;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _ = BookId::new("1");
        let _ = PlaybackState::default();
        let _ = LibraryStats::empty();
        let _ = category::CATEGORIES;
    }
}
