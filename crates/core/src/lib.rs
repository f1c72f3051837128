//! Core domain types shared by every VoxLibre crate

pub mod types;

pub use types::category;
pub use types::{
    Book, BookId, Duration, LibraryStats, PlaybackState, Timestamp, Validator, DEFAULT_VOLUME,
};
