//! VoxLibre Library Management
//!
//! The ordered book collection, its search filter and the key-value cache
//! it is persisted to.

pub mod error;
pub mod filter;
pub mod manager;
pub mod seed;
pub mod store;

pub use error::{LibraryError, LibraryResult};
pub use filter::LibraryFilter;
pub use manager::Library;
pub use seed::seed_books;
pub use store::{FileStore, KeyValueStore, MemoryStore};
