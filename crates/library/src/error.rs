use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Book not found: {0}")]
    NotFound(String),

    #[error("A book with id {0} already exists")]
    DuplicateId(String),

    #[error("Invalid book: {0}")]
    InvalidBook(String),

    /// The key-value cache rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
