use uuid::Uuid;

/// Custom error type for the bookmarkd library
///
/// Using `thiserror` for automatic `Error` trait implementation and
/// `From` conversions. `NotFound` and `Conflict` are expected outcomes
/// that callers branch on, not failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database-related errors (SQLite)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No record exists for the requested id
    #[error("Bookmark {} not found", .0.simple())]
    NotFound(Uuid),

    /// A URI update landed on an id already occupied by another record
    #[error("URI '{uri}' is already bookmarked under {}", .existing.simple())]
    Conflict { uri: String, existing: Uuid },

    /// Malformed identifier string, rejected before reaching the store
    #[error("Invalid bookmark id: '{0}'")]
    InvalidId(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error for cases that don't fit other categories
    #[error("{0}")]
    Other(String),
}

/// Result type alias using Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
