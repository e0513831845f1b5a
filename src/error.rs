use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, WordCardError>;

/// Enum representing all possible errors in the wordcard library.
///
/// The `Display` text of each variant is what reaches `ErrorOccurred`
/// listeners, so the wording of the lookup variants is part of the API.
#[derive(Error, Debug)]
pub enum WordCardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database file not found")]
    DatabaseNotFound,

    #[error("Data directory not found or could not be determined")]
    DataDirNotFound,

    /// The driver refused to open the file. Carries the driver text only.
    #[error("{0}")]
    Open(rusqlite::Error),

    /// The table catalog query itself failed.
    #[error("{0}")]
    SchemaProbe(rusqlite::Error),

    #[error("Database table 'entries' not found")]
    SchemaMissing,

    #[error("Database not opened")]
    NotOpened,

    /// A read against `entries` failed.
    #[error("{0}")]
    Query(#[from] rusqlite::Error),

    #[error("Failed to parse data: {0}")]
    ParseError(String),
}
