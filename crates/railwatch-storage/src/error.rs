/// Errors raised by the storage layer.
///
/// Migration failures are split out from ordinary SQLite errors because
/// the caller treats them differently: a failed startup migration is
/// fatal, a failed runtime insert is not.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An underlying SQLite error.
    #[error("storage: SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema migration could not be applied.
    #[error("storage: migration failed: {0}")]
    Migration(String),

    /// A persisted timestamp could not be interpreted as a UTC instant.
    #[error("storage: invalid timestamp in row {row_id}: {millis}")]
    InvalidTimestamp { row_id: i64, millis: i64 },

    /// A persisted direction code was neither "IN" nor "OUT".
    #[error("storage: invalid direction in row {row_id}: {value}")]
    InvalidDirection { row_id: i64, value: String },
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
