use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteTableError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query returned no rows: {0}")]
    EmptyResult(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

/// Coarse classification of a failure, for callers that only need to branch on the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The driver rejected or failed the statement. Always logged.
    Driver,
    /// The operation never reached the driver (worker gone, reply dropped). Not logged.
    Invocation,
    /// A multi-row read succeeded but matched nothing.
    EmptyResult,
}

impl SqliteTableError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqliteTableError::ConnectionError(_) => ErrorKind::Invocation,
            SqliteTableError::EmptyResult(_) => ErrorKind::EmptyResult,
            _ => ErrorKind::Driver,
        }
    }
}
