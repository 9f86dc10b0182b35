use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqliteTableError;
use crate::table::MissingColumn;

use super::database::Database;

/// Options for opening a [`Database`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseOptions {
    /// Database file path; `:memory:` opens a private in-memory database.
    pub db_path: String,
    /// How long SQLite waits on a locked database before reporting `SQLITE_BUSY`.
    #[serde(default)]
    pub busy_timeout: Option<Duration>,
    /// What batch insert writes for a column a row does not have.
    #[serde(default)]
    pub missing_column: MissingColumn,
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: None,
            missing_column: MissingColumn::default(),
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_missing_column(mut self, missing_column: MissingColumn) -> Self {
        self.missing_column = missing_column;
        self
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_path == ":memory:" || self.db_path.starts_with("file::memory:")
    }

    /// Reject options that can never open.
    ///
    /// # Errors
    /// Returns [`SqliteTableError::ConfigError`] for an empty path.
    pub fn validate(&self) -> Result<(), SqliteTableError> {
        if self.db_path.trim().is_empty() {
            return Err(SqliteTableError::ConfigError(
                "database path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`DatabaseOptions`].
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: DatabaseOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn missing_column(mut self, missing_column: MissingColumn) -> Self {
        self.opts.missing_column = missing_column;
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Open a [`Database`] with these options.
    ///
    /// # Errors
    ///
    /// Returns `SqliteTableError` if the options are invalid or the file cannot be opened.
    pub async fn open(self) -> Result<Database, SqliteTableError> {
        Database::open_with(self.finish()).await
    }
}
