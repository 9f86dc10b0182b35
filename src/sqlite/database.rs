use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::mpsc;

use crate::error::{ErrorKind, SqliteTableError};
use crate::query_builder::{build_drop, build_truncate};
use crate::results::{Row, decode_row, decode_rows};
use crate::table::Table;

use super::config::{DatabaseOptions, DatabaseOptionsBuilder};
use super::prepared::PreparedStatement;
use super::worker::{RowOutcome, SqliteWorker};

/// An open SQLite database.
///
/// Every operation comes in two flavours:
/// - `try_*` returns a `Result` whose error can be inspected with [`SqliteTableError::kind`];
/// - the plain name "fails soft", returning `None`/`false` on any failure.
///
/// Driver errors are logged once through `tracing` (component, error and query) whichever
/// flavour is used. Invocation failures and empty results are not logged.
pub struct Database {
    worker: SqliteWorker,
    options: DatabaseOptions,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("db_path", &self.options.db_path)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open or create the database file at `path`.
    ///
    /// # Errors
    /// Returns `SqliteTableError` if the file cannot be opened or the worker thread cannot start.
    pub async fn open(path: impl Into<String>) -> Result<Self, SqliteTableError> {
        Self::open_with(DatabaseOptions::new(path)).await
    }

    /// Open with explicit options.
    ///
    /// # Errors
    /// Returns `SqliteTableError::ConfigError` for invalid options, or the driver error if the
    /// file cannot be opened.
    pub async fn open_with(options: DatabaseOptions) -> Result<Self, SqliteTableError> {
        options.validate()?;
        let worker = SqliteWorker::open(&options).await?;
        Ok(Self { worker, options })
    }

    #[must_use]
    pub fn builder(path: impl Into<String>) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(path)
    }

    #[must_use]
    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.options.db_path
    }

    /// A handle scoped to one table. It borrows the database and cannot outlive it.
    #[must_use]
    pub fn table(&self, name: impl Into<String>) -> Table<'_> {
        Table::new(self, name)
    }

    pub(crate) fn worker(&self) -> &SqliteWorker {
        &self.worker
    }

    /// First row of `query`, decoded. `Ok(None)` when nothing matched.
    ///
    /// # Errors
    /// Returns the driver error (logged) or an invocation error.
    pub async fn try_get(&self, query: &str) -> Result<Option<Row>, SqliteTableError> {
        tracing::debug!(query, "get");
        let outcome = self
            .worker
            .get(query.to_owned())
            .await
            .map(|row| row.map(decode_row));
        observe("SQLite Get Error", query, outcome)
    }

    /// Fail-soft [`Database::try_get`]: `None` on failure or when nothing matched.
    pub async fn get(&self, query: &str) -> Option<Row> {
        self.try_get(query).await.ok().flatten()
    }

    /// Every row of `query`, decoded, in result order.
    ///
    /// # Errors
    /// Returns [`SqliteTableError::EmptyResult`] when the query matched nothing, the driver
    /// error (logged), or an invocation error.
    pub async fn try_all(&self, query: &str) -> Result<Vec<Row>, SqliteTableError> {
        tracing::debug!(query, "all");
        let outcome = self
            .worker
            .all(query.to_owned())
            .await
            .and_then(|rows| {
                if rows.is_empty() {
                    Err(SqliteTableError::EmptyResult(query.to_owned()))
                } else {
                    Ok(decode_rows(rows))
                }
            });
        observe("SQLite All Error", query, outcome)
    }

    /// Fail-soft [`Database::try_all`]. An empty result is `None`, same as a failure.
    pub async fn all(&self, query: &str) -> Option<Vec<Row>> {
        self.try_all(query).await.ok()
    }

    /// Execute any single statement; yields the number of rows changed.
    ///
    /// Row-returning statements are stepped to completion and yield the rows stepped, so
    /// `PRAGMA journal_mode=WAL` or `SELECT` succeed here too.
    ///
    /// # Errors
    /// Returns the driver error (logged) or an invocation error.
    pub async fn try_run(&self, query: &str) -> Result<usize, SqliteTableError> {
        tracing::debug!(query, "run");
        let outcome = self.worker.run(query.to_owned()).await;
        observe("SQLite Run Error", query, outcome)
    }

    /// Fail-soft [`Database::try_run`].
    pub async fn run(&self, query: &str) -> bool {
        self.try_run(query).await.is_ok()
    }

    /// Stream the rows of `query` to `handler`, decoding each before it is handed over.
    ///
    /// Returns the number of rows delivered.
    ///
    /// # Errors
    /// Returns the driver error (logged) or an invocation error. Rows delivered before a
    /// mid-stream failure stay delivered.
    pub async fn try_each<F>(&self, query: &str, mut handler: F) -> Result<usize, SqliteTableError>
    where
        F: FnMut(Row),
    {
        tracing::debug!(query, "each");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let done = self.worker.each(query.to_owned(), tx)?;
        while let Some(row) = rx.recv().await {
            handler(decode_row(row));
        }
        let outcome = done.await.unwrap_or_else(|_| {
            Err(SqliteTableError::ConnectionError(
                "SQLite worker dropped while streaming rows".into(),
            ))
        });
        observe("SQLite Each Error", query, outcome)
    }

    /// Fail-soft [`Database::try_each`].
    pub async fn each<F>(&self, query: &str, handler: F) -> bool
    where
        F: FnMut(Row),
    {
        self.try_each(query, handler).await.is_ok()
    }

    /// `DROP TABLE IF EXISTS`.
    ///
    /// # Errors
    /// Returns the driver error (logged) or an invocation error.
    pub async fn try_drop_table(&self, table: &str) -> Result<(), SqliteTableError> {
        let query = build_drop(table);
        let outcome = self.worker.run(query.clone()).await.map(|_| ());
        observe(&format!("SQLite Drop '{table}' Table Error"), &query, outcome)
    }

    /// Fail-soft [`Database::try_drop_table`].
    pub async fn drop_table(&self, table: &str) -> bool {
        self.try_drop_table(table).await.is_ok()
    }

    /// Delete every row of `table`, then reset its autoincrement sequence.
    ///
    /// The sequence reset is best effort; only the delete decides the outcome. Yields the
    /// number of rows deleted.
    ///
    /// # Errors
    /// Returns the driver error of the delete (logged) or an invocation error.
    pub async fn try_truncate(&self, table: &str) -> Result<usize, SqliteTableError> {
        let (query, _) = build_truncate(table);
        let outcome = self.worker.truncate(table.to_owned()).await;
        observe(&format!("SQLite Truncate '{table}' Table Error"), &query, outcome)
    }

    /// Fail-soft [`Database::try_truncate`].
    pub async fn truncate(&self, table: &str) -> bool {
        self.try_truncate(table).await.is_ok()
    }

    /// Prepare `query` once for repeated execution with bound parameters.
    ///
    /// # Errors
    /// Returns the driver error (logged) if the statement does not compile.
    pub async fn prepare(&self, query: &str) -> Result<PreparedStatement<'_>, SqliteTableError> {
        let shared = Arc::new(query.to_owned());
        let outcome = self.worker.prepare_statement(Arc::clone(&shared)).await;
        observe("SQLite Prepare Error", query, outcome)?;
        Ok(PreparedStatement::new(self, shared))
    }

    /// Run synchronous `rusqlite` code against the underlying connection.
    ///
    /// # Errors
    /// Propagates the closure's error, or an invocation error if the worker is gone.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqliteTableError>
    where
        F: FnOnce(&mut Connection) -> Result<R, SqliteTableError> + Send + 'static,
        R: Send + 'static,
    {
        self.worker.with_connection(func).await
    }

    /// Close the connection and delete the database file.
    ///
    /// Consumes the handle. Returns whether a file was deleted; in-memory databases and
    /// missing files yield `false`.
    ///
    /// # Errors
    /// Returns the driver error if closing fails, or an I/O error if the file cannot be removed.
    pub async fn remove_db(self) -> Result<bool, SqliteTableError> {
        self.worker.close().await?;
        if self.options.is_memory() {
            return Ok(false);
        }
        let path = Path::new(&self.options.db_path);
        if !tokio::fs::try_exists(path).await? {
            return Ok(false);
        }
        tokio::fs::remove_file(path).await?;
        tracing::debug!(path = %self.options.db_path, "database file removed");
        Ok(true)
    }

    pub(crate) async fn insert_batch(
        &self,
        query: &str,
        rows: Vec<Vec<rusqlite::types::Value>>,
    ) -> Result<Vec<RowOutcome>, SqliteTableError> {
        tracing::debug!(query, rows = rows.len(), "insert");
        let outcome = self.worker.insert_batch(query.to_owned(), rows).await;
        observe("SQLite Insert Error", query, outcome)
    }
}

/// Apply the logging policy: driver errors are reported once, everything else passes silently.
pub(crate) fn observe<T>(
    component: &str,
    query: &str,
    outcome: Result<T, SqliteTableError>,
) -> Result<T, SqliteTableError> {
    if let Err(err) = &outcome {
        log_failure(component, query, err);
    }
    outcome
}

pub(crate) fn log_failure(component: &str, query: &str, err: &SqliteTableError) {
    if err.kind() == ErrorKind::Driver {
        tracing::error!(component, query, error = %err, "{component}");
    }
}
