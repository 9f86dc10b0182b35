use std::sync::Arc;

use crate::error::SqliteTableError;
use crate::results::{Row, decode_rows};
use crate::types::Value;

use super::database::{Database, observe};
use super::params::convert_params;

/// Handle to a statement prepared on the database's worker connection.
///
/// Parameters are bound with [`crate::marshal::to_bind_value`]: never quoted, dates and
/// structured values sentinel-encoded. The statement stays in the connection's statement
/// cache until [`PreparedStatement::finalize`] discards it or the cache evicts it.
#[derive(Clone, Debug)]
pub struct PreparedStatement<'db> {
    db: &'db Database,
    query: Arc<String>,
}

impl<'db> PreparedStatement<'db> {
    pub(crate) fn new(db: &'db Database, query: Arc<String>) -> Self {
        Self { db, query }
    }

    /// Execute as a statement returning no rows; yields rows changed.
    ///
    /// # Errors
    /// Returns the driver error (logged) or an invocation error.
    pub async fn execute(&self, params: &[Value]) -> Result<usize, SqliteTableError> {
        let outcome = self
            .db
            .worker()
            .execute_prepared(Arc::clone(&self.query), convert_params(params))
            .await;
        observe("SQLite Prepared Execute Error", &self.query, outcome)
    }

    /// Execute as a query and decode every row.
    ///
    /// # Errors
    /// Returns the driver error (logged) or an invocation error.
    pub async fn query(&self, params: &[Value]) -> Result<Vec<Row>, SqliteTableError> {
        let outcome = self
            .db
            .worker()
            .query_prepared(Arc::clone(&self.query), convert_params(params))
            .await
            .map(decode_rows);
        observe("SQLite Prepared Query Error", &self.query, outcome)
    }

    /// Access the raw SQL string of the prepared statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.query.as_str()
    }

    /// Drop this statement from the connection's statement cache. Other cached statements
    /// are kept.
    ///
    /// # Errors
    /// Returns an invocation error if the worker is gone.
    pub fn finalize(self) -> Result<(), SqliteTableError> {
        self.db.worker().discard_statement(self.query)
    }
}
