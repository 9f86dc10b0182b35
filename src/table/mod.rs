//! Table-scoped facade over the query builder, the driver adapter and batch insert.

mod insert;

pub use insert::{InsertOutcome, InsertPlan, MissingColumn, plan_insert};

use crate::error::SqliteTableError;
use crate::query_builder::{
    FindOptions, build_count, build_delete, build_insert, build_select, build_update,
};
use crate::results::Row;
use crate::sqlite::Database;
use crate::sqlite::database::log_failure;
use crate::types::{Fields, IntoRows, Value};

/// A named view over one table of a [`Database`].
///
/// ```rust,no_run
/// use sqlite_table::prelude::*;
///
/// # async fn demo() -> Result<(), SqliteTableError> {
/// let db = Database::open("app.db").await?;
/// let users = db.table("users");
/// users.insert(fields! { "name" => "alice", "joined" => Value::CurrentTime }).await;
/// let found = users
///     .find(&fields! { "name" => "alice" }, &FindOptions::new().fields(["id"]))
///     .await;
/// # let _ = found;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Table<'db> {
    db: &'db Database,
    name: String,
}

impl<'db> Table<'db> {
    pub(crate) fn new(db: &'db Database, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Number of rows matching `matching`.
    ///
    /// # Errors
    /// Returns the driver error (logged), an invocation error, or
    /// [`SqliteTableError::ExecutionError`] if the count column is missing.
    pub async fn try_count(&self, matching: &Fields) -> Result<i64, SqliteTableError> {
        let query = build_count(&self.name, matching);
        let row = self.db.try_get(&query).await?;
        row.as_ref()
            .and_then(|r| r.get("count"))
            .and_then(Value::as_int)
            .ok_or_else(|| {
                SqliteTableError::ExecutionError(format!("no count returned for: {query}"))
            })
    }

    /// Fail-soft [`Table::try_count`].
    pub async fn count(&self, matching: &Fields) -> Option<i64> {
        self.try_count(matching).await.ok()
    }

    /// Rows matching `matching`, projected and paginated by `options`.
    ///
    /// # Errors
    /// Same as [`Database::try_all`], including `EmptyResult` when nothing matched.
    pub async fn try_find(
        &self,
        matching: &Fields,
        options: &FindOptions,
    ) -> Result<Vec<Row>, SqliteTableError> {
        self.db
            .try_all(&build_select(&self.name, matching, options))
            .await
    }

    /// Fail-soft [`Table::try_find`]; `None` when nothing matched.
    pub async fn find(&self, matching: &Fields, options: &FindOptions) -> Option<Vec<Row>> {
        self.try_find(matching, options).await.ok()
    }

    /// Stream matching rows to `handler`.
    ///
    /// # Errors
    /// Same as [`Database::try_each`].
    pub async fn try_each<F>(
        &self,
        matching: &Fields,
        options: &FindOptions,
        handler: F,
    ) -> Result<usize, SqliteTableError>
    where
        F: FnMut(Row),
    {
        self.db
            .try_each(&build_select(&self.name, matching, options), handler)
            .await
    }

    /// Fail-soft [`Table::try_each`].
    pub async fn each<F>(&self, matching: &Fields, options: &FindOptions, handler: F) -> bool
    where
        F: FnMut(Row),
    {
        self.try_each(matching, options, handler).await.is_ok()
    }

    /// Insert one row or many through a single prepared statement.
    ///
    /// The column set is the union of every row's fields; see [`plan_insert`]. Rows the driver
    /// rejects are logged and counted in [`InsertOutcome::failed`]; the others are still written.
    ///
    /// # Errors
    /// Returns the driver error (logged) if the statement cannot be prepared, or an invocation
    /// error.
    pub async fn try_insert(&self, rows: impl IntoRows) -> Result<InsertOutcome, SqliteTableError> {
        let rows = rows.into_rows();
        if rows.is_empty() {
            return Ok(InsertOutcome::default());
        }
        let plan = plan_insert(&rows, self.db.options().missing_column);
        let query = build_insert(&self.name, &plan.columns);
        let outcomes = self.db.insert_batch(&query, plan.values).await?;

        let mut outcome = InsertOutcome::default();
        for row_outcome in &outcomes {
            match row_outcome {
                Ok(_) => outcome.inserted += 1,
                Err(err) => {
                    log_failure("SQLite Insert Row Error", &query, err);
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Fail-soft [`Table::try_insert`]: `true` once every row has completed.
    pub async fn insert(&self, rows: impl IntoRows) -> bool {
        self.try_insert(rows).await.is_ok()
    }

    /// Apply `changes` to the rows matching `matching`; yields rows changed.
    ///
    /// # Errors
    /// Same as [`Database::try_run`].
    pub async fn try_update(
        &self,
        matching: &Fields,
        changes: &Fields,
    ) -> Result<usize, SqliteTableError> {
        if changes.is_empty() {
            return Ok(0);
        }
        self.db
            .try_run(&build_update(&self.name, matching, changes))
            .await
    }

    /// Fail-soft [`Table::try_update`].
    pub async fn update(&self, matching: &Fields, changes: &Fields) -> bool {
        self.try_update(matching, changes).await.is_ok()
    }

    /// Delete the rows matching `matching`; an empty match deletes every row.
    ///
    /// # Errors
    /// Same as [`Database::try_run`].
    pub async fn try_delete(&self, matching: &Fields) -> Result<usize, SqliteTableError> {
        self.db.try_run(&build_delete(&self.name, matching)).await
    }

    /// Fail-soft [`Table::try_delete`].
    pub async fn delete(&self, matching: &Fields) -> bool {
        self.try_delete(matching).await.is_ok()
    }

    /// See [`Database::truncate`].
    pub async fn truncate(&self) -> bool {
        self.db.truncate(&self.name).await
    }

    /// See [`Database::drop_table`].
    pub async fn drop_table(&self) -> bool {
        self.db.drop_table(&self.name).await
    }
}
