use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Statement, params_from_iter};

use crate::error::SqliteTableError;
use crate::results::Row;

use super::params::from_value_ref;

/// Column metadata captured once per statement and shared by every row it yields.
struct RowShape {
    column_names: Arc<Vec<String>>,
    index: Arc<HashMap<String, usize>>,
}

impl RowShape {
    fn of(stmt: &Statement<'_>) -> Self {
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let index = Arc::new(crate::results::index_columns(&column_names));
        Self {
            column_names: Arc::new(column_names),
            index,
        }
    }

    fn read(&self, row: &rusqlite::Row<'_>) -> Result<Row, SqliteTableError> {
        let mut values = Vec::with_capacity(self.column_names.len());
        for i in 0..self.column_names.len() {
            values.push(from_value_ref(row.get_ref(i)?));
        }
        Ok(Row::with_index(
            Arc::clone(&self.column_names),
            Arc::clone(&self.index),
            values,
        ))
    }
}

/// Run a query and hand each row to `sink` until it returns `false` or rows run out.
///
/// Returns the number of rows handed over.
///
/// # Errors
/// Returns `SqliteTableError::SqliteError` if the statement fails while stepping.
pub fn for_each_row<F>(
    stmt: &mut Statement<'_>,
    params: &[SqlValue],
    mut sink: F,
) -> Result<usize, SqliteTableError>
where
    F: FnMut(Row) -> bool,
{
    let shape = RowShape::of(stmt);
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut seen = 0;
    while let Some(row) = rows.next()? {
        seen += 1;
        if !sink(shape.read(row)?) {
            break;
        }
    }
    Ok(seen)
}

/// Collect every row of a query.
///
/// # Errors
/// Returns `SqliteTableError::SqliteError` if the statement fails while stepping.
pub fn collect_rows(
    stmt: &mut Statement<'_>,
    params: &[SqlValue],
) -> Result<Vec<Row>, SqliteTableError> {
    let mut out = Vec::new();
    for_each_row(stmt, params, |row| {
        out.push(row);
        true
    })?;
    Ok(out)
}

/// First row of a query, if any.
///
/// # Errors
/// Returns `SqliteTableError::SqliteError` if the statement fails.
pub fn first_row(
    stmt: &mut Statement<'_>,
    params: &[SqlValue],
) -> Result<Option<Row>, SqliteTableError> {
    let mut first = None;
    for_each_row(stmt, params, |row| {
        first = Some(row);
        false
    })?;
    Ok(first)
}
