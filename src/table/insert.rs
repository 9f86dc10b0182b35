use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};

use crate::marshal::to_bind_value;
use crate::types::Fields;

/// What a batch insert writes into a column that a given row does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingColumn {
    /// The four-character text `NULL`. Unlike the query builder's `NULL` keyword this is a
    /// real string value; kept as the default for compatibility with existing data.
    #[default]
    NullText,
    /// A real SQL NULL.
    SqlNull,
}

impl MissingColumn {
    fn fill(self) -> SqlValue {
        match self {
            MissingColumn::NullText => SqlValue::Text("NULL".to_owned()),
            MissingColumn::SqlNull => SqlValue::Null,
        }
    }
}

/// Column set and per-row bound values for one batch insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    /// Union of every row's field names, in first-seen order.
    pub columns: Vec<String>,
    /// One value list per row, aligned to `columns`.
    pub values: Vec<Vec<SqlValue>>,
}

/// Reconcile heterogeneous rows into one column set.
#[must_use]
pub fn plan_insert(rows: &[Fields], missing: MissingColumn) -> InsertPlan {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for name in row.names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_owned());
            }
        }
    }

    let values = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map_or_else(|| missing.fill(), to_bind_value))
                .collect()
        })
        .collect();

    InsertPlan { columns, values }
}

/// Result of a batch insert once every row has completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Rows written.
    pub inserted: usize,
    /// Rows the driver rejected; each was logged.
    pub failed: usize,
}

impl InsertOutcome {
    /// Every issued row completed, whether or not it was written.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.inserted + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::types::Value;

    #[test]
    fn columns_are_ordered_union() {
        let rows = vec![fields! { "a" => 1, "b" => 2 }, fields! { "a" => 3 }];
        let plan = plan_insert(&rows, MissingColumn::default());
        assert_eq!(plan.columns, ["a", "b"]);
        assert_eq!(
            plan.values,
            vec![
                vec![SqlValue::Integer(1), SqlValue::Integer(2)],
                // the missing slot is the text "NULL", not the keyword used in WHERE clauses
                vec![SqlValue::Integer(3), SqlValue::Text("NULL".into())],
            ]
        );
    }

    #[test]
    fn later_rows_extend_the_column_set() {
        let rows = vec![fields! { "b" => "x" }, fields! { "a" => 1, "c" => 2 }];
        let plan = plan_insert(&rows, MissingColumn::SqlNull);
        assert_eq!(plan.columns, ["b", "a", "c"]);
        assert_eq!(
            plan.values[0],
            vec![SqlValue::Text("x".into()), SqlValue::Null, SqlValue::Null]
        );
    }

    #[test]
    fn null_text_fill_applies_only_to_absent_columns() {
        let rows = vec![
            fields! { "e" => "", "f" => false, "z" => 0.0 },
            fields! { "z" => 2.5 },
        ];
        let plan = plan_insert(&rows, MissingColumn::NullText);
        assert_eq!(
            plan.values,
            vec![
                vec![
                    SqlValue::Text(String::new()),
                    SqlValue::Integer(0),
                    SqlValue::Real(0.0),
                ],
                vec![
                    SqlValue::Text("NULL".into()),
                    SqlValue::Text("NULL".into()),
                    SqlValue::Real(2.5),
                ],
            ]
        );
    }

    #[test]
    fn present_values_are_bound_unquoted() {
        let rows = vec![fields! { "s" => "it's", "z" => 0, "n" => Value::Null }];
        let plan = plan_insert(&rows, MissingColumn::default());
        assert_eq!(
            plan.values[0],
            vec![
                SqlValue::Text("it's".into()),
                SqlValue::Integer(0),
                SqlValue::Null
            ]
        );
    }

    #[test]
    fn empty_input_has_no_columns() {
        let plan = plan_insert(&[], MissingColumn::default());
        assert!(plan.columns.is_empty());
        assert!(plan.values.is_empty());
    }
}
