//! SQL text construction.
//!
//! Identifiers are always backtick-quoted and fragments are joined with single spaces in a
//! fixed order: select, where, pagination.

mod dml;
mod select;

pub use dml::{build_delete, build_drop, build_insert, build_truncate, build_update};
pub use select::{build_count, build_select, build_where, paginate, projection};

/// Projection and pagination for a read.
///
/// ```rust
/// use sqlite_table::prelude::*;
///
/// let options = FindOptions::new().fields(["id", "data"]).limit(2).skip(3);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Fields to return; empty selects every column.
    pub fields: Vec<String>,
    /// Maximum number of rows. `None` and `Some(0)` mean unbounded.
    pub limit: Option<u64>,
    /// Rows to skip. `None` and `Some(0)` mean no offset.
    pub skip: Option<u64>,
}

impl FindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{name}`")
}
