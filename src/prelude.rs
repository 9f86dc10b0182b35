//! Convenient imports for common functionality.

pub use crate::error::{ErrorKind, SqliteTableError};
pub use crate::fields;
pub use crate::query_builder::FindOptions;
pub use crate::results::Row;
pub use crate::sqlite::{Database, DatabaseOptions, PreparedStatement};
pub use crate::table::{InsertOutcome, MissingColumn, Table};
pub use crate::types::{Fields, IntoRows, Value};
