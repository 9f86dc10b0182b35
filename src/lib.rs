//! Lightweight async table access for SQLite.
//!
//! Match conditions and projection/pagination options become SQL text, application values are
//! marshalled into SQL literals, and result rows are decoded back into typed values (dates and
//! JSON structures stored as plain text).
//!
//! ```rust,no_run
//! use sqlite_table::prelude::*;
//!
//! # async fn demo() -> Result<(), SqliteTableError> {
//! let db = Database::open("app.db").await?;
//! db.try_run("CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT)")
//!     .await?;
//! let notes = db.table("notes");
//! notes.try_insert(vec![fields! { "body" => "a" }, fields! { "body" => "b" }]).await?;
//! assert_eq!(notes.try_count(&Fields::new()).await?, 2);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod marshal;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod sqlite;
pub mod table;
pub mod types;

pub use error::{ErrorKind, SqliteTableError};
pub use marshal::{SqlLiteral, to_literal};
pub use query_builder::FindOptions;
pub use results::Row;
pub use sqlite::{Database, DatabaseOptions, DatabaseOptionsBuilder, PreparedStatement};
pub use table::{InsertOutcome, MissingColumn, Table};
pub use types::{Fields, IntoRows, Value};
