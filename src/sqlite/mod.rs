// SQLite module - the driver adapter
//
// - config: open options and their builder
// - params: value conversion for bound parameters
// - query: row extraction from rusqlite statements
// - worker: dedicated thread that owns the rusqlite connection
// - database: async operations, failure policy and logging
// - prepared: reusable prepared statement handles

pub mod config;
pub mod database;
pub mod params;
pub mod prepared;
pub(crate) mod query;
pub(crate) mod worker;

pub use config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use database::Database;
pub use prepared::PreparedStatement;
