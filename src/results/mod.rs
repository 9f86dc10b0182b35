//! Decoded result rows.
//!
//! - row: the [`Row`] type shared by every read path
//! - decode: sentinel text -> typed values

mod decode;
mod row;

pub use decode::{DATE_SENTINEL, decode_row, decode_rows, decode_text, decode_value};
pub use row::Row;
pub(crate) use row::index_columns;
