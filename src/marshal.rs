//! Application values to SQL literal text.
//!
//! Two encodings live here:
//! - literals embedded directly into statement text ([`to_literal`]), used by the query builder;
//! - values bound to `?` parameters ([`to_bind_value`]), used by batch insert and prepared
//!   statements.
//!
//! Both share the sentinel encoding: a date is stored as `DATE(<ISO-8601>)` and a structured
//! value as its JSON text, so the result decoder can recover them.

use std::fmt;
use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use crate::types::{Fields, Value};

/// Textual SQL form of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlLiteral {
    /// The `NULL` keyword.
    Null,
    /// Text rendered between single quotes. Embedded quotes are not escaped.
    Quoted(String),
    /// Text rendered as-is.
    Raw(String),
}

impl SqlLiteral {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlLiteral::Null)
    }

    fn text(text: String, escape: bool) -> Self {
        if escape {
            SqlLiteral::Quoted(text)
        } else {
            SqlLiteral::Raw(text)
        }
    }
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlLiteral::Null => f.write_str("NULL"),
            SqlLiteral::Quoted(text) => write!(f, "'{text}'"),
            SqlLiteral::Raw(text) => f.write_str(text),
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2024-01-02T03:04:05.678Z`.
#[must_use]
pub fn iso_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Sentinel-wrapped date text: `DATE(<ISO-8601>)`.
#[must_use]
pub fn encode_date(date: &DateTime<Utc>) -> String {
    format!("DATE({})", iso_timestamp(date))
}

/// Convert a value to its SQL literal.
///
/// Every falsy value (see [`Value::is_falsy`]) becomes the `NULL` keyword, so `0`, `""` and
/// `false` can never be matched or written through this path. Single quotes inside text are
/// passed through untouched: hostile input corrupts the statement.
#[must_use]
pub fn to_literal(value: &Value, escape: bool) -> SqlLiteral {
    if value.is_falsy() {
        return SqlLiteral::Null;
    }
    match value {
        Value::Text(s) => SqlLiteral::text(s.clone(), escape),
        Value::CurrentTime => SqlLiteral::text(encode_date(&Utc::now()), escape),
        Value::Date(d) => SqlLiteral::text(encode_date(d), escape),
        Value::Int(i) => SqlLiteral::Raw(i.to_string()),
        Value::Float(f) => SqlLiteral::Raw(float_literal(*f)),
        Value::Bool(_) => SqlLiteral::Raw("1".to_owned()),
        Value::Blob(bytes) => SqlLiteral::Raw(hex_blob(bytes)),
        Value::Json(json) => json_literal(json, escape),
        Value::Null => SqlLiteral::Null,
    }
}

fn json_literal(json: &JsonValue, escape: bool) -> SqlLiteral {
    match json {
        JsonValue::Array(_) | JsonValue::Object(_) => SqlLiteral::text(json.to_string(), escape),
        scalar => to_literal(&Value::from(scalar.clone()), escape),
    }
}

/// SQLite has no infinity keyword; `9e999` overflows to it when parsed.
fn float_literal(f: f64) -> String {
    if f.is_infinite() {
        if f > 0.0 { "9e999" } else { "-9e999" }.to_owned()
    } else {
        f.to_string()
    }
}

fn hex_blob(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("X'");
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out.push('\'');
    out
}

/// Comma-joined literals for each field value, in field order.
#[must_use]
pub fn values_list(fields: &Fields, escape: bool) -> String {
    fields
        .iter()
        .map(|(_, value)| to_literal(value, escape).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// `` `a`=1,`b`='x' `` assignments for an UPDATE.
#[must_use]
pub fn set_list(fields: &Fields) -> String {
    fields
        .iter()
        .map(|(name, value)| format!("`{name}`={}", to_literal(value, true)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Convert a value to the `rusqlite` value bound for a `?` placeholder.
///
/// No quoting and no falsy collapsing: `0` stays `0` and only `Null` binds SQL NULL. Dates and
/// structured values still use the sentinel encoding.
#[must_use]
pub fn to_bind_value(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Sql::Null,
        Value::Int(i) => Sql::Integer(*i),
        Value::Float(f) => Sql::Real(*f),
        Value::Text(s) => Sql::Text(s.clone()),
        Value::Bool(b) => Sql::Integer(i64::from(*b)),
        Value::Date(d) => Sql::Text(encode_date(d)),
        Value::CurrentTime => Sql::Text(encode_date(&Utc::now())),
        Value::Json(json) => match json {
            JsonValue::Array(_) | JsonValue::Object(_) => Sql::Text(json.to_string()),
            scalar => to_bind_value(&Value::from(scalar.clone())),
        },
        Value::Blob(bytes) => Sql::Blob(bytes.clone()),
    }
}
