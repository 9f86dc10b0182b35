use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::marshal::to_bind_value;
use crate::types::Value;

/// Convert crate values into the owned `rusqlite` values sent to the worker.
#[must_use]
pub fn convert_params(params: &[Value]) -> Vec<SqlValue> {
    params.iter().map(to_bind_value).collect()
}

/// Convert one cell borrowed from a row. Text is left undecoded; text that is not valid
/// UTF-8 is converted lossily rather than rejected.
#[must_use]
pub fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}
