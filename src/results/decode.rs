use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::types::Value;

use super::row::Row;

/// Matches the stored date sentinel, capturing the timestamp text.
pub static DATE_SENTINEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DATE\((.+)\)$").expect("date sentinel pattern compiles"));

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Decode one stored text value.
///
/// `DATE(<timestamp>)` becomes [`Value::Date`] when the timestamp parses; text starting with
/// `{` or `[` becomes [`Value::Json`] when it parses as JSON. Anything else, including sentinel
/// look-alikes that fail to parse, comes back as [`Value::Text`].
#[must_use]
pub fn decode_text(text: String) -> Value {
    if let Some(caps) = DATE_SENTINEL.captures(&text) {
        if let Some(date) = caps.get(1).and_then(|m| parse_timestamp(m.as_str())) {
            return Value::Date(date);
        }
    } else if text.starts_with('{') || text.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<JsonValue>(&text) {
            return Value::Json(json);
        }
    }
    Value::Text(text)
}

/// Decode a single value. Only [`Value::Text`] is ever rewritten, so decoding is idempotent.
#[must_use]
pub fn decode_value(value: Value) -> Value {
    match value {
        Value::Text(text) => decode_text(text),
        other => other,
    }
}

/// Decode every field of a row in place.
#[must_use]
pub fn decode_row(mut row: Row) -> Row {
    for value in row.values_mut() {
        if matches!(value, Value::Text(_)) {
            let taken = std::mem::replace(value, Value::Null);
            *value = decode_value(taken);
        }
    }
    row
}

/// Decode every row, preserving order. An empty input is returned unchanged.
#[must_use]
pub fn decode_rows(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter().map(decode_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::{iso_timestamp, to_literal};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn row(pairs: &[(&str, Value)]) -> Row {
        Row::new(
            Arc::new(pairs.iter().map(|(n, _)| (*n).to_owned()).collect()),
            pairs.iter().map(|(_, v)| v.clone()).collect(),
        )
    }

    #[test]
    fn raw_date_literal_round_trips() {
        let d = Utc.timestamp_millis_opt(1_700_000_123_456).unwrap();
        let text = to_literal(&Value::Date(d), false).to_string();
        assert_eq!(decode_text(text), Value::Date(d));
    }

    #[test]
    fn raw_json_literal_round_trips() {
        for o in [json!({"a": 1, "b": [true, null]}), json!([1, "two", {"three": 3}])] {
            let text = to_literal(&Value::Json(o.clone()), false).to_string();
            assert_eq!(decode_text(text), Value::Json(o));
        }
    }

    #[test]
    fn brace_prefixed_garbage_stays_text() {
        assert_eq!(
            decode_text("{not json".to_owned()),
            Value::Text("{not json".to_owned())
        );
    }

    #[test]
    fn unparseable_date_sentinel_stays_text() {
        assert_eq!(
            decode_text("DATE(yesterday)".to_owned()),
            Value::Text("DATE(yesterday)".to_owned())
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(decode_text("hello".into()), Value::Text("hello".into()));
        assert_eq!(decode_text(String::new()), Value::Text(String::new()));
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let decoded = decode_text("DATE(2024-03-04 05:06:07)".into());
        assert_eq!(
            decoded,
            Value::Date(Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap())
        );
    }

    #[test]
    fn decode_row_is_idempotent() {
        let d = Utc.with_ymd_and_hms(2023, 5, 6, 7, 8, 9).unwrap();
        let r = row(&[
            ("id", Value::Int(1)),
            ("when", Value::Text(format!("DATE({})", iso_timestamp(&d)))),
            ("meta", Value::Text(r#"{"k":"v"}"#.into())),
            ("name", Value::Text("x".into())),
        ]);
        let once = decode_row(r);
        let twice = decode_row(once.clone());
        assert_eq!(once.values(), twice.values());
        assert_eq!(once.get("when"), Some(&Value::Date(d)));
        assert_eq!(once.get("meta"), Some(&Value::Json(json!({"k": "v"}))));
        assert_eq!(once.get("name"), Some(&Value::Text("x".into())));
    }

    #[test]
    fn decode_rows_preserves_order() {
        let rows = vec![
            row(&[("n", Value::Text("[1]".into()))]),
            row(&[("n", Value::Text("[2]".into()))]),
        ];
        let decoded = decode_rows(rows);
        assert_eq!(decoded[0].get("n"), Some(&Value::Json(json!([1]))));
        assert_eq!(decoded[1].get("n"), Some(&Value::Json(json!([2]))));
        assert!(decode_rows(Vec::new()).is_empty());
    }
}
