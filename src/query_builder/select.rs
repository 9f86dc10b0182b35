use crate::marshal::to_literal;
use crate::types::Fields;

use super::{FindOptions, quote_ident};

/// Equality predicates for a match condition, joined with ` AND `.
///
/// Returns `None` for an empty condition so the statement applies to the whole table. A value
/// that marshals to the `NULL` keyword (every falsy value) becomes `IS NULL`.
#[must_use]
pub fn build_where(matching: &Fields) -> Option<String> {
    if matching.is_empty() {
        return None;
    }
    let predicates: Vec<String> = matching
        .iter()
        .map(|(field, value)| {
            let literal = to_literal(value, true);
            if literal.is_null() {
                format!("{} IS NULL", quote_ident(field))
            } else {
                format!("{}={literal}", quote_ident(field))
            }
        })
        .collect();
    Some(predicates.join(" AND "))
}

/// `LIMIT`/`OFFSET` fragment. A skip without a limit uses `-1`, SQLite's "no limit".
#[must_use]
pub fn paginate(options: &FindOptions) -> Option<String> {
    let limit = options.limit.filter(|l| *l > 0);
    match (limit, options.skip.filter(|s| *s > 0)) {
        (limit, Some(skip)) => {
            let limit = limit.map_or_else(|| "-1".to_owned(), |l| l.to_string());
            Some(format!("LIMIT {limit} OFFSET {skip}"))
        }
        (Some(limit), None) => Some(format!("LIMIT {limit}")),
        (None, None) => None,
    }
}

/// Field list for a SELECT: `*` or the quoted names.
#[must_use]
pub fn projection(fields: &[String]) -> String {
    if fields.is_empty() {
        return "*".to_owned();
    }
    fields
        .iter()
        .map(|f| quote_ident(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Full SELECT for a table.
#[must_use]
pub fn build_select(table: &str, matching: &Fields, options: &FindOptions) -> String {
    let mut parts = vec![format!(
        "SELECT {} FROM {}",
        projection(&options.fields),
        quote_ident(table)
    )];
    if let Some(predicates) = build_where(matching) {
        parts.push(format!("WHERE {predicates}"));
    }
    if let Some(window) = paginate(options) {
        parts.push(window);
    }
    parts.join(" ")
}

/// Row count for a table; the scalar comes back in the `count` column.
#[must_use]
pub fn build_count(table: &str, matching: &Fields) -> String {
    let mut parts = vec![format!("SELECT count(1) AS count FROM {}", quote_ident(table))];
    if let Some(predicates) = build_where(matching) {
        parts.push(format!("WHERE {predicates}"));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::types::Value;

    #[test]
    fn empty_match_has_no_where() {
        assert_eq!(build_where(&Fields::new()), None);
    }

    #[test]
    fn null_match_uses_is_null() {
        assert_eq!(
            build_where(&fields! { "a" => Value::Null }).as_deref(),
            Some("`a` IS NULL")
        );
    }

    #[test]
    fn falsy_match_also_uses_is_null() {
        assert_eq!(
            build_where(&fields! { "a" => 0, "b" => false }).as_deref(),
            Some("`a` IS NULL AND `b` IS NULL")
        );
    }

    #[test]
    fn predicates_are_joined_with_and() {
        assert_eq!(
            build_where(&fields! { "a" => 5, "b" => "x" }).as_deref(),
            Some("`a`=5 AND `b`='x'")
        );
    }

    #[test]
    fn pagination_fragments() {
        assert_eq!(
            paginate(&FindOptions::new().limit(10)).as_deref(),
            Some("LIMIT 10")
        );
        assert_eq!(
            paginate(&FindOptions::new().skip(3)).as_deref(),
            Some("LIMIT -1 OFFSET 3")
        );
        assert_eq!(
            paginate(&FindOptions::new().limit(2).skip(3)).as_deref(),
            Some("LIMIT 2 OFFSET 3")
        );
        assert_eq!(paginate(&FindOptions::new()), None);
        assert_eq!(paginate(&FindOptions::new().limit(0).skip(0)), None);
    }

    #[test]
    fn projection_quotes_each_field() {
        assert_eq!(projection(&[]), "*");
        assert_eq!(
            projection(&["id".to_owned(), "data".to_owned()]),
            "`id`,`data`"
        );
    }

    #[test]
    fn select_orders_fragments() {
        let sql = build_select(
            "test_table",
            &fields! { "data" => "x" },
            &FindOptions::new().fields(["id"]).limit(2).skip(1),
        );
        assert_eq!(
            sql,
            "SELECT `id` FROM `test_table` WHERE `data`='x' LIMIT 2 OFFSET 1"
        );
        assert_eq!(
            build_select("t", &Fields::new(), &FindOptions::new()),
            "SELECT * FROM `t`"
        );
    }

    #[test]
    fn count_selects_scalar() {
        assert_eq!(
            build_count("t", &Fields::new()),
            "SELECT count(1) AS count FROM `t`"
        );
        assert_eq!(
            build_count("t", &fields! { "a" => 1 }),
            "SELECT count(1) AS count FROM `t` WHERE `a`=1"
        );
    }
}
