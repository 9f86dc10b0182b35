use crate::marshal::set_list;
use crate::types::Fields;

use super::quote_ident;
use super::select::build_where;

/// Parameterized INSERT with one `?` per column; no columns inserts a row of defaults.
#[must_use]
pub fn build_insert(table: &str, columns: &[String]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table));
    }
    let names = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(",");
    let placeholders = vec!["?"; columns.len()].join(",");
    format!(
        "INSERT INTO {} ({names}) VALUES({placeholders})",
        quote_ident(table)
    )
}

/// UPDATE of the rows matching `matching`; an empty match updates every row.
#[must_use]
pub fn build_update(table: &str, matching: &Fields, changes: &Fields) -> String {
    let mut parts = vec![format!("UPDATE {} SET {}", quote_ident(table), set_list(changes))];
    if let Some(predicates) = build_where(matching) {
        parts.push(format!("WHERE {predicates}"));
    }
    parts.join(" ")
}

/// DELETE of the rows matching `matching`; an empty match deletes every row.
#[must_use]
pub fn build_delete(table: &str, matching: &Fields) -> String {
    let mut parts = vec![format!("DELETE FROM {}", quote_ident(table))];
    if let Some(predicates) = build_where(matching) {
        parts.push(format!("WHERE {predicates}"));
    }
    parts.join(" ")
}

#[must_use]
pub fn build_drop(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

/// The two statements of a truncate: delete every row, then reset the autoincrement sequence.
#[must_use]
pub fn build_truncate(table: &str) -> (String, String) {
    (
        format!("DELETE FROM {}", quote_ident(table)),
        format!("DELETE FROM sqlite_sequence WHERE name='{table}'"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::types::Value;

    #[test]
    fn insert_uses_one_placeholder_per_column() {
        assert_eq!(
            build_insert("t", &["a".to_owned(), "b".to_owned()]),
            "INSERT INTO `t` (`a`,`b`) VALUES(?,?)"
        );
        assert_eq!(build_insert("t", &[]), "INSERT INTO `t` DEFAULT VALUES");
    }

    #[test]
    fn update_and_delete_share_where() {
        let m = fields! { "id" => 3 };
        assert_eq!(
            build_update("t", &m, &fields! { "data" => "y", "extra" => Value::Null }),
            "UPDATE `t` SET `data`='y',`extra`=NULL WHERE `id`=3"
        );
        assert_eq!(build_delete("t", &m), "DELETE FROM `t` WHERE `id`=3");
        assert_eq!(build_delete("t", &Fields::new()), "DELETE FROM `t`");
    }

    #[test]
    fn drop_and_truncate() {
        assert_eq!(build_drop("t"), "DROP TABLE IF EXISTS `t`");
        let (delete, reset) = build_truncate("t");
        assert_eq!(delete, "DELETE FROM `t`");
        assert_eq!(reset, "DELETE FROM sqlite_sequence WHERE name='t'");
    }
}
