// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Column-name normalization for renderer/exporter consumers of
//! [`crate::QueryResult`]. `QueryResult::columns` carries the raw
//! projected names (an expression's literal text, an attribute path, a
//! user alias); this turns them into identifiers safe to use as JSON
//! keys, CSV headers, or table columns: lowercase, `[a-z0-9_]` only,
//! never starting with a digit, never empty, never colliding with a
//! sibling column.

fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if out.is_empty() {
        out = "column".to_string();
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Sanitizes and dedupes `raw` into a collision-free set of identifiers,
/// preserving order. Idempotent: normalizing an already-normalized list
/// returns it unchanged.
pub fn normalize_columns(raw: &[String]) -> Vec<String> {
    let mut seen: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    raw.iter()
        .map(|name| {
            let base = sanitize(name);
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 { base } else { format!("{base}_{count}") }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_non_identifier_chars() {
        assert_eq!(normalize_columns(&["Tag Name".to_string()]), vec!["tag_name"]);
    }

    #[test]
    fn prefixes_a_leading_digit() {
        assert_eq!(normalize_columns(&["1count".to_string()]), vec!["_1count"]);
    }

    #[test]
    fn falls_back_to_column_for_an_empty_name() {
        assert_eq!(normalize_columns(&["".to_string()]), vec!["column"]);
    }

    #[test]
    fn dedupes_collisions_with_numeric_suffixes() {
        let raw = vec!["id".to_string(), "ID".to_string(), "id".to_string()];
        assert_eq!(normalize_columns(&raw), vec!["id", "id_2", "id_3"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = vec!["Tag Name".to_string(), "tag name".to_string(), "2x".to_string()];
        let once = normalize_columns(&raw);
        let twice = normalize_columns(&once);
        assert_eq!(once, twice);
    }
}
