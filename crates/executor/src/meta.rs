// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Introspection queries (`SHOW`/`DESCRIBE`, engine specification §1):
//! these return static metadata about the running engine or the bound
//! document rather than walking it for row matches.

use markql_ir::QueryKind;

use crate::result::{QueryResult, ResultRow};

/// Builds a [`QueryResult`] from a fixed column list and fixed rows of
/// string values, matching each row's values to `columns` positionally.
/// `source_uri` is carried on [`ResultRow::source_uri`]; every other
/// column lands in [`ResultRow::attributes`].
fn build_meta_result(columns: &[&str], rows: &[&[&str]]) -> QueryResult {
    let result_rows = rows
        .iter()
        .map(|values| {
            let mut row = ResultRow::default();
            for (col, value) in columns.iter().zip(values.iter()) {
                if *col == "source_uri" {
                    row.source_uri = Some(value.to_string());
                } else {
                    row.attributes.insert(col.to_string(), value.to_string());
                }
            }
            row
        })
        .collect();
    QueryResult {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: result_rows,
        ..QueryResult::default()
    }
}

/// Returns `Some` with the metadata result for `kind`, or `None` for
/// [`QueryKind::Select`] (which executes on the node/relation path instead).
pub fn execute_meta_query(kind: QueryKind, source_uri: Option<&str>) -> Option<QueryResult> {
    let source_uri = source_uri.unwrap_or("");
    match kind {
        QueryKind::Select => None,
        QueryKind::ShowInput => Some(build_meta_result(&["key", "value"], &[&["source_uri", source_uri]])),
        QueryKind::ShowInputs => Some(build_meta_result(&["source_uri"], &[&[source_uri]])),
        QueryKind::ShowFunctions => Some(build_meta_result(
            &["function", "returns", "description"],
            &[
                &["text(tag|self)", "string", "Text content of a tag or current row node"],
                &["direct_text(tag|self)", "string", "Immediate text content of a tag or current row node"],
                &["first_text(tag WHERE ...)", "string", "First scoped TEXT match (alias of TEXT(..., 1))"],
                &["last_text(tag WHERE ...)", "string", "Last scoped TEXT match"],
                &["first_attr(tag, attr WHERE ...)", "string", "First scoped ATTR match"],
                &["last_attr(tag, attr WHERE ...)", "string", "Last scoped ATTR match"],
                &["concat(a, b, ...)", "string", "Concatenate strings; NULL if any arg is NULL"],
                &["substring(str, start, len)", "string", "1-based substring"],
                &["substr(str, start, len)", "string", "Alias of substring"],
                &["length(str)", "int64", "String length in UTF-8 bytes"],
                &["char_length(str)", "int64", "Alias of length"],
                &["position(substr IN str)", "int64", "1-based position, 0 if not found"],
                &["locate(substr, str[, start])", "int64", "1-based position, 0 if not found"],
                &["replace(str, from, to)", "string", "Replace substring"],
                &["lower(str)", "string", "Lowercase"],
                &["upper(str)", "string", "Uppercase"],
                &["ltrim(str)", "string", "Trim left whitespace"],
                &["rtrim(str)", "string", "Trim right whitespace"],
                &["coalesce(a, b, ...)", "scalar", "First non-NULL value"],
                &["case when ... then ... else ... end", "scalar", "Conditional expression"],
                &["inner_html(tag|self[, depth|MAX_DEPTH])", "string", "Minified HTML inside a tag/current row node"],
                &["raw_inner_html(tag|self[, depth|MAX_DEPTH])", "string", "Raw inner HTML without minification"],
                &["flatten_text(tag[, depth])", "string[]", "Flatten descendant text at depth into columns"],
                &["flatten(tag[, depth])", "string[]", "Alias of flatten_text"],
                &["project(tag)", "mixed[]", "Evaluate named extraction expressions per row"],
                &["flatten_extract(tag)", "mixed[]", "Compatibility alias of project(tag)"],
                &["trim(inner_html(...))", "string", "Trim whitespace in inner_html"],
                &["count(tag|*)", "int64", "Aggregate node count"],
                &["summarize(*)", "table<tag,count>", "Tag counts summary"],
                &["tfidf(tag|*)", "map<string,double>", "TF-IDF term scores"],
            ],
        )),
        QueryKind::ShowAxes => Some(build_meta_result(
            &["axis", "description"],
            &[
                &["parent", "Parent node"],
                &["child", "Direct child nodes"],
                &["ancestor", "Any ancestor node"],
                &["descendant", "Any descendant node"],
            ],
        )),
        QueryKind::ShowOperators => Some(build_meta_result(
            &["operator", "description"],
            &[
                &["=", "Equality"],
                &["<>", "Not equal"],
                &["<, <=, >, >=", "Ordered comparison"],
                &["IN (...)", "Membership"],
                &["LIKE", "SQL-style wildcard match (% and _)"],
                &["CONTAINS", "Substring or list contains"],
                &["CONTAINS ALL", "Contains all values"],
                &["CONTAINS ANY", "Contains any value"],
                &["IS NULL", "Null check"],
                &["IS NOT NULL", "Not-null check"],
                &["HAS_DIRECT_TEXT", "Direct text predicate"],
                &["~", "Regex match"],
                &["AND", "Logical AND"],
                &["OR", "Logical OR"],
            ],
        )),
        QueryKind::DescribeDoc => Some(build_meta_result(
            &["column_name", "type", "nullable", "notes"],
            &[
                &["node_id", "int64", "false", "Stable node identifier"],
                &["tag", "string", "false", "Lowercase tag name"],
                &["attributes", "map<string,string>", "false", "HTML attributes"],
                &["parent_id", "int64", "true", "Null for root"],
                &["max_depth", "int64", "false", "Max element depth under node"],
                &["doc_order", "int64", "false", "Preorder document index"],
                &["sibling_pos", "int64", "false", "1-based among siblings"],
                &["source_uri", "string", "true", "Empty for RAW/STDIN"],
            ],
        )),
        QueryKind::DescribeLanguage => Some(build_meta_result(
            &["category", "name", "syntax", "notes"],
            &[
                &["clause", "SELECT", "SELECT <tag|*>[, ...]", "Tag list or *"],
                &["clause", "FROM", "FROM <source>", "Defaults to document in REPL"],
                &["clause", "WHERE", "WHERE <expr>", "Predicate expression"],
                &[
                    "clause",
                    "ORDER BY",
                    "ORDER BY <field> [ASC|DESC]",
                    "node_id, tag, text, parent_id, sibling_pos, max_depth, doc_order; SUMMARIZE uses tag/count",
                ],
                &["clause", "LIMIT", "LIMIT <n>", "n >= 0, max enforced"],
                &["clause", "EXCLUDE", "EXCLUDE <field>[, ...]", "Only with SELECT *"],
                &["output", "TO LIST", "TO LIST()", "Requires one projected column"],
                &[
                    "output",
                    "TO TABLE",
                    "TO TABLE([HEADER|NOHEADER][, TRIM_EMPTY_ROWS=ON][, TRIM_EMPTY_COLS=TRAILING|ALL][, EMPTY_IS=...][, STOP_AFTER_EMPTY_ROWS=n][, FORMAT=SPARSE][, SPARSE_SHAPE=LONG|WIDE][, HEADER_NORMALIZE=ON][, EXPORT='file.csv'])",
                    "Select table tags only",
                ],
                &["output", "TO CSV", "TO CSV('file.csv')", "Export result"],
                &["output", "TO PARQUET", "TO PARQUET('file.parquet')", "Export result"],
                &["output", "TO JSON", "TO JSON(['file.json'])", "Export rows as a JSON array"],
                &["output", "TO NDJSON", "TO NDJSON(['file.ndjson'])", "Export rows as newline-delimited JSON"],
                &["source", "document", "FROM document", "Active input in REPL"],
                &["source", "alias", "FROM doc", "Alias for document"],
                &["source", "path", "FROM 'file.html'", "Local file"],
                &["source", "url", "FROM 'https://example.com'", "Requires libcurl"],
                &["source", "raw", "FROM RAW('<html>')", "Inline HTML"],
            ],
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_has_no_meta_result() {
        assert!(execute_meta_query(QueryKind::Select, None).is_none());
    }

    #[test]
    fn show_input_reports_the_bound_source_uri() {
        let result = execute_meta_query(QueryKind::ShowInput, Some("file.html")).unwrap();
        assert_eq!(result.columns, vec!["key", "value"]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].attributes.get("key").map(String::as_str), Some("source_uri"));
        assert_eq!(result.rows[0].attributes.get("value").map(String::as_str), Some("file.html"));
    }

    #[test]
    fn show_inputs_reports_source_uri_on_the_row_itself() {
        let result = execute_meta_query(QueryKind::ShowInputs, Some("file.html")).unwrap();
        assert_eq!(result.rows[0].source_uri.as_deref(), Some("file.html"));
    }

    #[test]
    fn show_input_defaults_to_an_empty_source_uri() {
        let result = execute_meta_query(QueryKind::ShowInput, None).unwrap();
        assert_eq!(result.rows[0].attributes.get("value").map(String::as_str), Some(""));
    }

    #[test]
    fn show_functions_lists_the_registered_functions() {
        let result = execute_meta_query(QueryKind::ShowFunctions, None).unwrap();
        assert_eq!(result.columns, vec!["function", "returns", "description"]);
        assert!(result.rows.len() > 10);
    }

    #[test]
    fn describe_doc_lists_the_node_columns() {
        let result = execute_meta_query(QueryKind::DescribeDoc, None).unwrap();
        assert!(result.rows.iter().any(|r| r.attributes.get("column_name").map(String::as_str) == Some("node_id")));
    }

    #[test]
    fn describe_language_lists_clauses_and_sources() {
        let result = execute_meta_query(QueryKind::DescribeLanguage, None).unwrap();
        assert!(result.rows.iter().any(|r| r.attributes.get("name").map(String::as_str) == Some("TO TABLE")));
    }
}
