// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Stable diagnostic codes and the help text/doc pointer that goes with
//! each one. The mapping from a raw error message to a code is kept as a
//! deterministic chain of substring checks rather than a lookup table,
//! matching how the parser and validator phrase their errors.

const GRAMMAR_DOC: &str = "docs/book/appendix-grammar.md";
const FUNCTIONS_DOC: &str = "docs/book/appendix-function-reference.md";
const SOURCES_DOC: &str = "docs/book/ch04-sources-and-loading.md";
const CLI_DOC: &str = "docs/markql-cli-guide.md";

fn contains_icase(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

/// `(code, help, doc_ref)` for a syntax error message.
pub(crate) fn syntax_code_help(message: &str) -> (&'static str, &'static str, &'static str) {
    let upper = message.to_ascii_uppercase();
    if upper.contains("UNEXPECTED TOKEN AFTER QUERY") {
        return (
            "MQL-SYN-0002",
            "Remove trailing tokens after the query terminates, or split multiple statements with ';'.",
            GRAMMAR_DOC,
        );
    }
    if upper.contains("EXPECTED )") {
        return (
            "MQL-SYN-0003",
            "Close the open parenthesis before continuing.",
            GRAMMAR_DOC,
        );
    }
    if upper.contains("EXPECTED (") {
        return (
            "MQL-SYN-0004",
            "Add the missing '(' for the function or clause.",
            GRAMMAR_DOC,
        );
    }
    if upper.contains("EXPECTED SELECT") || upper.contains("EXPECTED FROM") || upper.contains("EXPECTED WHERE") {
        return (
            "MQL-SYN-0005",
            "Use canonical SQL order: WITH ... SELECT ... FROM ... WHERE ...",
            GRAMMAR_DOC,
        );
    }
    if upper.contains("JOIN REQUIRES ON") {
        return (
            "MQL-SYN-0006",
            "Add ON <condition> after JOIN or use CROSS JOIN without ON.",
            GRAMMAR_DOC,
        );
    }
    if upper.contains("CROSS JOIN DOES NOT ALLOW ON") {
        return (
            "MQL-SYN-0007",
            "Remove ON from CROSS JOIN, or change CROSS JOIN to JOIN/LEFT JOIN.",
            GRAMMAR_DOC,
        );
    }
    if upper.contains("LATERAL SUBQUERY REQUIRES AN ALIAS") {
        return (
            "MQL-SYN-0008",
            "Add AS <alias> after the LATERAL subquery.",
            GRAMMAR_DOC,
        );
    }
    (
        "MQL-SYN-0001",
        "Check SQL clause order: WITH ... SELECT ... FROM ... WHERE ... ORDER BY ... LIMIT ... TO ...",
        GRAMMAR_DOC,
    )
}

/// `(code, help, doc_ref)` for a semantic validation error message.
pub(crate) fn semantic_code_help(message: &str) -> (&'static str, &'static str, &'static str) {
    if contains_icase(message, "Duplicate source alias") {
        return (
            "MQL-SEM-0101",
            "Use unique aliases for each FROM/JOIN source in the same scope.",
            GRAMMAR_DOC,
        );
    }
    if contains_icase(message, "Duplicate CTE name") {
        return (
            "MQL-SEM-0102",
            "Rename one CTE so each WITH binding name is unique.",
            GRAMMAR_DOC,
        );
    }
    if contains_icase(message, "Unknown identifier") {
        return (
            "MQL-SEM-0103",
            "Reference a bound FROM alias (or legacy tag binding) and check spelling.",
            GRAMMAR_DOC,
        );
    }
    if contains_icase(message, "Identifier 'doc' is not bound") {
        return (
            "MQL-SEM-0104",
            "When FROM doc AS <alias> is used, reference only that alias (not doc.*).",
            GRAMMAR_DOC,
        );
    }
    if contains_icase(message, "Derived table requires an alias") {
        return (
            "MQL-SEM-0105",
            "Add AS <alias> after the derived subquery source.",
            GRAMMAR_DOC,
        );
    }
    if contains_icase(message, "TO LIST()") {
        return (
            "MQL-SEM-0201",
            "TO LIST() requires exactly one projected column.",
            CLI_DOC,
        );
    }
    if contains_icase(message, "TO TABLE()") {
        return (
            "MQL-SEM-0202",
            "Use TO TABLE() only with SELECT table tag-only queries.",
            CLI_DOC,
        );
    }
    if contains_icase(message, "Export") {
        return (
            "MQL-SEM-0203",
            "Check export sink syntax and ensure required path arguments are present.",
            CLI_DOC,
        );
    }
    if contains_icase(message, "TEXT()/INNER_HTML()/RAW_INNER_HTML()") {
        return (
            "MQL-SEM-0301",
            "Add a WHERE clause with a non-tag filter (attributes/parent/etc.) before projecting TEXT()/INNER_HTML().",
            FUNCTIONS_DOC,
        );
    }
    if contains_icase(message, "ORDER BY") {
        return (
            "MQL-SEM-0401",
            "ORDER BY supports a restricted field set; adjust ORDER BY fields or aggregate usage.",
            GRAMMAR_DOC,
        );
    }
    if contains_icase(message, "LIMIT") {
        return ("MQL-SEM-0402", "Reduce LIMIT to a supported value.", GRAMMAR_DOC);
    }
    if contains_icase(message, "PARSE()") || contains_icase(message, "FRAGMENTS()") || contains_icase(message, "RAW()")
    {
        return (
            "MQL-SEM-0501",
            "Ensure source constructors receive valid HTML strings or supported subqueries.",
            SOURCES_DOC,
        );
    }
    (
        "MQL-SEM-0999",
        "Review the failing clause and adjust query shape to match MarkQL validation rules.",
        CLI_DOC,
    )
}

/// True when a runtime error message describes source loading failure
/// rather than a validation rule violation.
pub(crate) fn looks_like_runtime_io(message: &str) -> bool {
    contains_icase(message, "Failed to open file")
        || contains_icase(message, "Failed to fetch URL")
        || contains_icase(message, "URL fetching is disabled")
        || contains_icase(message, "Unsupported Content-Type")
}

/// `(code, help, doc_ref)` for a runtime error message.
pub(crate) fn runtime_code_help(message: &str) -> (&'static str, &'static str, &'static str) {
    if looks_like_runtime_io(message) {
        (
            "MQL-RUN-0002",
            "Verify the input path/URL and network/file permissions.",
            SOURCES_DOC,
        )
    } else {
        (
            "MQL-RUN-0001",
            "Check source availability and query source clauses before retrying.",
            SOURCES_DOC,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_defaults_to_generic_code() {
        let (code, ..) = syntax_code_help("Expected SELECT, FROM, or WITH");
        assert_eq!(code, "MQL-SYN-0005");
    }

    #[test]
    fn syntax_falls_back_to_0001() {
        let (code, ..) = syntax_code_help("something unexpected happened");
        assert_eq!(code, "MQL-SYN-0001");
    }

    #[test]
    fn semantic_maps_duplicate_alias() {
        let (code, ..) = semantic_code_help("Duplicate source alias 'u'");
        assert_eq!(code, "MQL-SEM-0101");
    }

    #[test]
    fn runtime_detects_io_failure() {
        let (code, ..) = runtime_code_help("Failed to fetch URL https://example.com");
        assert_eq!(code, "MQL-RUN-0002");
    }
}
