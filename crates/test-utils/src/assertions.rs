// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Custom assertion helpers for a [`markql_core::QueryResult`] or a
//! [`markql_diagnostics::Diagnostic`] list, so a test failure reads as
//! "expected code X, found Y" instead of an opaque `assert_eq!` panic.

use markql_core::QueryResult;
use markql_diagnostics::Diagnostic;

/// Asserts `result` ran with no error diagnostic, panicking with the
/// full diagnostic list (code + message) otherwise.
pub fn assert_success(result: &QueryResult) {
    assert!(result.is_success(), "expected success, got diagnostics: {:?}", summarize(&result.diagnostics));
}

/// Asserts `result` failed and its first diagnostic carries `code`.
pub fn assert_failed_with_code(result: &QueryResult, code: &str) {
    assert!(!result.is_success(), "expected failure with code '{code}', but the query succeeded");
    let first = result.diagnostics.first().expect("a failed QueryResult should carry at least one diagnostic");
    assert_eq!(first.code, code, "expected diagnostic code '{code}', found '{}' ({})", first.code, first.message);
}

/// Asserts `result` succeeded with exactly `count` rows.
pub fn assert_row_count(result: &QueryResult, count: usize) {
    assert_success(result);
    assert_eq!(result.rows.len(), count, "expected {count} rows, found {}", result.rows.len());
}

fn summarize(diagnostics: &[Diagnostic]) -> Vec<(&str, &str)> {
    diagnostics.iter().map(|d| (d.code.as_str(), d.message.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{HtmlFixtures, QueryFixtures};

    fn run(html: &str, query: &str) -> QueryResult {
        markql_core::execute_query(html.as_bytes(), None, query)
    }

    #[test]
    fn assert_success_passes_for_a_clean_query() {
        assert_success(&run(HtmlFixtures::two_divs_one_span(), QueryFixtures::count_star()));
    }

    #[test]
    #[should_panic(expected = "expected success")]
    fn assert_success_panics_on_a_syntax_error() {
        assert_success(&run(HtmlFixtures::two_divs_one_span(), QueryFixtures::missing_from()));
    }

    #[test]
    fn assert_failed_with_code_matches_the_semantic_code() {
        let result = run(HtmlFixtures::two_divs_one_span(), QueryFixtures::text_requires_non_tag_where());
        assert_failed_with_code(&result, "MQL-SEM-0301");
    }

    #[test]
    fn assert_row_count_matches_the_fixture() {
        assert_row_count(&run(HtmlFixtures::id_and_class_tokens(), QueryFixtures::select_by_id()), 1);
    }
}
