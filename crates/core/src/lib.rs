// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MarkQL — Core
//!
//! The embedding surface: parse, validate, and execute a MarkQL query
//! against an HTML document, returning diagnostics as data instead of
//! an `Err` a caller must match on. Six entry points cover every way an
//! embedder (CLI, HTTP agent, REPL) drives the engine:
//!
//! - [`execute_query`] — one-shot, in-memory document.
//! - [`execute_query_with_loader`] — document resolved from a
//!   [`SourceDescriptor`] through a caller-supplied [`Loader`].
//! - [`prepare_document`] / [`execute_with_prepared`] — parse once, run
//!   many queries against the same [`PreparedHandle`].
//! - [`lint_query`] — parse + validate without running, collecting every
//!   violation.
//! - [`diagnose_failure`] — classify a previously-captured error message
//!   back into structured [`Diagnostic`]s.
//!
//! This crate never panics on malformed input and never returns
//! `Result<_, Error>` from a public entry point: a failed parse, a
//! failed validation, and a failed run all come back as a [`QueryResult`]
//! with an empty row set and a non-empty `diagnostics`.

mod columns;
mod digest;
mod loader;
mod pipeline;
mod prepared;
mod result;

pub use columns::normalize_columns;
pub use loader::{Loader, NoopLoader, RuntimeError, SourceDescriptor};
pub use pipeline::{diagnose_failure, execute_query, execute_query_with_loader, execute_with_prepared, lint_query};
pub use prepared::{PreparedHandle, prepare_document};
pub use result::QueryResult;

pub use markql_diagnostics::{Diagnostic, DiagnosticSeverity};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_query_runs_a_bare_select_star() {
        let result = execute_query(b"<div></div><span></span>", None, "SELECT * FROM document");
        assert!(result.is_success());
        assert_eq!(result.rows.len(), 2);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn execute_query_surfaces_a_syntax_diagnostic() {
        let result = execute_query(b"<div></div>", None, "SELEKT * FROM document");
        assert!(!result.is_success());
        assert!(result.rows.is_empty());
        assert!(result.diagnostics[0].code.starts_with("MQL-SYN-"));
    }

    #[test]
    fn execute_query_surfaces_a_semantic_diagnostic() {
        let result = execute_query(b"<div></div>", None, "SELECT TEXT(div) FROM document WHERE tag = 'div'");
        assert!(!result.is_success());
        assert_eq!(result.diagnostics[0].code, "MQL-SEM-0301");
    }

    #[test]
    fn execute_query_with_loader_rejects_path_sources_without_a_loader() {
        let result = execute_query_with_loader(SourceDescriptor::Path("missing.html".to_string()), "SELECT * FROM document", 1000, &NoopLoader);
        assert!(!result.is_success());
        assert_eq!(result.diagnostics[0].code, "MQL-RUN-0002");
    }

    #[test]
    fn prepare_then_execute_with_prepared_runs_multiple_queries() {
        let handle = prepare_document(b"<ul id='c'><li>one</li></ul>", None);
        let a = execute_with_prepared(&handle, "SELECT ul FROM document WHERE attributes.id = 'c'");
        assert_eq!(a.rows.len(), 1);
        let b = execute_with_prepared(&handle, "SELECT li FROM document");
        assert_eq!(b.rows.len(), 1);
    }

    #[test]
    fn lint_query_is_empty_for_a_valid_query_and_non_empty_for_an_invalid_one() {
        assert!(lint_query("SELECT * FROM document").is_empty());
        assert!(!lint_query("SELECT * FROM").is_empty());
    }

    #[test]
    fn diagnose_failure_classifies_io_messages_as_runtime() {
        let diags = diagnose_failure("SELECT * FROM PARSE('x')", "Failed to open file 'missing.html': not found");
        assert_eq!(diags[0].code, "MQL-RUN-0002");
    }

    #[test]
    fn diagnose_failure_classifies_other_messages_as_semantic() {
        let diags = diagnose_failure("SELECT * FROM doc AS u, doc AS u", "Duplicate source alias 'u'");
        assert_eq!(diags[0].code, "MQL-SEM-0101");
    }
}
