// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Constructors that turn a raw parser/validator/runtime error message
//! into a fully-formed [`Diagnostic`]: span located in the original query
//! text, stable code assigned, help text and a doc pointer attached, and
//! a code frame rendered.

use crate::codes::{looks_like_runtime_io, runtime_code_help, semantic_code_help, syntax_code_help};
use crate::diagnostic::{Diagnostic, DiagnosticRelated, span_from_bytes};
use crate::render::render_code_frame;
use crate::severity::DiagnosticSeverity;

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn find_icase(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn extract_single_quoted(message: &str) -> Option<String> {
    let start = message.find('\'')?;
    let end = message[start + 1..].find('\'').map(|i| start + 1 + i)?;
    if end <= start + 1 {
        return None;
    }
    Some(message[start + 1..end].to_string())
}

fn find_keyword_span(query: &str, keyword: &str) -> Option<crate::diagnostic::DiagnosticSpan> {
    let pos = find_icase(query, keyword)?;
    Some(span_from_bytes(query, pos, pos + keyword.len()))
}

fn find_identifier_span(query: &str, identifier: &str) -> Option<crate::diagnostic::DiagnosticSpan> {
    if identifier.is_empty() {
        return None;
    }
    let lower_query = query.to_ascii_lowercase();
    let lower_ident = identifier.to_ascii_lowercase();
    let bytes = query.as_bytes();
    let mut pos = 0usize;
    while let Some(offset) = lower_query[pos..].find(&lower_ident) {
        let start = pos + offset;
        let left_ok = start == 0 || !is_ident_char(bytes[start - 1]);
        let right = start + lower_ident.len();
        let right_ok = right >= bytes.len() || !is_ident_char(bytes[right]);
        if left_ok && right_ok {
            return Some(span_from_bytes(query, start, right));
        }
        pos = start + 1;
        if pos > lower_query.len() {
            break;
        }
    }
    None
}

/// Best-effort span recovery for a semantic/runtime message that has no
/// byte position of its own: walks a chain of keyword/identifier probes
/// keyed off substrings of the message, falling back to the start of the
/// query when nothing matches.
fn best_effort_semantic_span(query: &str, message: &str) -> crate::diagnostic::DiagnosticSpan {
    let icase = |needle: &str| find_icase(message, needle).is_some();

    if icase("ORDER BY") {
        if let Some(span) = find_keyword_span(query, "ORDER BY") {
            return span;
        }
    }
    if icase("TO LIST") {
        if let Some(span) = find_keyword_span(query, "TO LIST") {
            return span;
        }
    }
    if icase("TO TABLE") {
        if let Some(span) = find_keyword_span(query, "TO TABLE") {
            return span;
        }
    }
    if icase("export") {
        for keyword in ["TO CSV", "TO PARQUET", "TO JSON", "TO NDJSON"] {
            if let Some(span) = find_keyword_span(query, keyword) {
                return span;
            }
        }
    }
    if icase("Duplicate source alias") || icase("Identifier 'doc' is not bound") || icase("Unknown identifier") {
        if let Some(token) = extract_single_quoted(message) {
            if let Some(span) = find_identifier_span(query, &token) {
                return span;
            }
        }
        if let Some(span) = find_keyword_span(query, "FROM") {
            return span;
        }
    }
    if icase("CTE") {
        if let Some(span) = find_keyword_span(query, "WITH") {
            return span;
        }
    }
    if icase("JOIN") {
        if let Some(span) = find_keyword_span(query, "JOIN") {
            return span;
        }
    }
    if icase("TEXT()") || icase("INNER_HTML()") || icase("RAW_INNER_HTML()") {
        if let Some(span) = find_keyword_span(query, "SELECT") {
            return span;
        }
    }
    if icase("LIMIT") {
        if let Some(span) = find_keyword_span(query, "LIMIT") {
            return span;
        }
    }
    if icase("EXCLUDE") {
        if let Some(span) = find_keyword_span(query, "EXCLUDE") {
            return span;
        }
    }
    if icase("Expected source alias") || icase("requires an alias") {
        if let Some(span) = find_keyword_span(query, "FROM") {
            return span;
        }
    }
    if icase("WHERE") {
        if let Some(span) = find_keyword_span(query, "WHERE") {
            return span;
        }
    }
    if query.is_empty() {
        span_from_bytes(query, 0, 0)
    } else {
        span_from_bytes(query, 0, 1)
    }
}

impl Diagnostic {
    /// Builds a syntax diagnostic anchored at a byte position reported by
    /// the lexer/parser.
    pub fn syntax(query: &str, parser_message: impl Into<String>, error_byte: usize) -> Diagnostic {
        let message = parser_message.into();
        let span = span_from_bytes(query, error_byte, error_byte + 1);
        let (code, help, doc_ref) = syntax_code_help(&message);
        let mut d = Diagnostic::new(DiagnosticSeverity::Error, message.clone());
        d.code = code.to_string();
        d.help = help.to_string();
        d.doc_ref = doc_ref.to_string();
        d.snippet = render_code_frame(query, &span, "");
        d.span = span;

        if find_icase(&message, "Expected END").is_some() {
            if let Some(case_pos) = find_icase(query, "CASE") {
                d.related.push(DiagnosticRelated {
                    message: "CASE started here".to_string(),
                    span: span_from_bytes(query, case_pos, case_pos + 4),
                });
            }
        }
        d
    }

    /// Builds a semantic validation diagnostic, locating a best-effort
    /// span since validation messages don't carry a byte position.
    pub fn semantic(query: &str, validation_message: impl Into<String>) -> Diagnostic {
        let message = validation_message.into();
        let span = best_effort_semantic_span(query, &message);
        let (code, help, doc_ref) = semantic_code_help(&message);
        let mut d = Diagnostic::new(DiagnosticSeverity::Error, message);
        d.code = code.to_string();
        d.help = help.to_string();
        d.doc_ref = doc_ref.to_string();
        d.snippet = render_code_frame(query, &span, "");
        d.span = span;
        d
    }

    /// Builds a runtime diagnostic for a failure that isn't a validation
    /// rule violation, e.g. a source failing to load.
    pub fn runtime(query: &str, runtime_message: impl Into<String>) -> Diagnostic {
        let message = runtime_message.into();
        let span = best_effort_semantic_span(query, &message);
        let (code, help, doc_ref) = runtime_code_help(&message);
        let mut d = Diagnostic::new(DiagnosticSeverity::Error, message);
        d.code = code.to_string();
        d.help = help.to_string();
        d.doc_ref = doc_ref.to_string();
        d.snippet = render_code_frame(query, &span, "");
        d.span = span;
        d
    }
}

/// Exposed for `markql-core`'s runtime-error classification when deciding
/// whether a caught execution error should render as [`Diagnostic::runtime`]
/// or [`Diagnostic::semantic`].
pub fn is_runtime_io_message(message: &str) -> bool {
    looks_like_runtime_io(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_diagnostic_has_code_and_frame() {
        let d = Diagnostic::syntax("SELECT FROM doc", "Expected column list after SELECT", 7);
        assert_eq!(d.code, "MQL-SYN-0005");
        assert!(!d.snippet.is_empty());
    }

    #[test]
    fn syntax_diagnostic_attaches_case_related() {
        let d = Diagnostic::syntax(
            "SELECT CASE WHEN tag = 'a' THEN 1",
            "Expected END after CASE expression",
            33,
        );
        assert_eq!(d.related.len(), 1);
        assert_eq!(d.related[0].message, "CASE started here");
    }

    #[test]
    fn semantic_diagnostic_locates_duplicate_alias_identifier() {
        let query = "SELECT * FROM doc AS u, doc AS u";
        let d = Diagnostic::semantic(query, "Duplicate source alias 'u'");
        assert_eq!(d.code, "MQL-SEM-0101");
        assert!(d.span.byte_start > 0);
    }

    #[test]
    fn runtime_diagnostic_classifies_io_failure() {
        let d = Diagnostic::runtime("SELECT * FROM PARSE('x')", "Failed to open file 'missing.html'");
        assert_eq!(d.code, "MQL-RUN-0002");
    }

    #[test]
    fn runtime_diagnostic_falls_back_to_generic_code() {
        let d = Diagnostic::runtime("SELECT * FROM doc", "unexpected internal failure");
        assert_eq!(d.code, "MQL-RUN-0001");
    }
}
