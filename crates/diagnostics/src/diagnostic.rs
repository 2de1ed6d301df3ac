// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use serde::{Deserialize, Serialize};

use crate::severity::DiagnosticSeverity;

/// A source location in both byte offsets and 1-based line/column
/// coordinates. Byte offsets are 0-based; line/column are 1-based to
/// match what editors and terminals display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSpan {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub byte_start: usize,
    pub byte_end: usize,
}

impl Default for DiagnosticSpan {
    fn default() -> Self {
        Self {
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 1,
            byte_start: 0,
            byte_end: 0,
        }
    }
}

/// Maps a byte range into `query` to a [`DiagnosticSpan`], clamping to the
/// text bounds and widening zero-width ranges to at least one byte so a
/// caret always has something to point at.
pub fn span_from_bytes(query: &str, byte_start: usize, byte_end: usize) -> DiagnosticSpan {
    let size = query.len();
    if size == 0 {
        return DiagnosticSpan {
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 1,
            byte_start: 0,
            byte_end: 0,
        };
    }

    let mut start = byte_start.min(size);
    let mut end = byte_end.max(start + 1).min(size);
    if start >= size {
        start = size - 1;
    }
    if end <= start {
        end = (start + 1).min(size);
    }

    let bytes = query.as_bytes();
    let mut line = 1usize;
    let mut col = 1usize;
    for &b in bytes.iter().take(start) {
        if b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    let start_line = line;
    let start_col = col;

    for &b in bytes.iter().take(end).skip(start) {
        if b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    DiagnosticSpan {
        start_line,
        start_col,
        end_line: line,
        end_col: col,
        byte_start: start,
        byte_end: end,
    }
}

/// An additional location tied to a primary diagnostic, e.g. "CASE started
/// here" pointing back at an unmatched `CASE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRelated {
    pub message: String,
    pub span: DiagnosticSpan,
}

/// A structured query diagnostic: syntax error, semantic validation
/// failure, or a runtime error mapped back into query-text coordinates.
///
/// Every diagnostic carries a stable `code` so tooling can key off it
/// without parsing `message`, plus `help`/`doc_ref` for a human reading
/// CLI output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: String,
    pub message: String,
    pub help: String,
    pub doc_ref: String,
    pub span: DiagnosticSpan,
    pub snippet: String,
    pub related: Vec<DiagnosticRelated>,
}

impl Diagnostic {
    pub(crate) fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: String::new(),
            message: message.into(),
            help: String::new(),
            doc_ref: String::new(),
            span: DiagnosticSpan::default(),
            snippet: String::new(),
            related: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_from_bytes_empty_query() {
        let span = span_from_bytes("", 5, 10);
        assert_eq!(span, DiagnosticSpan::default());
    }

    #[test]
    fn span_from_bytes_widens_zero_width() {
        let span = span_from_bytes("SELECT * FROM doc", 6, 6);
        assert_eq!(span.byte_start, 6);
        assert_eq!(span.byte_end, 7);
    }

    #[test]
    fn span_from_bytes_tracks_newlines() {
        let query = "SELECT *\nFROM doc\nWHERE tag = 'li'";
        let where_pos = query.find("WHERE").unwrap();
        let span = span_from_bytes(query, where_pos, where_pos + 5);
        assert_eq!(span.start_line, 3);
        assert_eq!(span.start_col, 1);
    }

    #[test]
    fn span_from_bytes_clamps_past_end() {
        let query = "SELECT *";
        let span = span_from_bytes(query, 1000, 2000);
        assert_eq!(span.byte_start, query.len() - 1);
        assert_eq!(span.byte_end, query.len());
    }
}
