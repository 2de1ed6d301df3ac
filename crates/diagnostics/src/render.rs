// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::diagnostic::{Diagnostic, DiagnosticSpan};

/// Renders a two-line `-->`/caret code frame pointing at `span` within
/// `query`, with an optional trailing label after the caret run. Returns
/// an empty string when the span's line cannot be located (e.g. an
/// empty query).
pub fn render_code_frame(query: &str, span: &DiagnosticSpan, label: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut line_start = 0usize;
    let mut current_line = 1usize;
    while current_line < span.start_line && line_start < query.len() {
        match query[line_start..].find('\n') {
            Some(offset) => {
                line_start += offset + 1;
                current_line += 1;
            }
            None => break,
        }
    }
    let line_end = query[line_start..]
        .find('\n')
        .map(|offset| line_start + offset)
        .unwrap_or(query.len());
    let mut line_text = query[line_start..line_end].to_string();
    if line_text.ends_with('\r') {
        line_text.pop();
    }

    let caret_start = span.start_col.saturating_sub(1);
    let mut caret_width = if span.start_line == span.end_line && span.end_col > span.start_col {
        span.end_col - span.start_col
    } else {
        1
    };
    if caret_start > line_text.len() {
        return String::new();
    }
    if caret_start + caret_width > line_text.len() + 1 {
        caret_width = if line_text.len() > caret_start {
            line_text.len() - caret_start
        } else {
            1
        };
    }
    let line_digits = span.start_line.to_string().len();

    let mut out = String::new();
    out.push_str(&format!(" --> line {}, col {}\n", span.start_line, span.start_col));
    out.push_str(&" ".repeat(line_digits));
    out.push_str(" |\n");
    out.push_str(&format!("{} | {}\n", span.start_line, line_text));
    out.push_str(&" ".repeat(line_digits));
    out.push_str(" | ");
    out.push_str(&" ".repeat(caret_start));
    out.push_str(&"^".repeat(caret_width));
    if !label.is_empty() {
        out.push(' ');
        out.push_str(label);
    }
    out
}

/// Renders a human-readable, multi-block text report: one block per
/// diagnostic, separated by a blank line, each with severity/code/message,
/// an optional code frame, related-location notes, and a help line.
pub fn render_diagnostics_text(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for (i, d) in diagnostics.iter().enumerate() {
        out.push_str(&format!("{}[{}]: {}\n", d.severity, d.code, d.message));
        if !d.snippet.is_empty() {
            out.push_str(&d.snippet);
            out.push('\n');
        }
        for related in &d.related {
            out.push_str(&format!(
                "note: {} (line {}, col {})\n",
                related.message, related.span.start_line, related.span.start_col
            ));
        }
        out.push_str(&format!("help: {}\n", d.help));
        if i + 1 < diagnostics.len() {
            out.push_str("\n\n");
        }
    }
    out
}

/// Renders diagnostics as a JSON array with stable key ordering, for
/// machine consumption by editors and CLI `--format json` output.
pub fn render_diagnostics_json(diagnostics: &[Diagnostic]) -> String {
    serde_json::to_string(diagnostics).unwrap_or_else(|_| "[]".to_string())
}

/// True when at least one `Error`-severity diagnostic is present.
pub fn has_error_diagnostics(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .iter()
        .any(|d| d.severity == crate::severity::DiagnosticSeverity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::span_from_bytes;

    #[test]
    fn code_frame_points_at_span() {
        let query = "SELECT * FROM doc WHERE bogus";
        let pos = query.find("bogus").unwrap();
        let span = span_from_bytes(query, pos, pos + 5);
        let frame = render_code_frame(query, &span, "");
        assert!(frame.contains("-->"));
        assert!(frame.contains("^^^^^"));
    }

    #[test]
    fn code_frame_empty_query_is_empty() {
        assert_eq!(render_code_frame("", &DiagnosticSpan::default(), ""), "");
    }

    #[test]
    fn text_render_joins_multiple_blocks() {
        let mut d1 = Diagnostic::new(crate::severity::DiagnosticSeverity::Error, "first");
        d1.code = "MQL-SYN-0001".to_string();
        d1.help = "fix it".to_string();
        let mut d2 = d1.clone();
        d2.message = "second".to_string();
        let rendered = render_diagnostics_text(&[d1, d2]);
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
        assert!(rendered.contains("\n\n"));
    }
}
