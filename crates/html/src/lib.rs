// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MarkQL — HTML
//!
//! A lenient, single-pass HTML parser that produces the flat node table
//! the rest of MarkQL operates on, plus two text-shaping helpers built on
//! the same tag scanner: a whitespace minifier and a depth-limited
//! inner-HTML serializer.
//!
//! The parser never rejects input. Mismatched and missing closing tags
//! are recovered from, not reported — a query against malformed markup
//! still runs against whatever structure the recovery produced.

mod limit;
mod minify;
mod node;
mod parse;
mod scan;

pub use limit::limit_inner_html;
pub use minify::minify_html;
pub use node::{HtmlDocument, HtmlNode};
pub use parse::parse_html;
pub use scan::{is_raw_text_element, is_void_element};

impl HtmlDocument {
    pub fn with_source_uri(mut self, source_uri: impl Into<String>) -> Self {
        self.source_uri = Some(source_uri.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_table_document() {
        let doc = parse_html(
            "<table id=\"p\"><tr><th>Name</th><th>Qty</th></tr><tr><td>Widget</td><td>3</td></tr></table>",
        );
        let table = doc.nodes.iter().find(|n| n.tag == "table").unwrap();
        assert_eq!(table.attr("id"), Some("p"));
        let rows: Vec<_> = doc.nodes.iter().filter(|n| n.tag == "tr").collect();
        assert_eq!(rows.len(), 2);
        let children = doc.build_children();
        assert_eq!(children[table.id as usize].len(), 2);
    }
}
