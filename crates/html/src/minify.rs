// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::scan::{TagEvent, find_raw_end_tag, is_raw_text_element, scan_tag};

/// Collapses runs of whitespace between tags down to a single space.
/// Tag markup (including quoted attribute values) and the raw content of
/// `pre`/`code`/`textarea`/`script`/`style` pass through untouched.
pub fn minify_html(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut i = 0;
    let mut last_was_space = false;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            let (end, event) = scan_tag(html, i);
            out.push_str(&html[i..end]);
            last_was_space = false;
            if let TagEvent::Opening { name, self_closing } = &event {
                if !self_closing && is_raw_text_element(name) {
                    if let Some(raw_end) = find_raw_end_tag(html, end, name) {
                        out.push_str(&html[end..raw_end]);
                        let (close_end, _) = scan_tag(html, raw_end);
                        out.push_str(&html[raw_end..close_end]);
                        i = close_end;
                        continue;
                    }
                }
            }
            i = end;
        } else {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            for ch in html[start..i].chars() {
                if ch.is_whitespace() {
                    if !last_was_space {
                        out.push(' ');
                        last_was_space = true;
                    }
                } else {
                    out.push(ch);
                    last_was_space = false;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_internal_whitespace_to_one_space() {
        let input = "<span>   hi   there  </span>";
        assert_eq!(minify_html(input), "<span> hi there </span>");
    }

    #[test]
    fn preserves_quoted_attribute_whitespace() {
        let input = "<div class=\"a   b\">x</div>";
        assert_eq!(minify_html(input), "<div class=\"a   b\">x</div>");
    }

    #[test]
    fn preserves_raw_container_content_verbatim() {
        let input = "<pre>  keep\n  this  </pre>";
        assert_eq!(minify_html(input), input);
    }
}
