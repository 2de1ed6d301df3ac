// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::scan::{TagEvent, scan_tag};

/// Serializes `html` (an inner-HTML fragment) truncated to `depth` levels
/// of nested elements. `depth` counts elements *inside* the fragment, not
/// the fragment's own (already-excluded) wrapping tag: at `depth == 0` the
/// node's own direct text survives but every child element is dropped,
/// tags and their text alike; elements within the requested depth are
/// copied verbatim, tag boundaries and whitespace untouched.
pub fn limit_inner_html(html: &str, depth: usize) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut i = 0;
    let mut level: usize = 0;
    let mut skip_until_level: Option<usize> = None;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            let (end, event) = scan_tag(html, i);
            match &event {
                TagEvent::Comment | TagEvent::Doctype | TagEvent::Stray => {
                    if skip_until_level.is_none() && level <= depth {
                        out.push_str(&html[i..end]);
                    }
                }
                TagEvent::Opening { self_closing, .. } => {
                    if skip_until_level.is_none() {
                        if level < depth {
                            out.push_str(&html[i..end]);
                        } else if !self_closing {
                            skip_until_level = Some(level);
                        }
                    }
                    if !self_closing {
                        level += 1;
                    }
                }
                TagEvent::Closing { .. } => {
                    if level > 0 {
                        level -= 1;
                    }
                    match skip_until_level {
                        Some(target) if level == target => skip_until_level = None,
                        Some(_) => {}
                        None if level < depth => out.push_str(&html[i..end]),
                        None => {}
                    }
                }
            }
            i = end;
        } else {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            if skip_until_level.is_none() && level <= depth {
                out.push_str(&html[start..i]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_zero_drops_all_child_elements() {
        assert_eq!(limit_inner_html("<b>x</b>", 0), "");
    }

    #[test]
    fn depth_zero_keeps_the_fragments_own_direct_text() {
        assert_eq!(limit_inner_html("hello<b>x</b>", 0), "hello");
    }

    #[test]
    fn depth_one_keeps_direct_text_and_drops_deeper_subtrees() {
        let input = "<span>hi<b>bold</b> and<i>more</i></span>";
        assert_eq!(limit_inner_html(input, 1), "<span>hi and</span>");
    }

    #[test]
    fn depth_large_enough_is_a_passthrough() {
        let input = "<ul><li>a</li><li>b<span>c</span></li></ul>";
        assert_eq!(limit_inner_html(input, 10), input);
    }

    #[test]
    fn void_elements_count_toward_visible_depth_but_never_nest() {
        let input = "<p>line<br>line2</p>";
        assert_eq!(limit_inner_html(input, 1), input);
    }
}
