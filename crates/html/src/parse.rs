// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::node::{HtmlDocument, HtmlNode};
use crate::scan::{TagEvent, decode_entities, find_raw_end_tag, is_raw_text_element, is_tag_name_char, scan_tag};

struct StackFrame {
    id: u32,
    child_counter: u32,
}

/// Parses `source` into a flat, document-order node table. Never fails:
/// missing closing tags are auto-closed at the point they would have been
/// expected (the nearest matching ancestor, or end of document), stray
/// closing tags with no matching ancestor are dropped, and anything that
/// doesn't look like a tag is treated as text.
pub fn parse_html(source: &str) -> HtmlDocument {
    let bytes = source.as_bytes();
    let mut nodes: Vec<HtmlNode> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut text_runs: Vec<(usize, usize)> = Vec::new();
    let mut stack: Vec<StackFrame> = Vec::new();
    let mut root_child_counter: u32 = 0;

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            text_runs.push((start, i));
            continue;
        }

        let (end, event) = scan_tag(source, i);
        match event {
            TagEvent::Comment | TagEvent::Doctype | TagEvent::Stray => {
                i = end;
            }
            TagEvent::Closing { name } => {
                if let Some(pos) = stack.iter().rposition(|f| nodes[f.id as usize].tag == name) {
                    while stack.len() > pos {
                        let frame = stack.pop().unwrap();
                        spans[frame.id as usize].1 = i;
                    }
                }
                i = end;
            }
            TagEvent::Opening { name, self_closing } => {
                let id = nodes.len() as u32;
                let parent_id = stack.last().map(|f| f.id);
                let sibling_pos = if let Some(frame) = stack.last_mut() {
                    frame.child_counter += 1;
                    frame.child_counter
                } else {
                    root_child_counter += 1;
                    root_child_counter
                };
                let attributes = parse_attributes(source, i, end);
                nodes.push(HtmlNode {
                    id,
                    tag: name.clone(),
                    attributes,
                    text: String::new(),
                    inner_html: String::new(),
                    parent_id,
                    doc_order: id,
                    sibling_pos,
                    max_depth: 0,
                });
                spans.push((end, end));

                if self_closing {
                    // content span stays empty
                } else if is_raw_text_element(&name) {
                    let raw_end = find_raw_end_tag(source, end, &name).unwrap_or(bytes.len());
                    spans[id as usize] = (end, raw_end);
                    let raw_slice = &source[end..raw_end];
                    let text = if name == "script" || name == "style" {
                        raw_slice.to_string()
                    } else {
                        decode_entities(raw_slice)
                    };
                    nodes[id as usize].text = text;
                    nodes[id as usize].inner_html = raw_slice.to_string();
                    i = raw_end;
                    if i < bytes.len() {
                        let (close_end, _) = scan_tag(source, i);
                        i = close_end;
                    }
                    continue;
                } else {
                    stack.push(StackFrame { id, child_counter: 0 });
                }
                i = end;
            }
        }
    }

    while let Some(frame) = stack.pop() {
        spans[frame.id as usize].1 = bytes.len();
    }

    for idx in 0..nodes.len() {
        if is_raw_text_element(&nodes[idx].tag) {
            continue;
        }
        let (start, end) = spans[idx];
        nodes[idx].inner_html = source[start..end].to_string();
        let mut text = String::new();
        for &(ts, te) in &text_runs {
            if ts >= start && te <= end {
                text.push_str(&decode_entities(&source[ts..te]));
            }
        }
        nodes[idx].text = text;
    }

    let mut children: Vec<Vec<u32>> = vec![Vec::new(); nodes.len()];
    for node in &nodes {
        if let Some(parent) = node.parent_id {
            children[parent as usize].push(node.id);
        }
    }
    for idx in (0..nodes.len()).rev() {
        let depth = children[idx].iter().map(|&k| nodes[k as usize].max_depth + 1).max().unwrap_or(0);
        nodes[idx].max_depth = depth;
    }

    HtmlDocument { nodes, source_uri: None }
}

fn parse_attributes(source: &str, tag_start: usize, tag_end: usize) -> Vec<(String, String)> {
    let bytes = source.as_bytes();
    let mut i = tag_start + 1;
    while i < tag_end && is_tag_name_char(bytes[i]) {
        i += 1;
    }
    let mut attrs: Vec<(String, String)> = Vec::new();
    loop {
        while i < tag_end && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= tag_end || bytes[i] == b'/' || bytes[i] == b'>' {
            break;
        }
        let name_start = i;
        while i < tag_end && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() && bytes[i] != b'/' && bytes[i] != b'>' {
            i += 1;
        }
        let name = source[name_start..i].to_ascii_lowercase();
        if name.is_empty() {
            i += 1;
            continue;
        }
        let mut j = i;
        while j < tag_end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = String::new();
        if j < tag_end && bytes[j] == b'=' {
            j += 1;
            while j < tag_end && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < tag_end && (bytes[j] == b'"' || bytes[j] == b'\'') {
                let quote = bytes[j];
                j += 1;
                let val_start = j;
                while j < tag_end && bytes[j] != quote {
                    j += 1;
                }
                value = decode_entities(&source[val_start..j]);
                if j < tag_end {
                    j += 1;
                }
            } else {
                let val_start = j;
                while j < tag_end && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' && bytes[j] != b'/' {
                    j += 1;
                }
                value = decode_entities(&source[val_start..j]);
            }
        }
        i = j;
        if !attrs.iter().any(|(n, _)| n == &name) {
            attrs.push((name, value));
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_tree_with_attributes() {
        let doc = parse_html("<div id=\"root\"><span class='a b'>hi</span></div>");
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].tag, "div");
        assert_eq!(doc.nodes[0].attr("id"), Some("root"));
        assert_eq!(doc.nodes[1].parent_id, Some(0));
        assert_eq!(doc.nodes[1].text, "hi");
        assert_eq!(doc.nodes[0].text, "hi");
        assert_eq!(doc.nodes[0].max_depth, 1);
        assert_eq!(doc.nodes[1].max_depth, 0);
    }

    #[test]
    fn void_elements_never_open_a_content_span() {
        let doc = parse_html("<ul><li>a<br>b</li></ul>");
        let br = doc.nodes.iter().find(|n| n.tag == "br").unwrap();
        assert_eq!(br.inner_html, "");
        let li = doc.nodes.iter().find(|n| n.tag == "li").unwrap();
        assert_eq!(li.text, "ab");
    }

    #[test]
    fn recovers_from_unclosed_tags() {
        let doc = parse_html("<div><p>one<p>two</div>");
        let ps: Vec<_> = doc.nodes.iter().filter(|n| n.tag == "p").collect();
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].text, "one");
        assert_eq!(ps[1].text, "two");
    }

    #[test]
    fn stray_closing_tag_is_ignored() {
        let doc = parse_html("<div>hello</span></div>");
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].text, "hello");
    }

    #[test]
    fn script_content_is_not_parsed_as_markup() {
        let doc = parse_html("<script>if (a < b) { x(); }</script><p>after</p>");
        let script = &doc.nodes[0];
        assert_eq!(script.tag, "script");
        assert!(script.text.contains("a < b"));
        assert_eq!(doc.nodes[1].tag, "p");
    }

    #[test]
    fn sibling_pos_is_one_based_per_parent() {
        let doc = parse_html("<ul><li>a</li><li>b</li><li>c</li></ul>");
        let lis: Vec<_> = doc.nodes.iter().filter(|n| n.tag == "li").collect();
        assert_eq!(lis.iter().map(|n| n.sibling_pos).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
