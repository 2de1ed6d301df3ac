// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Tree navigation and DOM function dispatch shared by the node-oriented
//! and relation-oriented evaluators. Both `node_ctx::NodeContext` and
//! `relation::RelationContext` walk the same flat [`HtmlDocument`] arena,
//! so the axis-walking and `text`/`attr`/`inner_html`/... dispatch logic
//! lives here once instead of being duplicated per adapter.

use std::rc::Rc;

use markql_functions::Value;
use markql_html::{HtmlDocument, HtmlNode, limit_inner_html, minify_html};
use markql_ir::{Axis, ScalarExpr, ScalarExprKind};

use crate::error::RuntimeError;

/// A document plus its on-demand-built child adjacency. `Rc`-owned rather
/// than borrowed: relation rows keep a `TreeIndex` alive per alias for the
/// whole statement (CTE materialization, joins, `ORDER BY`), well past the
/// scope in which any one source was resolved, so ownership is simpler
/// than threading a borrow through every downstream stage.
pub struct TreeIndex {
    pub doc: Rc<HtmlDocument>,
    children: Vec<Vec<u32>>,
}

impl TreeIndex {
    pub fn new(doc: Rc<HtmlDocument>) -> Self {
        let children = doc.build_children();
        Self { doc, children }
    }

    pub fn node(&self, id: u32) -> &HtmlNode {
        self.doc.node(id).expect("node id out of range")
    }

    pub fn children_of(&self, id: u32) -> &[u32] {
        &self.children[id as usize]
    }

    fn ancestors_of(&self, id: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = self.node(id).parent_id;
        while let Some(p) = cur {
            out.push(p);
            cur = self.node(p).parent_id;
        }
        out
    }

    fn collect_descendants(&self, id: u32, out: &mut Vec<u32>) {
        for &child in self.children_of(id) {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    pub fn descendants_of(&self, id: u32) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    /// Nodes reachable from `id` along `axis`, in the axis's natural
    /// order (nearest-ancestor-first, child/descendant in document
    /// order). A bare axis-qualified [`markql_ir::Operand`] resolves
    /// against the first of these; `EXISTS` quantifies over all of them.
    pub fn axis_nodes(&self, id: u32, axis: Axis) -> Vec<u32> {
        match axis {
            Axis::SelfAxis => vec![id],
            Axis::Parent => self.node(id).parent_id.into_iter().collect(),
            Axis::Child => self.children_of(id).to_vec(),
            Axis::Ancestor => self.ancestors_of(id),
            Axis::Descendant => self.descendants_of(id),
        }
    }

    /// The node's own direct text, excluding descendant markup: depth-0
    /// `limit_inner_html` keeps a fragment's own text and drops every
    /// child element.
    pub fn direct_text(&self, id: u32) -> String {
        limit_inner_html(&self.node(id).inner_html, 0)
    }
}

fn arg_tag(arg: &ScalarExpr) -> Option<&str> {
    match &arg.kind {
        ScalarExprKind::StringLiteral(t) => Some(t.as_str()),
        _ => None,
    }
}

fn arg_text(arg: &ScalarExpr) -> String {
    match &arg.kind {
        ScalarExprKind::StringLiteral(s) => s.clone(),
        ScalarExprKind::NumberLiteral(n) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_depth_arg(arg: Option<&ScalarExpr>) -> usize {
    match arg.map(|a| &a.kind) {
        Some(ScalarExprKind::NumberLiteral(n)) => (*n).max(0) as usize,
        Some(ScalarExprKind::StringLiteral(s)) if s.eq_ignore_ascii_case("MAX_DEPTH") => usize::MAX,
        _ => usize::MAX,
    }
}

pub fn matches_for(tree: &TreeIndex, context_id: u32, target_arg: &ScalarExpr) -> Vec<u32> {
    if matches!(target_arg.kind, ScalarExprKind::SelfRef(_)) {
        return vec![context_id];
    }
    let tag = arg_tag(target_arg).unwrap_or_default();
    tree.descendants_of(context_id)
        .into_iter()
        .filter(|&id| tree.node(id).tag.eq_ignore_ascii_case(tag))
        .collect()
}

fn join_field(tree: &TreeIndex, ids: &[u32], f: impl Fn(&HtmlNode) -> String) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    Some(ids.iter().map(|&id| f(tree.node(id))).collect::<Vec<_>>().join(" "))
}

fn first_value(tree: &TreeIndex, ids: &[u32], f: impl Fn(&HtmlNode) -> String) -> Option<String> {
    ids.first().map(|&id| f(tree.node(id)))
}

fn last_value(tree: &TreeIndex, ids: &[u32], f: impl Fn(&HtmlNode) -> String) -> Option<String> {
    ids.last().map(|&id| f(tree.node(id)))
}

/// Dispatches one of the nine DOM accessor functions against `context_id`.
/// `args[0]` is always `self` or a literal tag name (the grammar has no
/// other shape for a DOM function's first argument); `text`/`direct_text`
/// concatenate every matching descendant (space-joined) to distinguish
/// them from `first_text`/`last_text`, which pick one match by position;
/// `inner_html`/`raw_inner_html`/`attr` resolve against the first match,
/// mirroring `first_attr`'s unscoped "first in document order" semantics.
pub fn call_dom_function(tree: &TreeIndex, context_id: u32, name: &str, args: &[ScalarExpr]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::other(format!("{name}() requires at least one argument")));
    }
    let matches = matches_for(tree, context_id, &args[0]);
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "text" => Ok(Value::from(join_field(tree, &matches, |n| n.text.clone()))),
        "direct_text" => Ok(Value::from(join_field(tree, &matches, |n| limit_inner_html(&n.inner_html, 0)))),
        "inner_html" => {
            let depth = parse_depth_arg(args.get(1));
            Ok(Value::from(first_value(tree, &matches, |n| {
                minify_html(&limit_inner_html(&n.inner_html, depth))
            })))
        }
        "raw_inner_html" => {
            let depth = parse_depth_arg(args.get(1));
            Ok(Value::from(first_value(tree, &matches, |n| limit_inner_html(&n.inner_html, depth))))
        }
        "attr" => {
            let attr_name = args.get(1).map(arg_text).unwrap_or_default();
            Ok(Value::from(first_value(tree, &matches, |n| {
                n.attr(&attr_name).unwrap_or_default().to_string()
            })))
        }
        "first_text" => Ok(Value::from(first_value(tree, &matches, |n| n.text.clone()))),
        "last_text" => Ok(Value::from(last_value(tree, &matches, |n| n.text.clone()))),
        "first_attr" => {
            let attr_name = args.get(1).map(arg_text).unwrap_or_default();
            Ok(Value::from(first_value(tree, &matches, |n| {
                n.attr(&attr_name).unwrap_or_default().to_string()
            })))
        }
        "last_attr" => {
            let attr_name = args.get(1).map(arg_text).unwrap_or_default();
            Ok(Value::from(last_value(tree, &matches, |n| {
                n.attr(&attr_name).unwrap_or_default().to_string()
            })))
        }
        other => Err(RuntimeError::other(format!("Unknown DOM function '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_html::parse_html;
    use markql_ir::Span;

    fn string_arg(s: &str) -> ScalarExpr {
        ScalarExpr::string(s, Span::new(0, 0))
    }

    #[test]
    fn text_concatenates_every_matching_descendant() {
        let doc = parse_html("<ul><li>a</li><li>b</li></ul>");
        let root = doc.nodes.iter().find(|n| n.tag == "ul").unwrap().id;
        let tree = TreeIndex::new(Rc::new(doc));
        let value = call_dom_function(&tree, root, "text", &[string_arg("li")]).unwrap();
        assert_eq!(value, Value::text("a b"));
    }

    #[test]
    fn first_text_picks_the_first_match_only() {
        let doc = parse_html("<ul><li>a</li><li>b</li></ul>");
        let root = doc.nodes.iter().find(|n| n.tag == "ul").unwrap().id;
        let tree = TreeIndex::new(Rc::new(doc));
        let value = call_dom_function(&tree, root, "first_text", &[string_arg("li")]).unwrap();
        assert_eq!(value, Value::text("a"));
    }

    #[test]
    fn attr_with_no_match_is_null() {
        let doc = parse_html("<div></div>");
        let root = doc.nodes[0].id;
        let tree = TreeIndex::new(Rc::new(doc));
        let value = call_dom_function(&tree, root, "attr", &[string_arg("span"), string_arg("id")]).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn direct_text_excludes_child_markup() {
        let doc = parse_html("<div>hello<b>bold</b></div>");
        let root = doc.nodes[0].id;
        let tree = TreeIndex::new(Rc::new(doc));
        let value = call_dom_function(&tree, root, "direct_text", &[ScalarExpr::self_ref(Span::new(0, 0))]).unwrap();
        assert_eq!(value, Value::text("hello"));
    }
}
