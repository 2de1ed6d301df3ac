// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use serde::{Deserialize, Serialize};

/// One element in the flat node table. `id` equals the node's position in
/// `HtmlDocument::nodes` and equals its preorder/document-order index —
/// all three are the same number by construction, since nodes are pushed
/// in the order their opening tags are scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlNode {
    pub id: u32,
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated text of this node and all descendants, entities decoded.
    pub text: String,
    /// Raw inner HTML between this node's opening and closing tags, taken
    /// verbatim from the source (not re-serialized, not decoded).
    pub inner_html: String,
    pub parent_id: Option<u32>,
    pub doc_order: u32,
    /// 1-based position among this node's element siblings.
    pub sibling_pos: u32,
    /// Longest chain of descendant elements below this node; 0 for a leaf.
    pub max_depth: u32,
}

impl HtmlNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The parsed document: a flat arena of [`HtmlNode`]s plus the raw source
/// text they were sliced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlDocument {
    pub nodes: Vec<HtmlNode>,
    pub source_uri: Option<String>,
}

impl HtmlDocument {
    pub fn node(&self, id: u32) -> Option<&HtmlNode> {
        self.nodes.get(id as usize)
    }

    pub fn root_ids(&self) -> Vec<u32> {
        self.nodes.iter().filter(|n| n.parent_id.is_none()).map(|n| n.id).collect()
    }

    /// Adjacency list of element children, indexed by node id. Built on
    /// demand rather than maintained incrementally during parsing, since
    /// parent pointers are all the parser needs to compute in one pass.
    pub fn build_children(&self) -> Vec<Vec<u32>> {
        let mut children = vec![Vec::new(); self.nodes.len()];
        for node in &self.nodes {
            if let Some(parent) = node.parent_id {
                children[parent as usize].push(node.id);
            }
        }
        children
    }
}
