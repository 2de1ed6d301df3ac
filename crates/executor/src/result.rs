// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The executor's output shape: one row per matched node (or relation
//! tuple), plus the optional `TO TABLE()` extraction result. Field maps
//! use `BTreeMap` rather than `HashMap` so row rendering is deterministic
//! independent of hashing, matching the engine's "same input, same output,
//! byte for byte" guarantee.

use std::collections::BTreeMap;

use markql_functions::Value;
use markql_ir::{ExportSink, TableOptions};
use serde::{Deserialize, Serialize};

/// One matched row. The node-identity fields are `None` for relation rows
/// assembled from more than one aliased source (there is no single node
/// identity for a join tuple); `computed_fields` carries `PROJECT`/
/// `FLATTEN_TEXT` bindings and relation-path column values alike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub node_id: Option<u32>,
    pub tag: Option<String>,
    pub text: Option<String>,
    pub inner_html: Option<String>,
    pub parent_id: Option<u32>,
    pub sibling_pos: Option<u32>,
    pub max_depth: Option<u32>,
    pub doc_order: Option<u32>,
    pub source_uri: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub computed_fields: BTreeMap<String, Value>,
    pub term_scores: BTreeMap<String, f64>,
}

impl ResultRow {
    pub fn from_node(node: &markql_html::HtmlNode, source_uri: Option<&str>) -> Self {
        Self {
            node_id: Some(node.id),
            tag: Some(node.tag.clone()),
            text: Some(node.text.clone()),
            inner_html: Some(node.inner_html.clone()),
            parent_id: node.parent_id,
            sibling_pos: Some(node.sibling_pos),
            max_depth: Some(node.max_depth),
            doc_order: Some(node.doc_order),
            source_uri: source_uri.map(str::to_string),
            attributes: node.attributes.iter().cloned().collect(),
            computed_fields: BTreeMap::new(),
            term_scores: BTreeMap::new(),
        }
    }
}

/// `TO TABLE()`'s extracted table, one of three shapes selected by
/// `TableOptions::format`/`sparse_shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableResult {
    Rect {
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    },
    SparseLong {
        cells: Vec<SparseCell>,
    },
    SparseWide {
        headers: Vec<String>,
        rows: Vec<BTreeMap<String, String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseCell {
    pub row_index: usize,
    pub col_index: usize,
    pub header: Option<String>,
    pub value: String,
}

/// The full result of executing one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Raw (un-normalized) projected column names, in projection order.
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub tables: Vec<TableResult>,
    pub to_list: bool,
    pub table_has_header: bool,
    pub table_options: Option<TableOptions>,
    pub export_sink: Option<ExportSink>,
    pub warnings: Vec<String>,
    pub truncated: bool,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
