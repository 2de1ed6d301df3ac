// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query
//!
//! This module represents a complete MarkQL statement in the IR.
//!
//! ## Design
//!
//! A [`Query`] is the root of the IR. Every MarkQL statement — a `SELECT`
//! against a document, a `SHOW`/`DESCRIBE` introspection query, or a
//! derived-table/CTE body nested inside another query — is represented by
//! the same `Query` struct; [`QueryKind`] distinguishes the handful of
//! statement shapes.
//!
//! ## Examples
//!
//! ### Plain selection
//! ```text
//! SELECT ul FROM document WHERE attributes.id = 'c'
//! ```
//!
//! ### CTE + join
//! ```text
//! WITH rows AS (SELECT tr FROM document WHERE tag = 'tr')
//! SELECT rows.tag, items.tag
//! FROM rows
//! LEFT JOIN items AS items ON rows.node_id = items.parent_id
//! ```
//!
//! ### Table extraction
//! ```text
//! SELECT table FROM document WHERE attributes.id = 'prices' TO TABLE()
//! ```

use serde::{Deserialize, Serialize};

use crate::expr::{Expr, ScalarExpr};
use crate::span::Span;

/// What shape of statement a [`Query`] represents.
///
/// `Select` covers the overwhelming majority of statements; the `Show*`
/// and `Describe*` variants are introspection queries that execute
/// against engine metadata (the function registry, the axis/operator
/// vocabulary) or a document's shape rather than walking for row matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    Select,
    ShowInput,
    ShowInputs,
    ShowFunctions,
    ShowAxes,
    ShowOperators,
    DescribeDoc,
    DescribeLanguage,
}

/// Where a query's rows come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceKind {
    /// The caller-supplied document (`FROM document` / `FROM doc`).
    Document,
    /// A filesystem path, resolved through the `Loader` collaborator.
    Path,
    /// An `http(s)://` URL, resolved through the `Loader` collaborator.
    Url,
    /// An inline `RAW('<html>...</html>')` literal.
    RawHtml,
    /// `FRAGMENTS(...)` — deprecated alias of `Parse`.
    Fragments,
    /// `PARSE(expr|select)` — evaluates its argument to HTML and reparses.
    Parse,
    /// A reference to an earlier `WITH` binding.
    CteRef,
    /// A parenthesized `(SELECT ...) AS alias` derived table.
    DerivedSubquery,
}

/// A `FROM`/`JOIN` source: what kind it is, plus the kind-specific payload.
///
/// Exactly one of the optional fields is populated, selected by `kind`:
/// `value` holds the literal path/url/raw-html text or the CTE/alias name;
/// `fragments_query`/`parse_query`/`derived_query` hold a nested
/// [`Query`] when the source is itself a subquery; `parse_expr` holds a
/// scalar expression when `PARSE(...)` is given an expression instead of a
/// `SELECT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub kind: SourceKind,
    pub value: String,
    pub alias: Option<String>,
    pub fragments_query: Option<Box<Query>>,
    pub fragments_raw: Option<String>,
    pub parse_query: Option<Box<Query>>,
    pub parse_expr: Option<Box<ScalarExpr>>,
    pub derived_query: Option<Box<Query>>,
    pub span: Span,
}

impl Source {
    pub fn new(kind: SourceKind, span: Span) -> Self {
        Self {
            kind,
            value: String::new(),
            alias: None,
            fragments_query: None,
            fragments_raw: None,
            parse_query: None,
            parse_expr: None,
            derived_query: None,
            span,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The alias under which this source's rows are addressed, falling
    /// back to the implicit `doc` name for an unaliased `Document` source.
    pub fn effective_alias(&self) -> &str {
        match &self.alias {
            Some(alias) => alias.as_str(),
            None if matches!(self.kind, SourceKind::Document) => "doc",
            None => self.value.as_str(),
        }
    }
}

/// A single `name AS (...)` binding inside a `WITH` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CteDef {
    pub name: String,
    pub query: Box<Query>,
    pub span: Span,
}

/// `WITH cte1 AS (...), cte2 AS (...)`, ordered as written — later CTEs
/// may reference earlier ones via [`SourceKind::CteRef`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WithClause {
    pub ctes: Vec<CteDef>,
    pub span: Span,
}

/// `[INNER|LEFT|CROSS] [LATERAL] JOIN source AS alias [ON expr]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinItem {
    pub join_type: JoinType,
    pub right_source: Source,
    pub on: Option<Expr>,
    pub lateral: bool,
    pub span: Span,
}

/// `TO CSV(...)`/`TO PARQUET(...)`/`TO JSON(...)`/`TO NDJSON(...)` — bulk
/// export sink. The file-writing side is an out-of-scope collaborator
/// (§6); the IR only records the requested kind and destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    None,
    Csv,
    Parquet,
    Json,
    Ndjson,
}

impl Default for ExportKind {
    fn default() -> Self {
        ExportKind::None
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportSink {
    pub kind: ExportKind,
    pub path: String,
    pub span: Span,
}

/// `ORDER BY field [ASC|DESC]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
    pub span: Span,
}

/// How a missing/empty table cell is classified for `trim_empty_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyIs {
    BlankOrNull,
    NullOnly,
    BlankOnly,
}

impl Default for EmptyIs {
    fn default() -> Self {
        EmptyIs::BlankOrNull
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimEmptyCols {
    Off,
    Trailing,
    All,
}

impl Default for TrimEmptyCols {
    fn default() -> Self {
        TrimEmptyCols::Off
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableFormat {
    Rect,
    Sparse,
}

impl Default for TableFormat {
    fn default() -> Self {
        TableFormat::Rect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SparseShape {
    Long,
    Wide,
}

impl Default for SparseShape {
    fn default() -> Self {
        SparseShape::Long
    }
}

/// Tuning knobs for `TO TABLE(...)` extraction, populated from parenthesized
/// option lists in the source text (e.g. `TO TABLE(TRIM_EMPTY_COLS=ALL)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    pub trim_empty_cols: TrimEmptyCols,
    pub empty_is: EmptyIs,
    pub format: TableFormat,
    pub sparse_shape: SparseShape,
    pub trim_empty_rows: bool,
    pub stop_after_empty_rows: usize,
    pub header_normalize: bool,
    pub header_normalize_explicit: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            trim_empty_cols: TrimEmptyCols::default(),
            empty_is: EmptyIs::default(),
            format: TableFormat::default(),
            sparse_shape: SparseShape::default(),
            trim_empty_rows: false,
            stop_after_empty_rows: 0,
            header_normalize: true,
            header_normalize_explicit: false,
        }
    }
}

/// Which aggregate (if any) a [`SelectItem`] requests. Aggregates stand
/// alone: a query may not mix an aggregate item with a tag-only or
/// projected item (enforced by the validator, not here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregate {
    None,
    Count,
    Summarize,
    Tfidf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TfidfStopwords {
    English,
    None,
}

impl Default for TfidfStopwords {
    fn default() -> Self {
        TfidfStopwords::English
    }
}

/// One leaf of a `PROJECT(...)`/`FLATTEN_EXTRACT(...)` alias-expression
/// list. Distinct from [`ScalarExpr`] because it additionally supports
/// the projection-only forms `TEXT(tag)`/`ATTR(tag, name)` scoped to a
/// specific descendant tag, and a `CASE WHEN` ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlattenExtractKind {
    Text,
    Attr,
    Coalesce,
    FunctionCall,
    StringLiteral,
    NumberLiteral,
    NullLiteral,
    AliasRef,
    OperandRef,
    CaseWhen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenExtractExpr {
    pub kind: FlattenExtractKind,
    pub tag: String,
    pub attribute: Option<String>,
    pub where_clause: Option<Box<Expr>>,
    pub selector_index: Option<i64>,
    pub selector_last: bool,
    pub args: Vec<FlattenExtractExpr>,
    pub function_name: String,
    pub string_value: String,
    pub number_value: i64,
    pub alias_ref: String,
    pub operand: Option<crate::expr::Operand>,
    pub case_when_conditions: Vec<Expr>,
    pub case_when_values: Vec<FlattenExtractExpr>,
    pub case_else: Option<Box<FlattenExtractExpr>>,
    pub span: Span,
}

impl FlattenExtractExpr {
    pub fn new(kind: FlattenExtractKind, span: Span) -> Self {
        Self {
            kind,
            tag: String::new(),
            attribute: None,
            where_clause: None,
            selector_index: None,
            selector_last: false,
            args: Vec::new(),
            function_name: String::new(),
            string_value: String::new(),
            number_value: 0,
            alias_ref: String::new(),
            operand: None,
            case_when_conditions: Vec::new(),
            case_when_values: Vec::new(),
            case_else: None,
            span,
        }
    }
}

/// One item of a `SELECT` list.
///
/// A `SelectItem` is one of several shapes, distinguished by the flags and
/// optional fields present rather than by an enum — this mirrors the
/// grammar, where `tag`, an aggregate, `PROJECT(...)`, and a bare scalar
/// expression are mutually exclusive but share most downstream plumbing
/// (an optional `AS alias`, `TRIM`, wrapper functions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub aggregate: Aggregate,
    pub tfidf_stopwords: TfidfStopwords,
    /// Target tag for a tag-only item, or the scoped tag for TFIDF/
    /// FLATTEN_TEXT/PROJECT.
    pub tag: String,
    pub tfidf_tags: Vec<String>,
    pub field: Option<String>,
    pub tfidf_all_tags: bool,
    pub tfidf_top_terms: usize,
    pub tfidf_min_df: usize,
    pub tfidf_max_df: usize,
    pub inner_html_depth: Option<usize>,
    pub inner_html_auto_depth: bool,
    pub inner_html_function: bool,
    pub raw_inner_html_function: bool,
    pub text_function: bool,
    pub direct_text_function: bool,
    pub trim: bool,
    pub flatten_text: bool,
    pub flatten_extract: bool,
    pub expr_projection: bool,
    pub flatten_depth: Option<usize>,
    pub flatten_aliases: Vec<String>,
    pub flatten_extract_aliases: Vec<String>,
    pub flatten_extract_exprs: Vec<FlattenExtractExpr>,
    pub expr: Option<ScalarExpr>,
    pub project_expr: Option<FlattenExtractExpr>,
    pub alias: Option<String>,
    pub span: Span,
}

impl SelectItem {
    /// A bare `tag` projection, e.g. the `div` in `SELECT div FROM ...`.
    pub fn tag_only(tag: impl Into<String>, span: Span) -> Self {
        Self {
            aggregate: Aggregate::None,
            tfidf_stopwords: TfidfStopwords::default(),
            tag: tag.into(),
            tfidf_tags: Vec::new(),
            field: None,
            tfidf_all_tags: false,
            tfidf_top_terms: 30,
            tfidf_min_df: 1,
            tfidf_max_df: 0,
            inner_html_depth: None,
            inner_html_auto_depth: false,
            inner_html_function: false,
            raw_inner_html_function: false,
            text_function: false,
            direct_text_function: false,
            trim: false,
            flatten_text: false,
            flatten_extract: false,
            expr_projection: false,
            flatten_depth: None,
            flatten_aliases: Vec::new(),
            flatten_extract_aliases: Vec::new(),
            flatten_extract_exprs: Vec::new(),
            expr: None,
            project_expr: None,
            alias: None,
            span,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Whether this item is a star projection (`SELECT *`).
    pub fn is_star(&self) -> bool {
        self.tag == "*"
    }
}

/// A full MarkQL statement.
///
/// See the module documentation for examples; field-by-field semantics
/// are defined in the data model section of the engine specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub kind: QueryKind,
    pub with: Option<WithClause>,
    pub select_items: Vec<SelectItem>,
    pub source: Source,
    pub joins: Vec<JoinItem>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub exclude_fields: Vec<String>,
    pub limit: Option<usize>,
    pub to_list: bool,
    pub to_table: bool,
    pub table_has_header: bool,
    pub table_options: TableOptions,
    pub export_sink: Option<ExportSink>,
    pub span: Span,
}

impl Query {
    pub fn new(source: Source, span: Span) -> Self {
        Self {
            kind: QueryKind::Select,
            with: None,
            select_items: Vec::new(),
            source,
            joins: Vec::new(),
            where_clause: None,
            order_by: Vec::new(),
            exclude_fields: Vec::new(),
            limit: None,
            to_list: false,
            to_table: false,
            table_has_header: true,
            table_options: TableOptions::default(),
            export_sink: None,
            span,
        }
    }

    pub fn with_kind(mut self, kind: QueryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_select_items(mut self, items: Vec<SelectItem>) -> Self {
        self.select_items = items;
        self
    }

    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    /// Whether this statement needs the relation-oriented executor rather
    /// than the simpler node-oriented path (§4.6 of the specification):
    /// any `WITH`, any join, a CTE/derived source, or an `alias.field`
    /// qualifier in `ORDER BY`.
    pub fn requires_relation_path(&self) -> bool {
        if self.with.is_some() || !self.joins.is_empty() {
            return true;
        }
        if matches!(
            self.source.kind,
            SourceKind::CteRef | SourceKind::DerivedSubquery
        ) {
            return true;
        }
        self.order_by
            .iter()
            .any(|ob| ob.field.contains('.') && !ob.field.starts_with("doc."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_source_defaults_to_implicit_doc_alias() {
        let source = Source::new(SourceKind::Document, Span::new(0, 0));
        assert_eq!(source.effective_alias(), "doc");
    }

    #[test]
    fn aliased_source_overrides_effective_alias() {
        let source = Source::new(SourceKind::Document, Span::new(0, 0)).with_alias("d");
        assert_eq!(source.effective_alias(), "d");
    }

    #[test]
    fn plain_select_does_not_require_relation_path() {
        let query = Query::new(
            Source::new(SourceKind::Document, Span::new(0, 0)),
            Span::new(0, 10),
        );
        assert!(!query.requires_relation_path());
    }

    #[test]
    fn join_forces_relation_path() {
        let mut query = Query::new(
            Source::new(SourceKind::Document, Span::new(0, 0)),
            Span::new(0, 10),
        );
        query.joins.push(JoinItem {
            join_type: JoinType::Inner,
            right_source: Source::new(SourceKind::Document, Span::new(0, 0)),
            on: None,
            lateral: false,
            span: Span::new(0, 0),
        });
        assert!(query.requires_relation_path());
    }
}
