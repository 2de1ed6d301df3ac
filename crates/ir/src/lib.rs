// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MarkQL — Intermediate Representation
//!
//! This crate provides the Intermediate Representation (IR) for MarkQL
//! statements. The IR is designed to:
//! - Carry full source spans on every node, for precise diagnostics.
//! - Be the single shared vocabulary between the parser, the validator,
//!   and both executor paths (node-oriented and relation-oriented).
//! - Represent `SELECT`/`SHOW`/`DESCRIBE` statements, subquery sources
//!   (`PARSE`, `FRAGMENTS`, derived tables, CTEs), and the full predicate
//!   and scalar expression language in one tree.

pub mod expr;
pub mod query;
pub mod span;

pub use expr::{
    Axis, BinaryExpr, CompareExpr, CompareOp, Expr, ExistsExpr, FieldKind, LogicalOp, Operand,
    ScalarExpr, ScalarExprKind, SelfRef, ValueList,
};
pub use query::{
    Aggregate, CteDef, EmptyIs, ExportKind, ExportSink, FlattenExtractExpr, FlattenExtractKind,
    JoinItem, JoinType, OrderBy, Query, QueryKind, SelectItem, Source, SourceKind, SparseShape,
    TableFormat, TableOptions, TfidfStopwords, TrimEmptyCols, WithClause,
};
pub use span::Span;
