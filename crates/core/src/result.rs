// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The embedding surface's result shape: one flat `QueryResult` per call,
//! carrying rows *and* diagnostics side by side rather than an `Err`
//! variant a caller has to unwrap. A failed parse, a failed validation,
//! and a failed run all look the same from here: empty rows, a non-empty
//! `diagnostics`, `elapsed_ms` still populated.

use markql_diagnostics::{Diagnostic, DiagnosticSeverity};
use markql_executor::{ResultRow, TableResult};
use markql_ir::{ExportSink, TableOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub tables: Vec<TableResult>,
    pub to_list: bool,
    pub table_has_header: bool,
    pub table_options: Option<TableOptions>,
    pub export_sink: Option<ExportSink>,
    pub warnings: Vec<String>,
    pub truncated: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub elapsed_ms: u64,
}

impl QueryResult {
    /// True iff no diagnostic carries [`DiagnosticSeverity::Error`].
    /// Warnings/notes (e.g. the `FRAGMENTS` deprecation notice) don't
    /// count as failure.
    pub fn is_success(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub(crate) fn from_executor(inner: markql_executor::QueryResult, diagnostics: Vec<Diagnostic>, elapsed_ms: u64) -> Self {
        Self {
            columns: inner.columns,
            rows: inner.rows,
            tables: inner.tables,
            to_list: inner.to_list,
            table_has_header: inner.table_has_header,
            table_options: inner.table_options,
            export_sink: inner.export_sink,
            warnings: inner.warnings,
            truncated: inner.truncated,
            diagnostics,
            elapsed_ms,
        }
    }

    pub(crate) fn failed(diagnostics: Vec<Diagnostic>, elapsed_ms: u64) -> Self {
        Self { diagnostics, elapsed_ms, ..Self::default() }
    }
}
