// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MarkQL — Diagnostics
//!
//! Structured, stably-coded diagnostics shared by the parser, validator,
//! and executor. A [`Diagnostic`] carries a severity, a stable `MQL-*`
//! code, human help text, a doc pointer, and a rendered code frame — the
//! same shape whether it originates from a syntax error, a semantic
//! validation failure, or a runtime source-loading error.

mod builders;
mod codes;
mod diagnostic;
mod render;
mod severity;

pub use builders::is_runtime_io_message;
pub use diagnostic::{Diagnostic, DiagnosticRelated, DiagnosticSpan, span_from_bytes};
pub use render::{has_error_diagnostics, render_code_frame, render_diagnostics_json, render_diagnostics_text};
pub use severity::DiagnosticSeverity;
