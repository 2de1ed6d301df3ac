// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The public entry points: parse, validate, execute, and turn every
//! failure mode into [`Diagnostic`]s rather than an `Err`. Each function
//! here is a thin orchestration over `markql-parser` -> `markql-semantic`
//! -> `markql-executor`; none of them contain query-processing logic of
//! their own.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use markql_diagnostics::{Diagnostic, is_runtime_io_message};
use markql_executor::{EngineConfig, Loader, RuntimeError};
use markql_html::{HtmlDocument, parse_html};
use markql_ir::Query;

use crate::loader::{NoopLoader, SourceDescriptor};
use crate::prepared::PreparedHandle;
use crate::result::QueryResult;

/// Parses and validates `query_text`, returning the parsed
/// [`Query`](markql_ir::Query) on success or the diagnostics describing
/// why it failed.
fn parse_and_validate(query_text: &str) -> Result<Query, Vec<Diagnostic>> {
    let query = match markql_parser::parse(query_text) {
        Ok(query) => query,
        Err(err) => return Err(vec![Diagnostic::syntax(query_text, err.message, err.pos)]),
    };
    let violations = markql_semantic::validate(&query);
    if violations.is_empty() {
        Ok(query)
    } else {
        Err(violations.into_iter().map(|v| Diagnostic::semantic(query_text, v.message)).collect())
    }
}

/// Maps a caught [`RuntimeError`] to a diagnostic. Most runtime
/// failures are genuine I/O problems (`MQL-RUN-####`); a handful of
/// `RuntimeError` variants (duplicate alias, unknown identifier, a
/// `LATERAL` source missing its alias) are binding checks the
/// relation-path evaluates lazily during execution rather than
/// statically, so they render as semantic diagnostics instead.
fn runtime_error_to_diagnostic(query_text: &str, err: RuntimeError) -> Diagnostic {
    let message = err.to_string();
    if is_runtime_io_message(&message) {
        Diagnostic::runtime(query_text, message)
    } else {
        Diagnostic::semantic(query_text, message)
    }
}

fn run_against(query: &Query, document: Rc<HtmlDocument>, loader: &dyn Loader, config: &EngineConfig) -> Result<markql_executor::QueryResult, RuntimeError> {
    markql_executor::execute(query, document, loader, config)
}

/// Parses, validates, and executes `query_text` against the document
/// parsed from `html_bytes`. No `Path`/`Url` source is reachable (the
/// [`NoopLoader`] rejects them), matching the "no filesystem/network
/// access expected" contract of an in-memory document.
pub fn execute_query(html_bytes: &[u8], source_uri: Option<&str>, query_text: &str) -> QueryResult {
    tracing::debug!(bytes = html_bytes.len(), "execute_query: parsing inline document");
    let start = Instant::now();
    let text = String::from_utf8_lossy(html_bytes);
    let mut document = parse_html(&text);
    if let Some(uri) = source_uri {
        document = document.with_source_uri(uri.to_string());
    }
    execute_parsed(query_text, Rc::new(document), &NoopLoader, &EngineConfig::default(), start)
}

/// Like [`execute_query`], but the document comes from a
/// [`SourceDescriptor`] resolved through the caller's `loader`
/// (`Path`/`Url` sources go through it; `Inline` is parsed directly).
/// `timeout_ms` bounds the loader call for `Path`/`Url`.
pub fn execute_query_with_loader(source: SourceDescriptor, query_text: &str, timeout_ms: u64, loader: &dyn Loader) -> QueryResult {
    let start = Instant::now();
    let document = match source {
        SourceDescriptor::Inline(bytes) => {
            tracing::debug!(bytes = bytes.len(), "execute_query_with_loader: inline source");
            let text = String::from_utf8_lossy(&bytes);
            Ok(parse_html(&text))
        }
        SourceDescriptor::Path(path) => {
            tracing::debug!(path = %path, timeout_ms, "execute_query_with_loader: loading path source");
            loader.read_file(&path, timeout_ms).map(|bytes| {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                parse_html(&text).with_source_uri(path)
            })
        }
        SourceDescriptor::Url(url) => {
            tracing::debug!(url = %url, timeout_ms, "execute_query_with_loader: loading url source");
            loader.fetch_url(&url, timeout_ms).map(|bytes| {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                parse_html(&text).with_source_uri(url)
            })
        }
    };
    match document {
        Ok(document) => {
            let config = EngineConfig { default_timeout_ms: timeout_ms, ..EngineConfig::default() };
            execute_parsed(query_text, Rc::new(document), loader, &config, start)
        }
        Err(err) => QueryResult::failed(vec![runtime_error_to_diagnostic(query_text, err)], elapsed_ms(start)),
    }
}

/// Runs `query_text` against an already-[`prepare_document`](crate::prepare_document)d
/// handle. Cheap to call repeatedly: no re-parsing of the HTML, only the
/// query text.
pub fn execute_with_prepared(handle: &PreparedHandle, query_text: &str) -> QueryResult {
    tracing::debug!(digest = handle.digest(), "execute_with_prepared");
    let start = Instant::now();
    let document: Arc<HtmlDocument> = handle.document();
    // `markql_executor::execute` takes an `Rc`, not an `Arc`: execution
    // itself stays on one thread even though the handle that feeds it may
    // be shared across several. Cloning the document here is the seam
    // between the thread-safe handle and the single-threaded engine.
    let document = Rc::new((*document).clone());
    execute_parsed(query_text, document, &NoopLoader, &EngineConfig::default(), start)
}

fn execute_parsed(query_text: &str, document: Rc<HtmlDocument>, loader: &dyn Loader, config: &EngineConfig, start: Instant) -> QueryResult {
    let query = match parse_and_validate(query_text) {
        Ok(query) => query,
        Err(diagnostics) => return QueryResult::failed(diagnostics, elapsed_ms(start)),
    };
    match run_against(&query, document, loader, config) {
        Ok(inner) => QueryResult::from_executor(inner, Vec::new(), elapsed_ms(start)),
        Err(err) => QueryResult::failed(vec![runtime_error_to_diagnostic(query_text, err)], elapsed_ms(start)),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Parses and validates `query_text` without running it, collecting
/// every syntax/semantic violation. Empty iff the query is valid.
pub fn lint_query(query_text: &str) -> Vec<Diagnostic> {
    match parse_and_validate(query_text) {
        Ok(_) => Vec::new(),
        Err(diagnostics) => diagnostics,
    }
}

/// Wraps a raw `error_message` a caller captured some other way (e.g.
/// from a previous call's `QueryResult::diagnostics` rendered to text
/// and logged, then replayed) back into a structured [`Diagnostic`],
/// located against `query_text` with the same best-effort span recovery
/// `markql-diagnostics` uses internally.
pub fn diagnose_failure(query_text: &str, error_message: &str) -> Vec<Diagnostic> {
    if is_runtime_io_message(error_message) {
        vec![Diagnostic::runtime(query_text, error_message.to_string())]
    } else {
        vec![Diagnostic::semantic(query_text, error_message.to_string())]
    }
}
