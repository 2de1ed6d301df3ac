// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Runtime failure types and the `Loader` collaborator that resolves
//! `Path`/`Url` sources.
//!
//! Message wording on the IO-shaped variants matters: `markql-diagnostics`
//! classifies a runtime message as `MQL-RUN-0002` (vs. the generic
//! `MQL-RUN-0001`) by checking for the exact substrings "Failed to open
//! file", "Failed to fetch URL", "URL fetching is disabled", and
//! "Unsupported Content-Type" — see `markql_diagnostics::is_runtime_io_message`.
//! Every variant here that represents a source-loading failure is worded
//! to contain one of those substrings.

use std::fmt;

/// Resolves `Path`/`Url` sources. The executor core performs no I/O on its
/// own; every read goes through this collaborator so embedders can sandbox,
/// cache, or mock it.
pub trait Loader: Send + Sync {
    fn read_file(&self, path: &str, timeout_ms: u64) -> Result<Vec<u8>, RuntimeError>;
    fn fetch_url(&self, url: &str, timeout_ms: u64) -> Result<Vec<u8>, RuntimeError>;
}

/// A `Loader` that rejects every Path/Url source. The default for callers
/// using [`crate::execute`] directly against an in-memory document, where
/// no filesystem/network access is expected or wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLoader;

impl Loader for NullLoader {
    fn read_file(&self, path: &str, _timeout_ms: u64) -> Result<Vec<u8>, RuntimeError> {
        Err(RuntimeError::FileOpen {
            path: path.to_string(),
            reason: "file loading is disabled for this embedding".to_string(),
        })
    }

    fn fetch_url(&self, _url: &str, _timeout_ms: u64) -> Result<Vec<u8>, RuntimeError> {
        Err(RuntimeError::UrlFetchingDisabled)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("Failed to open file '{path}': {reason}")]
    FileOpen { path: String, reason: String },

    #[error("Failed to fetch URL '{url}': {reason}")]
    UrlFetch { url: String, reason: String },

    #[error("URL fetching is disabled for this embedding")]
    UrlFetchingDisabled,

    #[error("Unsupported Content-Type '{content_type}' for source '{source}'")]
    UnsupportedContentType { content_type: String, source: String },

    #[error("Loader request for '{0}' timed out")]
    Timeout(String),

    #[error("PARSE()/FRAGMENTS() fragment exceeds the maximum size of {0} bytes")]
    FragmentTooLarge(usize),

    #[error("PARSE()/FRAGMENTS() produced more than {0} fragments")]
    TooManyFragments(usize),

    #[error("PARSE()/FRAGMENTS() total fragment size exceeds {0} bytes")]
    TotalSizeExceeded(usize),

    #[error("Duplicate source alias '{0}' in this FROM/JOIN chain")]
    DuplicateAlias(String),

    #[error("Unknown identifier '{identifier}'; expected one of the bound source aliases: {bound}")]
    UnknownIdentifier { identifier: String, bound: String },

    #[error("Identifier 'doc' is not bound in this query; did you mean '{0}'?")]
    DocNotBound(String),

    #[error("LATERAL source requires an alias")]
    LateralRequiresAlias,

    #[error(transparent)]
    Call(#[from] markql_functions::CallError),

    #[error("{0}")]
    Other(String),
}

impl RuntimeError {
    pub fn other(message: impl Into<String>) -> Self {
        RuntimeError::Other(message.into())
    }
}

impl fmt::Display for NullLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NullLoader")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_loader_file_message_is_classified_as_io() {
        let err = NullLoader.read_file("missing.html", 1000).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn null_loader_url_message_is_classified_as_io() {
        let err = NullLoader.fetch_url("https://example.com", 1000).unwrap_err();
        assert!(err.to_string().contains("URL fetching is disabled"));
    }
}
