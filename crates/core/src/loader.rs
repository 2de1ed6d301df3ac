// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The embedding-level `Loader` collaborator and the `Source` descriptor
//! [`execute_query_with_loader`](crate::execute_query_with_loader) accepts
//! in place of a pre-parsed document.
//!
//! The engine's semantic core is single-threaded and stateless (per the
//! concurrency model this crate sits on top of), so `Loader` here is kept
//! synchronous rather than `async_trait` — an embedder that needs async
//! I/O runs it on its own executor and hands `markql-core` the resulting
//! bytes; `markql-core` itself never blocks on a runtime it doesn't own.

pub use markql_executor::{Loader, RuntimeError};

/// Where to get the HTML document from when calling
/// [`crate::execute_query_with_loader`]. `Inline` skips the loader
/// entirely; `Path`/`Url` are handed to the caller's [`Loader`].
#[derive(Debug, Clone)]
pub enum SourceDescriptor {
    Inline(Vec<u8>),
    Path(String),
    Url(String),
}

/// A [`Loader`] that refuses every `Path`/`Url` request. For embedders
/// that only ever query inline/prepared documents and want a
/// compile-time-checked guarantee that no file or network access can
/// happen underneath them, rather than relying on a caller never
/// constructing a `Path`/`Url` source at runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoader;

impl Loader for NoopLoader {
    fn read_file(&self, path: &str, _timeout_ms: u64) -> Result<Vec<u8>, RuntimeError> {
        Err(RuntimeError::FileOpen {
            path: path.to_string(),
            reason: "this embedding does not permit file sources".to_string(),
        })
    }

    fn fetch_url(&self, _url: &str, _timeout_ms: u64) -> Result<Vec<u8>, RuntimeError> {
        Err(RuntimeError::UrlFetchingDisabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_loader_rejects_file_reads() {
        let err = NoopLoader.read_file("x.html", 1000).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn noop_loader_rejects_url_fetches() {
        let err = NoopLoader.fetch_url("https://example.com", 1000).unwrap_err();
        assert!(err.to_string().contains("URL fetching is disabled"));
    }
}
