// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! [`PreparedHandle`]: a pre-parsed document an embedder can run many
//! queries against without re-parsing the HTML each time.
//!
//! The handle is opaque, immutable, and reference-counted so it can be
//! cloned cheaply and shared across threads; the LRU cache that keys
//! handles by [`PreparedHandle::digest`] lives in the embedder (a REPL,
//! an agent loop), not here — this crate only has to make handles cheap
//! to hold and safe to hand around, not decide when to evict one.

use std::sync::Arc;

use markql_html::{HtmlDocument, parse_html};

use crate::digest::digest_bytes;

/// A parsed document plus the digest it was parsed from. `Arc` (not
/// `Rc`) because the embedder's cache may be shared across threads even
/// though any single query execution stays on one thread.
#[derive(Debug, Clone)]
pub struct PreparedHandle {
    document: Arc<HtmlDocument>,
    digest: u64,
}

impl PreparedHandle {
    /// The FNV-1a digest of the original `html_bytes`, stable for
    /// identical input. Intended as an embedder's cache key, not as a
    /// content hash for authentication.
    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub(crate) fn document(&self) -> Arc<HtmlDocument> {
        Arc::clone(&self.document)
    }
}

/// Parses `html_bytes` once, wrapping the result in an opaque, shareable
/// [`PreparedHandle`]. `source_uri`, if given, is attached so
/// `source_uri`-carrying result rows reflect where the document came
/// from.
pub fn prepare_document(html_bytes: &[u8], source_uri: Option<&str>) -> PreparedHandle {
    let digest = digest_bytes(html_bytes);
    tracing::debug!(bytes = html_bytes.len(), digest, "prepare_document");
    let text = String::from_utf8_lossy(html_bytes);
    let mut document = parse_html(&text);
    if let Some(uri) = source_uri {
        document = document.with_source_uri(uri.to_string());
    }
    PreparedHandle { document: Arc::new(document), digest }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepares_a_document_and_records_its_digest() {
        let handle = prepare_document(b"<div>x</div>", None);
        assert_eq!(handle.digest(), digest_bytes(b"<div>x</div>"));
        assert_eq!(handle.document().nodes.len(), 1);
    }

    #[test]
    fn attaches_the_given_source_uri() {
        let handle = prepare_document(b"<div></div>", Some("file:///a.html"));
        assert_eq!(handle.document().source_uri.as_deref(), Some("file:///a.html"));
    }

    #[test]
    fn identical_bytes_prepare_to_the_same_digest() {
        let a = prepare_document(b"<p>hi</p>", None);
        let b = prepare_document(b"<p>hi</p>", None);
        assert_eq!(a.digest(), b.digest());
    }
}
