// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Document acquisition: resolving a `FROM`/`JOIN` [`Source`] to an
//! [`HtmlDocument`] the node-oriented path can walk. `Document`/`Path`/
//! `Url`/`RawHtml` are handled here directly; `Parse`/`Fragments`/
//! `CteRef`/`DerivedSubquery` need a nested query or expression evaluated
//! first, so `node_path.rs`/`relation_path.rs` drive those and call back
//! into [`assemble_fragments`] once they have the raw HTML strings.

use std::rc::Rc;

use markql_html::{HtmlDocument, HtmlNode, parse_html};
use markql_ir::{Source, SourceKind};
use tracing::{debug, warn};

use crate::error::{Loader, RuntimeError};

/// Engine-wide tunables for subquery document sources. Defaults match the
/// limits named directly in the engine specification: an 8 MiB
/// per-fragment cap, a 10,000-fragment count cap, and a 64 MiB total-bytes
/// cap, all independent of any one machine's actual memory.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub max_fragment_bytes: usize,
    pub max_fragment_count: usize,
    pub max_total_fragment_bytes: usize,
    pub default_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_fragment_bytes: 8 * 1024 * 1024,
            max_fragment_count: 10_000,
            max_total_fragment_bytes: 64 * 1024 * 1024,
            default_timeout_ms: 30_000,
        }
    }
}

/// Resolves the directly-acquirable source kinds (everything except a
/// subquery/CTE/derived-table source, which the caller must evaluate
/// first). `base_document` is the document passed in by the caller for
/// `SourceKind::Document`.
pub fn acquire_document(
    source: &Source,
    loader: &dyn Loader,
    config: &EngineConfig,
    base_document: &Rc<HtmlDocument>,
) -> Result<(Rc<HtmlDocument>, Vec<String>), RuntimeError> {
    match source.kind {
        SourceKind::Document => Ok((Rc::clone(base_document), Vec::new())),
        SourceKind::RawHtml => Ok((Rc::new(parse_html(&source.value)), Vec::new())),
        SourceKind::Path => {
            debug!(path = %source.value, "reading document from file source");
            let bytes = loader.read_file(&source.value, config.default_timeout_ms)?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            Ok((Rc::new(parse_html(&text).with_source_uri(source.value.clone())), Vec::new()))
        }
        SourceKind::Url => {
            debug!(url = %source.value, "fetching document from url source");
            let bytes = loader.fetch_url(&source.value, config.default_timeout_ms)?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            Ok((Rc::new(parse_html(&text).with_source_uri(source.value.clone())), Vec::new()))
        }
        SourceKind::Parse | SourceKind::Fragments | SourceKind::CteRef | SourceKind::DerivedSubquery => {
            Err(RuntimeError::other(format!(
                "source kind {:?} requires nested query evaluation and cannot be acquired directly",
                source.kind
            )))
        }
    }
}

/// `PARSE(...)`/`FRAGMENTS(...)`: concatenates one or more HTML fragment
/// strings, reparsing each independently and renumbering `id`/`doc_order`/
/// `parent_id`/root `sibling_pos` so the merged arena still satisfies
/// `id == index == doc_order`. `max_depth` and non-root `sibling_pos` are
/// local to a node's own parent group and need no adjustment.
pub fn assemble_fragments(fragments: &[String], config: &EngineConfig, deprecated_alias: bool) -> Result<(HtmlDocument, Vec<String>), RuntimeError> {
    if fragments.len() > config.max_fragment_count {
        return Err(RuntimeError::other(format!(
            "PARSE()/FRAGMENTS() produced more than {} fragments",
            config.max_fragment_count
        )));
    }
    let mut total_bytes = 0usize;
    let mut merged: Vec<HtmlNode> = Vec::new();
    let mut root_count = 0u32;

    for fragment in fragments {
        if fragment.len() > config.max_fragment_bytes {
            return Err(RuntimeError::FragmentTooLarge(config.max_fragment_bytes));
        }
        total_bytes += fragment.len();
        if total_bytes > config.max_total_fragment_bytes {
            return Err(RuntimeError::TotalSizeExceeded(config.max_total_fragment_bytes));
        }

        let parsed = parse_html(fragment);
        let offset = merged.len() as u32;
        for mut node in parsed.nodes {
            node.id += offset;
            node.doc_order += offset;
            node.parent_id = node.parent_id.map(|p| p + offset);
            if node.parent_id.is_none() {
                root_count += 1;
                node.sibling_pos = root_count;
            }
            merged.push(node);
        }
    }

    let mut warnings = Vec::new();
    if deprecated_alias {
        warn!("FRAGMENTS is deprecated; use PARSE instead");
        warnings.push("FRAGMENTS is deprecated; use PARSE instead".to_string());
    }
    debug!(fragment_count = fragments.len(), total_bytes, "assembled fragment document");
    Ok((HtmlDocument { nodes: merged, source_uri: None }, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NullLoader;

    #[test]
    fn acquires_raw_html_source_directly() {
        let source = Source::new(SourceKind::RawHtml, markql_ir::Span::new(0, 0)).with_value("<p>hi</p>");
        let base = Rc::new(parse_html(""));
        let (doc, warnings) = acquire_document(&source, &NullLoader, &EngineConfig::default(), &base).unwrap();
        assert_eq!(doc.nodes[0].tag, "p");
        assert!(warnings.is_empty());
    }

    #[test]
    fn path_source_without_a_loader_fails_as_io() {
        let source = Source::new(SourceKind::Path, markql_ir::Span::new(0, 0)).with_value("missing.html");
        let base = Rc::new(parse_html(""));
        let err = acquire_document(&source, &NullLoader, &EngineConfig::default(), &base).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn assemble_fragments_renumbers_ids_and_roots() {
        let fragments = vec!["<div>a</div>".to_string(), "<span>b</span>".to_string()];
        let (doc, warnings) = assemble_fragments(&fragments, &EngineConfig::default(), false).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[1].id, 1);
        assert_eq!(doc.nodes[1].doc_order, 1);
        assert_eq!(doc.nodes[0].sibling_pos, 1);
        assert_eq!(doc.nodes[1].sibling_pos, 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn fragments_alias_emits_deprecation_warning() {
        let fragments = vec!["<div>a</div>".to_string()];
        let (_doc, warnings) = assemble_fragments(&fragments, &EngineConfig::default(), true).unwrap();
        assert!(warnings.iter().any(|w| w.contains("deprecated")));
    }

    #[test]
    fn oversized_fragment_is_rejected() {
        let config = EngineConfig { max_fragment_bytes: 4, ..EngineConfig::default() };
        let fragments = vec!["<div>too big</div>".to_string()];
        let err = assemble_fragments(&fragments, &config, false).unwrap_err();
        assert!(matches!(err, RuntimeError::FragmentTooLarge(_)));
    }
}
