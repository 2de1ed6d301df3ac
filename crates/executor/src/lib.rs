// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MarkQL — Executor
//!
//! Node-oriented and relation-oriented query execution (engine
//! specification §4.5-§4.9). `execute` is the crate's single entry
//! point: it picks a path per [`markql_ir::Query::requires_relation_path`]
//! and returns a [`QueryResult`].

mod aggregates;
mod domfn;
mod error;
mod eval;
mod flatten;
mod meta;
mod node_ctx;
mod node_path;
mod order;
mod relation;
mod relation_path;
mod result;
mod source;
mod table;

pub use domfn::TreeIndex;
pub use error::{Loader, NullLoader, RuntimeError};
pub use eval::RowContext;
pub use node_ctx::NodeContext;
pub use relation::{RelationBinding, RelationContext, RelationRow};
pub use result::{QueryResult, ResultRow, SparseCell, TableResult};
pub use source::EngineConfig;

use std::rc::Rc;

use markql_functions::FunctionRegistry;
use markql_html::HtmlDocument;
use markql_ir::Query;

/// Resolves a top-level (non-joined) `FROM` source, including the
/// `PARSE`/`FRAGMENTS` subquery forms that `source::acquire_document`
/// rejects on its own (those need their argument evaluated first; a
/// literal string argument is the only shape supported here, mirroring
/// `relation_path`'s same restriction for joined `PARSE`/`FRAGMENTS`
/// sources).
fn resolve_top_level_source(
    query: &Query,
    loader: &dyn Loader,
    config: &EngineConfig,
    document: &Rc<HtmlDocument>,
) -> Result<(Rc<HtmlDocument>, Vec<String>), RuntimeError> {
    match query.source.kind {
        markql_ir::SourceKind::Parse | markql_ir::SourceKind::Fragments => {
            let html = query
                .source
                .parse_expr
                .as_ref()
                .and_then(|expr| match &expr.kind {
                    markql_ir::ScalarExprKind::StringLiteral(s) => Some(s.clone()),
                    _ => None,
                })
                .ok_or_else(|| RuntimeError::other("PARSE()/FRAGMENTS() sources support only a literal HTML argument"))?;
            let (doc, warnings) = source::assemble_fragments(&[html], config, query.source.kind == markql_ir::SourceKind::Fragments)?;
            Ok((Rc::new(doc), warnings))
        }
        _ => source::acquire_document(&query.source, loader, config, document),
    }
}

/// Runs `query` against `document`, using `loader` to resolve `Path`/`Url`
/// sources and `config` to bound `PARSE`/`FRAGMENTS` subquery sizes.
pub fn execute(query: &Query, document: Rc<HtmlDocument>, loader: &dyn Loader, config: &EngineConfig) -> Result<QueryResult, RuntimeError> {
    if let Some(result) = meta::execute_meta_query(query.kind, document.source_uri.as_deref()) {
        tracing::debug!(?query.kind, "executing introspection query");
        return Ok(result);
    }
    let registry = FunctionRegistry::new();
    if query.requires_relation_path() {
        tracing::debug!("executing query on the relation-oriented path");
        relation_path::execute_relation_path(query, loader, config, &document, &registry)
    } else {
        tracing::debug!("executing query on the node-oriented path");
        let (acquired, mut warnings) = resolve_top_level_source(query, loader, config, &document)?;
        let mut result = node_path::execute_node_path(query, &acquired, &registry)?;
        result.warnings.append(&mut warnings);
        Ok(result)
    }
}

/// Convenience entry point for callers with no `Path`/`Url` sources and
/// the default subquery limits — most tests and embeddings that only
/// query an in-memory document want this.
pub fn execute_in_memory(query: &Query, document: HtmlDocument) -> Result<QueryResult, RuntimeError> {
    execute(query, Rc::new(document), &NullLoader, &EngineConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_html::parse_html;
    use markql_ir::{Source, SourceKind, Span};

    #[test]
    fn executes_a_bare_select_star_query() {
        let query = Query::new(Source::new(SourceKind::Document, Span::new(0, 0)), Span::new(0, 0))
            .with_select_items(vec![markql_ir::SelectItem::tag_only("*", Span::new(0, 0))]);
        let doc = parse_html("<div></div><span></span>");
        let result = execute_in_memory(&query, doc).unwrap();
        assert_eq!(result.rows.len(), 2);
    }
}
