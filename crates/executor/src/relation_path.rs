// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The relation-oriented execution path (engine specification §4.6):
//! `WITH` materialization, `FROM`/`JOIN` cross products, and projection
//! over the assembled [`RelationRow`]s.
//!
//! A CTE materializes by running its *own* `FROM`/`JOIN`/`WHERE`/`SELECT`
//! pipeline in full (recursing through [`assemble_relation`] and
//! [`project_row`]), then exposing only its projected column values to the
//! outer query — the aliases it joined internally are not visible outside
//! it, mirroring how a derived table's own source list is private to it.
//! A `LATERAL` right source is re-resolved once per left row, with that
//! row threaded through as `outer_row`, so a correlated predicate
//! (`c.parent_id = r.row_id`) can see the left side's bindings.

use std::collections::BTreeMap;
use std::rc::Rc;

use markql_functions::{FunctionRegistry, Value};
use markql_ir::{Aggregate, Expr, JoinItem, JoinType, Query, Source, SourceKind};

use crate::domfn::TreeIndex;
use crate::error::{Loader, RuntimeError};
use crate::eval::{eval_expr, eval_scalar};
use crate::order;
use crate::relation::{RelationBinding, RelationContext, RelationRow};
use crate::result::{QueryResult, ResultRow};
use crate::source::{self, EngineConfig};

/// A materialized CTE: every row of its own projected output, in order.
type CteTable = BTreeMap<String, Vec<Rc<BTreeMap<String, Value>>>>;

/// One resolved `FROM`/`JOIN` source: a binding per candidate row, plus a
/// same-shape placeholder for a `LEFT JOIN` side with no surviving match.
struct ResolvedSource {
    bindings: Vec<RelationBinding>,
    unmatched: RelationBinding,
}

/// Resolves `src` to its candidate bindings. `outer_row`, when given, is
/// visible to a `DerivedSubquery`'s own `WHERE` clause (and further nested
/// joins) as a correlated source — the mechanism a `LATERAL` join's right
/// side needs to reference the left row's aliases.
fn resolve_source(
    src: &Source,
    loader: &dyn Loader,
    config: &EngineConfig,
    base_document: &Rc<markql_html::HtmlDocument>,
    ctes: &CteTable,
    registry: &FunctionRegistry,
    outer_row: Option<&RelationRow>,
) -> Result<ResolvedSource, RuntimeError> {
    match src.kind {
        SourceKind::CteRef => {
            let rows = ctes
                .get(&src.value)
                .ok_or_else(|| RuntimeError::other(format!("unknown CTE reference '{}'", src.value)))?;
            Ok(ResolvedSource {
                bindings: rows.iter().map(|fields| RelationBinding::matched_virtual(Rc::clone(fields))).collect(),
                unmatched: RelationBinding::unmatched_virtual(),
            })
        }
        SourceKind::DerivedSubquery => {
            let derived = src.derived_query.as_ref().ok_or_else(|| RuntimeError::other("derived table missing its subquery"))?;
            let nested_alias = derived.source.effective_alias().to_string();
            let nested_rows = assemble_relation(derived, loader, config, base_document, ctes, registry, outer_row)?;
            let bindings = nested_rows
                .iter()
                .filter_map(|row| row.binding(&nested_alias).cloned())
                .collect::<Vec<_>>();
            let unmatched = bindings
                .first()
                .map(RelationBinding::unmatched_like)
                .unwrap_or_else(RelationBinding::unmatched_virtual);
            Ok(ResolvedSource { bindings, unmatched })
        }
        SourceKind::Parse | SourceKind::Fragments => {
            let html = src
                .parse_expr
                .as_ref()
                .and_then(|expr| match &expr.kind {
                    markql_ir::ScalarExprKind::StringLiteral(s) => Some(s.clone()),
                    _ => None,
                })
                .ok_or_else(|| {
                    RuntimeError::other("PARSE()/FRAGMENTS() sources in a joined relation support only a literal HTML argument")
                })?;
            let (doc, _warnings) = source::assemble_fragments(&[html], config, src.kind == SourceKind::Fragments)?;
            let tree = Rc::new(TreeIndex::new(Rc::new(doc)));
            let bindings = tree.doc.nodes.iter().map(|n| RelationBinding::matched(Rc::clone(&tree), n.id)).collect();
            Ok(ResolvedSource { bindings, unmatched: RelationBinding::unmatched(tree) })
        }
        _ => {
            let (doc, _warnings) = source::acquire_document(src, loader, config, base_document)?;
            let tree = Rc::new(TreeIndex::new(doc));
            let bindings = tree.doc.nodes.iter().map(|n| RelationBinding::matched(Rc::clone(&tree), n.id)).collect();
            Ok(ResolvedSource { bindings, unmatched: RelationBinding::unmatched(tree) })
        }
    }
}

/// Runs `query`'s own `FROM`/`JOIN`/`WHERE` pipeline, with `outer_row`'s
/// bindings carried on every resulting row so a correlated nested
/// predicate can see them. Does not project — callers that need scalar
/// output run the result through [`project_row`] themselves.
fn assemble_relation(
    query: &Query,
    loader: &dyn Loader,
    config: &EngineConfig,
    base_document: &Rc<markql_html::HtmlDocument>,
    ctes: &CteTable,
    registry: &FunctionRegistry,
    outer_row: Option<&RelationRow>,
) -> Result<Vec<RelationRow>, RuntimeError> {
    let default_alias = query.source.effective_alias().to_string();
    let base = resolve_source(&query.source, loader, config, base_document, ctes, registry, outer_row)?;
    let mut rows: Vec<RelationRow> = base
        .bindings
        .into_iter()
        .map(|binding| outer_row.cloned().unwrap_or_default().with_binding(default_alias.clone(), binding))
        .collect();

    for join in &query.joins {
        let alias = join.right_source.effective_alias().to_string();
        rows = fold_join(rows, &alias, join, loader, config, base_document, ctes, registry)?;
    }

    if let Some(where_clause) = &query.where_clause {
        let mut filtered = Vec::with_capacity(rows.len());
        for row in rows {
            let ctx = RelationContext::new(&row, &default_alias, registry);
            if eval_expr(where_clause, &ctx, registry)? {
                filtered.push(row);
            }
        }
        rows = filtered;
    }
    Ok(rows)
}

/// Folds one `JOIN` into `rows`. A `LATERAL` right source is re-resolved
/// once per left row (with that row passed as `outer_row`); a non-lateral
/// source is resolved once and cross-joined against every left row.
fn fold_join(
    rows: Vec<RelationRow>,
    alias: &str,
    join: &JoinItem,
    loader: &dyn Loader,
    config: &EngineConfig,
    base_document: &Rc<markql_html::HtmlDocument>,
    ctes: &CteTable,
    registry: &FunctionRegistry,
) -> Result<Vec<RelationRow>, RuntimeError> {
    if join.lateral {
        let mut out = Vec::new();
        for row in rows {
            let resolved = resolve_source(&join.right_source, loader, config, base_document, ctes, registry, Some(&row))?;
            out.extend(join_row_against(row, alias, &resolved, join, registry)?);
        }
        Ok(out)
    } else {
        let resolved = resolve_source(&join.right_source, loader, config, base_document, ctes, registry, None)?;
        let mut out = Vec::new();
        for row in rows {
            out.extend(join_row_against(row, alias, &resolved, join, registry)?);
        }
        Ok(out)
    }
}

/// Extends one left `row` with every matching candidate from `resolved`
/// (inner/cross), or its unmatched placeholder if none match (left).
fn join_row_against(
    row: RelationRow,
    alias: &str,
    resolved: &ResolvedSource,
    join: &JoinItem,
    registry: &FunctionRegistry,
) -> Result<Vec<RelationRow>, RuntimeError> {
    let mut out = Vec::new();
    let mut any_match = false;
    for binding in &resolved.bindings {
        let candidate = row.clone().with_binding(alias, binding.clone());
        let keep = match &join.on {
            Some(on) => {
                let ctx = RelationContext::new(&candidate, alias, registry);
                eval_expr(on, &ctx, registry)?
            }
            None => true,
        };
        if keep {
            any_match = true;
            out.push(candidate);
        }
    }
    if join.join_type == JoinType::Left && !any_match {
        out.push(row.with_binding(alias, resolved.unmatched.clone()));
    }
    Ok(out)
}

fn materialize_ctes(
    query: &Query,
    loader: &dyn Loader,
    config: &EngineConfig,
    base_document: &Rc<markql_html::HtmlDocument>,
    registry: &FunctionRegistry,
) -> Result<CteTable, RuntimeError> {
    let mut ctes = CteTable::new();
    if let Some(with) = &query.with {
        for cte in &with.ctes {
            let default_alias = cte.query.source.effective_alias().to_string();
            let rows = assemble_relation(&cte.query, loader, config, base_document, &ctes, registry, None)?;
            let mut projected = Vec::with_capacity(rows.len());
            for row in &rows {
                let result_row = project_row(row, &cte.query, &default_alias, registry)?;
                projected.push(Rc::new(result_row.computed_fields));
            }
            ctes.insert(cte.name.clone(), projected);
        }
    }
    Ok(ctes)
}

fn scalar_column_name(item: &markql_ir::SelectItem, index: usize) -> String {
    if let Some(alias) = &item.alias {
        return alias.clone();
    }
    if !item.tag.is_empty() {
        return item.tag.clone();
    }
    format!("col_{}", index + 1)
}

fn project_row(row: &RelationRow, query: &Query, default_alias: &str, registry: &FunctionRegistry) -> Result<ResultRow, RuntimeError> {
    let mut result = ResultRow::default();
    let ctx = RelationContext::new(row, default_alias, registry);
    for (index, item) in query.select_items.iter().enumerate() {
        if item.is_star() || item.aggregate != Aggregate::None {
            continue;
        }
        if let Some(expr) = &item.expr {
            let value = eval_scalar(expr, &ctx, registry)?;
            let value = if item.trim { Value::text(value.display_text().trim().to_string()) } else { value };
            result.computed_fields.insert(scalar_column_name(item, index), value);
        }
    }
    for field in &query.exclude_fields {
        result.computed_fields.remove(field);
    }
    Ok(result)
}

/// Runs the relation-oriented pipeline: materializes `WITH`, resolves
/// `FROM`, folds in each `JOIN`, applies `WHERE`/`ORDER BY`/`LIMIT` over
/// the joined relation, then projects.
pub fn execute_relation_path(
    query: &Query,
    loader: &dyn Loader,
    config: &EngineConfig,
    base_document: &Rc<markql_html::HtmlDocument>,
    registry: &FunctionRegistry,
) -> Result<QueryResult, RuntimeError> {
    let ctes = materialize_ctes(query, loader, config, base_document, registry)?;
    let default_alias = query.source.effective_alias().to_string();
    let rows = assemble_relation(query, loader, config, base_document, &ctes, registry, None)?;

    let aggregate = query.select_items.first().map(|i| i.aggregate).unwrap_or(Aggregate::None);
    if aggregate == Aggregate::Count {
        let mut row = ResultRow::default();
        row.computed_fields.insert("count".to_string(), Value::Number(rows.len() as i64));
        return Ok(QueryResult {
            columns: vec!["count".to_string()],
            rows: vec![row],
            tables: Vec::new(),
            to_list: query.to_list,
            table_has_header: query.table_has_header,
            table_options: None,
            export_sink: query.export_sink.clone(),
            warnings: Vec::new(),
            truncated: false,
        });
    }
    if aggregate != Aggregate::None {
        return Err(RuntimeError::other("SUMMARIZE/TFIDF target a single node-oriented source, not a joined relation"));
    }

    let mut result_rows = Vec::with_capacity(rows.len());
    for row in &rows {
        result_rows.push(project_row(row, query, &default_alias, registry)?);
    }
    let result_rows = order::order_and_limit(result_rows, &query.order_by, query.limit);

    let columns: Vec<String> = query
        .select_items
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.is_star())
        .map(|(i, item)| scalar_column_name(item, i))
        .collect();

    Ok(QueryResult {
        columns,
        rows: result_rows,
        tables: Vec::new(),
        to_list: query.to_list,
        table_has_header: query.table_has_header,
        table_options: None,
        export_sink: query.export_sink.clone(),
        warnings: Vec::new(),
        truncated: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NullLoader;
    use markql_html::parse_html;
    use markql_ir::{CompareExpr, CompareOp, FieldKind, Operand, Span};

    fn html_source(html: &str, alias: &str) -> Source {
        Source::new(SourceKind::RawHtml, Span::new(0, 0)).with_value(html).with_alias(alias)
    }

    #[test]
    fn inner_join_filters_unmatched_pairs() {
        let left = html_source("<a id=\"1\"></a><a id=\"2\"></a>", "left");
        let right = html_source("<b ref=\"1\"></b>", "right");
        let on = Expr::Compare(
            CompareExpr::new(
                CompareOp::Eq,
                Operand::new(markql_ir::Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 0))
                    .with_attribute("id")
                    .with_qualifier("left"),
                Span::new(0, 0),
            )
            .with_rhs_expr(markql_ir::ScalarExpr::operand(
                Operand::new(markql_ir::Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 0))
                    .with_attribute("ref")
                    .with_qualifier("right"),
                Span::new(0, 0),
            )),
        );
        let join = markql_ir::JoinItem { join_type: JoinType::Inner, right_source: right, on: Some(on), lateral: false, span: Span::new(0, 0) };
        let mut query = Query::new(left, Span::new(0, 0));
        query.joins = vec![join];
        let item = markql_ir::SelectItem::tag_only("*", Span::new(0, 0));
        query.select_items = vec![item];

        let base = Rc::new(parse_html(""));
        let registry = FunctionRegistry::new();
        let result = execute_relation_path(&query, &NullLoader, &EngineConfig::default(), &base, &registry).unwrap();
        assert_eq!(result.rows.len(), 1);
    }
}
