// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The node-oriented execution path (engine specification §4.5): used
//! whenever a query has no `WITH`, no joins, no CTE/derived source, and
//! no `alias.field` qualifier in `ORDER BY` (`Query::requires_relation_path`
//! returns `false`).

use std::collections::BTreeMap;
use std::rc::Rc;

use markql_functions::{FunctionRegistry, Value};
use markql_ir::{Aggregate, CompareOp, Expr, FieldKind, Query};

use crate::aggregates;
use crate::domfn::TreeIndex;
use crate::error::RuntimeError;
use crate::eval::{eval_expr, eval_scalar};
use crate::flatten;
use crate::node_ctx::NodeContext;
use crate::order;
use crate::result::{QueryResult, ResultRow};
use crate::table;

/// A top-level `tag = 'x'` (or chain of `AND`ed equalities) found in
/// `WHERE`, used to narrow the node scan before the full predicate runs.
/// Two conflicting tag equalities in the same `AND` chain make the whole
/// query unsatisfiable, so candidate selection short-circuits to empty
/// rather than scanning the document for nothing.
#[derive(Debug, Default, Clone, PartialEq)]
struct Prefilter {
    tag: Option<String>,
    parent_id: Option<u32>,
    contradictory: bool,
}

fn merge_tag(prefilter: &mut Prefilter, tag: &str) {
    match &prefilter.tag {
        Some(existing) if !existing.eq_ignore_ascii_case(tag) => prefilter.contradictory = true,
        _ => prefilter.tag = Some(tag.to_string()),
    }
}

fn merge_parent(prefilter: &mut Prefilter, parent_id: u32) {
    match prefilter.parent_id {
        Some(existing) if existing != parent_id => prefilter.contradictory = true,
        _ => prefilter.parent_id = Some(parent_id),
    }
}

fn collect_prefilter(expr: &Expr, prefilter: &mut Prefilter) {
    match expr {
        Expr::Binary(binary) if binary.op == markql_ir::LogicalOp::And => {
            collect_prefilter(&binary.left, prefilter);
            collect_prefilter(&binary.right, prefilter);
        }
        Expr::Compare(compare) if compare.op == CompareOp::Eq && compare.lhs_expr.is_none() => {
            if let Some(value) = compare.rhs.values.first() {
                match compare.lhs.field_kind {
                    FieldKind::Tag => merge_tag(prefilter, value),
                    FieldKind::ParentId => {
                        if let Ok(id) = value.parse::<u32>() {
                            merge_parent(prefilter, id);
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn build_prefilter(where_clause: Option<&Expr>) -> Prefilter {
    let mut prefilter = Prefilter::default();
    if let Some(expr) = where_clause {
        collect_prefilter(expr, &mut prefilter);
    }
    prefilter
}

fn select_candidates(tree: &TreeIndex, query: &Query, registry: &FunctionRegistry) -> Result<Vec<u32>, RuntimeError> {
    let prefilter = build_prefilter(query.where_clause.as_ref());
    if prefilter.contradictory {
        return Ok(Vec::new());
    }
    let mut matches = Vec::new();
    for node in &tree.doc.nodes {
        if let Some(tag) = &prefilter.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                continue;
            }
        }
        if let Some(parent_id) = prefilter.parent_id {
            if node.parent_id != Some(parent_id) {
                continue;
            }
        }
        let ctx = NodeContext::new(tree, node.id, registry);
        let matched = match &query.where_clause {
            Some(expr) => eval_expr(expr, &ctx, registry)?,
            None => true,
        };
        if matched {
            matches.push(node.id);
        }
    }
    Ok(matches)
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

fn apply_dom_function_item(tree: &TreeIndex, node_id: u32, item: &markql_ir::SelectItem) -> Option<Value> {
    let self_arg = markql_ir::ScalarExpr::self_ref(item.span);
    let tag_arg = if item.tag.is_empty() { self_arg.clone() } else { markql_ir::ScalarExpr::string(&item.tag, item.span) };
    let name = if item.text_function {
        "text"
    } else if item.direct_text_function {
        "direct_text"
    } else if item.inner_html_function {
        "inner_html"
    } else if item.raw_inner_html_function {
        "raw_inner_html"
    } else {
        return None;
    };
    let mut args = vec![tag_arg];
    if let Some(depth) = item.inner_html_depth {
        args.push(markql_ir::ScalarExpr::number(depth as i64, item.span));
    }
    crate::domfn::call_dom_function(tree, node_id, name, &args).ok()
}

fn build_projected_row(
    tree: &TreeIndex,
    node_id: u32,
    query: &Query,
    registry: &FunctionRegistry,
) -> Result<ResultRow, RuntimeError> {
    let mut row = ResultRow::from_node(tree.node(node_id), tree.doc.source_uri.as_deref());
    let ctx = NodeContext::new(tree, node_id, registry);

    for (index, item) in query.select_items.iter().enumerate() {
        if item.is_star() || item.aggregate != Aggregate::None {
            continue;
        }
        if item.flatten_text {
            let bound = flatten::flatten_text(tree, node_id, &item.tag, item.flatten_depth, &item.flatten_aliases);
            row.computed_fields.extend(bound);
            continue;
        }
        if item.flatten_extract {
            for (alias, expr) in item.flatten_extract_aliases.iter().zip(item.flatten_extract_exprs.iter()) {
                let value = flatten::eval_flatten_extract(expr, tree, node_id, registry, &row.computed_fields)?;
                row.computed_fields.insert(alias.clone(), value);
            }
            continue;
        }
        if let Some(value) = apply_dom_function_item(tree, node_id, item) {
            let value = if item.trim { Value::text(value.display_text().trim().to_string()) } else { value };
            row.computed_fields.insert(scalar_column_name(item, index), value);
            continue;
        }
        if let Some(expr) = &item.expr {
            let value = eval_scalar(expr, &ctx, registry)?;
            let value = if item.trim { Value::text(value.display_text().trim().to_string()) } else { value };
            row.computed_fields.insert(scalar_column_name(item, index), value);
        }
    }

    for field in &query.exclude_fields {
        row.computed_fields.remove(field);
        match field.as_str() {
            "tag" => row.tag = None,
            "text" => row.text = None,
            "inner_html" => row.inner_html = None,
            "parent_id" => row.parent_id = None,
            "sibling_pos" => row.sibling_pos = None,
            "max_depth" => row.max_depth = None,
            "doc_order" => row.doc_order = None,
            other => {
                if let Some(attr) = other.strip_prefix("attributes.") {
                    row.attributes.remove(attr);
                }
            }
        }
    }

    Ok(row)
}

/// Runs the node-oriented pipeline (candidate selection through ordering
/// and `LIMIT`) against an already-acquired document.
pub fn execute_node_path(query: &Query, document: &Rc<markql_html::HtmlDocument>, registry: &FunctionRegistry) -> Result<QueryResult, RuntimeError> {
    let tree = TreeIndex::new(Rc::clone(document));
    let matches = select_candidates(&tree, query, registry)?;

    let aggregate = query.select_items.first().map(|i| i.aggregate).unwrap_or(Aggregate::None);
    if aggregate != Aggregate::None {
        let rows = match aggregate {
            Aggregate::Count => vec![aggregates::count(&matches)],
            Aggregate::Summarize => aggregates::summarize(&tree, &matches),
            Aggregate::Tfidf => aggregates::tfidf(&tree, &matches, &query.select_items[0]),
            Aggregate::None => unreachable!(),
        };
        let rows = order::order_and_limit(rows, &query.order_by, query.limit);
        let columns = match aggregate {
            Aggregate::Count => vec!["count".to_string()],
            Aggregate::Summarize => vec!["tag".to_string(), "count".to_string()],
            Aggregate::Tfidf => vec!["term_scores".to_string()],
            Aggregate::None => unreachable!(),
        };
        return Ok(QueryResult {
            columns,
            rows,
            tables: Vec::new(),
            to_list: query.to_list,
            table_has_header: query.table_has_header,
            table_options: None,
            export_sink: query.export_sink.clone(),
            warnings: Vec::new(),
            truncated: false,
        });
    }

    if query.to_table {
        let tables = matches
            .iter()
            .map(|&id| table::extract_table(&tree, id, &query.table_options, query.table_has_header))
            .collect();
        return Ok(QueryResult {
            columns: Vec::new(),
            rows: Vec::new(),
            tables,
            to_list: false,
            table_has_header: query.table_has_header,
            table_options: Some(query.table_options),
            export_sink: query.export_sink.clone(),
            warnings: Vec::new(),
            truncated: false,
        });
    }

    let mut rows = Vec::with_capacity(matches.len());
    for &id in &matches {
        rows.push(build_projected_row(&tree, id, query, registry)?);
    }
    let rows = order::order_and_limit(rows, &query.order_by, query.limit);

    let columns: Vec<String> = query
        .select_items
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.is_star())
        .map(|(i, item)| scalar_column_name(item, i))
        .collect();

    Ok(QueryResult {
        columns,
        rows,
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
    use markql_html::parse_html;
    use markql_ir::{Source, SourceKind, Span};

    fn doc_handle(html: &str) -> Rc<markql_html::HtmlDocument> {
        Rc::new(parse_html(html))
    }

    #[test]
    fn selects_every_node_with_an_always_true_where() {
        let query = Query::new(Source::new(SourceKind::Document, Span::new(0, 0)), Span::new(0, 0))
            .with_select_items(vec![markql_ir::SelectItem::tag_only("*", Span::new(0, 0))]);
        let doc = doc_handle("<div></div><span></span>");
        let registry = FunctionRegistry::new();
        let result = execute_node_path(&query, &doc, &registry).unwrap();
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn count_star_does_not_need_text_materialized() {
        let mut query = Query::new(Source::new(SourceKind::Document, Span::new(0, 0)), Span::new(0, 0));
        let mut item = markql_ir::SelectItem::tag_only("*", Span::new(0, 0));
        item.aggregate = Aggregate::Count;
        query.select_items = vec![item];
        let doc = doc_handle("<div></div><span></span>");
        let registry = FunctionRegistry::new();
        let result = execute_node_path(&query, &doc, &registry).unwrap();
        assert_eq!(result.rows[0].computed_fields["count"], Value::Number(2));
    }

    #[test]
    fn contradictory_tag_prefilter_yields_no_rows() {
        use markql_ir::{CompareExpr, CompareOp, FieldKind, Operand, ValueList};
        let lhs1 = Operand::new(markql_ir::Axis::SelfAxis, FieldKind::Tag, Span::new(0, 0));
        let lhs2 = lhs1.clone();
        let mut c1 = CompareExpr::new(CompareOp::Eq, lhs1, Span::new(0, 0));
        c1.rhs = ValueList { values: vec!["div".to_string()], span: Span::new(0, 0) };
        let mut c2 = CompareExpr::new(CompareOp::Eq, lhs2, Span::new(0, 0));
        c2.rhs = ValueList { values: vec!["span".to_string()], span: Span::new(0, 0) };
        let where_clause = Expr::and(Expr::Compare(c1), Expr::Compare(c2), Span::new(0, 0));
        let query = Query::new(Source::new(SourceKind::Document, Span::new(0, 0)), Span::new(0, 0))
            .with_select_items(vec![markql_ir::SelectItem::tag_only("*", Span::new(0, 0))])
            .with_where(where_clause);
        let doc = doc_handle("<div></div><span></span>");
        let registry = FunctionRegistry::new();
        let result = execute_node_path(&query, &doc, &registry).unwrap();
        assert!(result.rows.is_empty());
    }
}
