// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `FLATTEN_TEXT(tag, depth?)` and `PROJECT(tag) AS (alias: expr, ...)`
//! evaluation against one base (matching) node.

use std::collections::BTreeMap;

use markql_functions::{FunctionRegistry, Value};
use markql_ir::{Expr, FlattenExtractExpr, FlattenExtractKind};

use crate::domfn::TreeIndex;
use crate::error::RuntimeError;
use crate::eval::{RowContext, eval_expr};
use crate::node_ctx::NodeContext;

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Descendants of `context_id` tagged `tag`, in document order, optionally
/// restricted to a given nesting `depth` below `context_id` (1 = direct
/// child). Absent `depth` matches at any nesting level.
fn matching_descendants(tree: &TreeIndex, context_id: u32, tag: &str, depth: Option<usize>) -> Vec<u32> {
    fn depth_of(tree: &TreeIndex, context_id: u32, id: u32) -> usize {
        let mut d = 0;
        let mut cur = id;
        while let Some(parent) = tree.node(cur).parent_id {
            d += 1;
            if parent == context_id {
                return d;
            }
            cur = parent;
        }
        d
    }
    tree.descendants_of(context_id)
        .into_iter()
        .filter(|&id| tree.node(id).tag.eq_ignore_ascii_case(tag))
        .filter(|&id| depth.is_none_or(|d| depth_of(tree, context_id, id) == d))
        .collect()
}

/// `FLATTEN_TEXT(tag, depth?)`: each matching descendant's normalized text
/// is bound positionally to `aliases[i]`; descendants beyond the alias
/// list are dropped, fewer descendants than aliases leave the remaining
/// aliases unset.
pub fn flatten_text(tree: &TreeIndex, context_id: u32, tag: &str, depth: Option<usize>, aliases: &[String]) -> BTreeMap<String, Value> {
    let matches = matching_descendants(tree, context_id, tag, depth);
    aliases
        .iter()
        .zip(matches.iter())
        .map(|(alias, &id)| (alias.clone(), Value::text(normalize(&tree.node(id).text))))
        .collect()
}

fn select_one(tree: &TreeIndex, context_id: u32, expr: &FlattenExtractExpr, registry: &FunctionRegistry) -> Option<u32> {
    let mut matches = matching_descendants(tree, context_id, &expr.tag, None);
    if let Some(where_clause) = &expr.where_clause {
        matches.retain(|&id| {
            let ctx = NodeContext::new(tree, id, registry);
            eval_expr(where_clause, &ctx, registry).unwrap_or(false)
        });
    }
    if expr.selector_last {
        return matches.last().copied();
    }
    if let Some(idx) = expr.selector_index {
        let idx = idx.max(0) as usize;
        return matches.get(idx).copied();
    }
    matches.first().copied()
}

/// Evaluates one `PROJECT(...)`/`FLATTEN_EXTRACT(...)` alias binding
/// against `context_id`. `computed` carries earlier aliases in source
/// order so later bindings can reference them.
pub fn eval_flatten_extract(
    expr: &FlattenExtractExpr,
    tree: &TreeIndex,
    context_id: u32,
    registry: &FunctionRegistry,
    computed: &BTreeMap<String, Value>,
) -> Result<Value, RuntimeError> {
    match expr.kind {
        FlattenExtractKind::Text => Ok(match select_one(tree, context_id, expr, registry) {
            Some(id) => Value::text(tree.node(id).text.clone()),
            None => Value::Null,
        }),
        FlattenExtractKind::Attr => {
            let attr = expr.attribute.as_deref().unwrap_or_default();
            Ok(match select_one(tree, context_id, expr, registry) {
                Some(id) => Value::from(tree.node(id).attr(attr).map(str::to_string)),
                None => Value::Null,
            })
        }
        FlattenExtractKind::Coalesce => {
            for arg in &expr.args {
                let value = eval_flatten_extract(arg, tree, context_id, registry, computed)?;
                if !value.is_null() {
                    return Ok(value);
                }
            }
            Ok(Value::Null)
        }
        FlattenExtractKind::FunctionCall => {
            let values = expr
                .args
                .iter()
                .map(|a| eval_flatten_extract(a, tree, context_id, registry, computed))
                .collect::<Result<Vec<_>, _>>()?;
            markql_functions::builtin::string::call(&expr.function_name, &values).map_err(RuntimeError::from)
        }
        FlattenExtractKind::StringLiteral => Ok(Value::text(expr.string_value.clone())),
        FlattenExtractKind::NumberLiteral => Ok(Value::Number(expr.number_value)),
        FlattenExtractKind::NullLiteral => Ok(Value::Null),
        FlattenExtractKind::AliasRef => Ok(computed.get(&expr.alias_ref).cloned().unwrap_or(Value::Null)),
        FlattenExtractKind::OperandRef => {
            let ctx = NodeContext::new(tree, context_id, registry);
            match &expr.operand {
                Some(operand) => ctx.value_of(operand),
                None => Ok(Value::Null),
            }
        }
        FlattenExtractKind::CaseWhen => {
            let ctx = NodeContext::new(tree, context_id, registry);
            for (cond, value_expr) in expr.case_when_conditions.iter().zip(expr.case_when_values.iter()) {
                if eval_expr_as_condition(cond, &ctx, registry)? {
                    return eval_flatten_extract(value_expr, tree, context_id, registry, computed);
                }
            }
            match &expr.case_else {
                Some(else_expr) => eval_flatten_extract(else_expr, tree, context_id, registry, computed),
                None => Ok(Value::Null),
            }
        }
    }
}

fn eval_expr_as_condition(expr: &Expr, ctx: &NodeContext, registry: &FunctionRegistry) -> Result<bool, RuntimeError> {
    eval_expr(expr, ctx, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_html::parse_html;
    use markql_ir::Span;
    use std::rc::Rc;

    #[test]
    fn flatten_text_binds_positionally() {
        let doc = parse_html("<ul><li>a</li><li>b</li><li>c</li></ul>");
        let root = doc.nodes.iter().find(|n| n.tag == "ul").unwrap().id;
        let tree = TreeIndex::new(Rc::new(doc));
        let aliases = vec!["item_1".to_string(), "item_2".to_string()];
        let bound = flatten_text(&tree, root, "li", None, &aliases);
        assert_eq!(bound["item_1"], Value::text("a"));
        assert_eq!(bound["item_2"], Value::text("b"));
        assert_eq!(bound.len(), 2);
    }

    #[test]
    fn project_text_selects_first_match_by_default() {
        let doc = parse_html("<div><span>first</span><span>second</span></div>");
        let root = doc.nodes.iter().find(|n| n.tag == "div").unwrap().id;
        let tree = TreeIndex::new(Rc::new(doc));
        let registry = FunctionRegistry::new();
        let mut expr = FlattenExtractExpr::new(FlattenExtractKind::Text, Span::new(0, 0));
        expr.tag = "span".to_string();
        let value = eval_flatten_extract(&expr, &tree, root, &registry, &BTreeMap::new()).unwrap();
        assert_eq!(value, Value::text("first"));
    }

    #[test]
    fn project_alias_ref_reads_earlier_binding() {
        let doc = parse_html("<div></div>");
        let root = doc.nodes[0].id;
        let tree = TreeIndex::new(Rc::new(doc));
        let registry = FunctionRegistry::new();
        let mut computed = BTreeMap::new();
        computed.insert("name".to_string(), Value::text("widget"));
        let mut expr = FlattenExtractExpr::new(FlattenExtractKind::AliasRef, Span::new(0, 0));
        expr.alias_ref = "name".to_string();
        let value = eval_flatten_extract(&expr, &tree, root, &registry, &computed).unwrap();
        assert_eq!(value, Value::text("widget"));
    }
}
