// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Predicate and scalar expression evaluation, shared by the node-oriented
//! and relation-oriented execution paths through the [`RowContext`] trait.
//! Each path supplies its own adapter (`node_ctx::NodeContext`,
//! `relation::RelationContext`); this module knows nothing about `HtmlNode`
//! or `RelationRow` directly, only the trait.

use markql_functions::{FunctionCategory, FunctionRegistry, Value};
use markql_ir::{Axis, CompareExpr, CompareOp, Expr, Operand, ScalarExpr, ScalarExprKind};

use crate::error::RuntimeError;

/// What a row-context adapter must supply so the shared evaluator can walk
/// axes and resolve accessors without knowing whether it's looking at a
/// single `HtmlNode` or an assembled relation tuple.
pub trait RowContext {
    /// Resolves a (possibly axis/qualifier-prefixed) operand to its value.
    /// Axis-qualified operands resolve against the *first* node reachable
    /// along that axis in document order (nearest ancestor for `Ancestor`,
    /// first child for `Child`, first preorder descendant for
    /// `Descendant`) — `EXISTS(...)` is the form that quantifies over all
    /// of them; a bare operand names one scalar.
    fn value_of(&self, operand: &Operand) -> Result<Value, RuntimeError>;

    /// Whether `operand` has a present value (`IS [NOT] NULL`). For
    /// `AttributesMap` this means "has at least one attribute"; for
    /// `Attribute` it means the named attribute is present; for
    /// `ParentId` it means the node has a parent; every other field is
    /// always present on an existing node.
    fn has_value(&self, operand: &Operand) -> Result<bool, RuntimeError>;

    /// The context node's own direct text (excluding descendant markup),
    /// used by `HAS_DIRECT_TEXT` regardless of what the predicate's LHS
    /// operand otherwise names.
    fn direct_text_of_self(&self) -> Result<String, RuntimeError>;

    /// `EXISTS(axis [WHERE where_clause])`.
    fn exists(&self, axis: Axis, where_clause: Option<&Expr>) -> Result<bool, RuntimeError>;

    /// What bare `self` evaluates to as a scalar (used by `PROJECT`
    /// bindings and `concat(self, ...)`-style expressions): the tag name
    /// of the context node, the closest thing to an identifying label a
    /// whole-node reference has.
    fn self_label(&self) -> Result<Value, RuntimeError>;

    /// Dispatches a DOM function call (`text`, `attr`, `inner_html`, ...).
    /// String functions never reach here — [`eval_scalar`] dispatches
    /// those itself via `markql_functions::builtin::string::call`.
    fn call_dom_function(
        &self,
        name: &str,
        args: &[ScalarExpr],
        registry: &FunctionRegistry,
    ) -> Result<Value, RuntimeError>;
}

pub fn eval_scalar(expr: &ScalarExpr, ctx: &dyn RowContext, registry: &FunctionRegistry) -> Result<Value, RuntimeError> {
    match &expr.kind {
        ScalarExprKind::Operand(operand) => ctx.value_of(operand),
        ScalarExprKind::SelfRef(_) => ctx.self_label(),
        ScalarExprKind::StringLiteral(s) => Ok(Value::text(s.clone())),
        ScalarExprKind::NumberLiteral(n) => Ok(Value::Number(*n)),
        ScalarExprKind::NullLiteral => Ok(Value::Null),
        ScalarExprKind::FunctionCall { name, args } => match registry.category(name) {
            Some(FunctionCategory::String) => {
                let values = args
                    .iter()
                    .map(|a| eval_scalar(a, ctx, registry))
                    .collect::<Result<Vec<_>, _>>()?;
                markql_functions::builtin::string::call(name, &values).map_err(RuntimeError::from)
            }
            _ => ctx.call_dom_function(name, args, registry),
        },
    }
}

pub fn eval_expr(expr: &Expr, ctx: &dyn RowContext, registry: &FunctionRegistry) -> Result<bool, RuntimeError> {
    match expr {
        Expr::Compare(compare) => eval_compare(compare, ctx, registry),
        Expr::Exists(exists) => ctx.exists(exists.axis, exists.where_clause.as_ref()),
        Expr::Binary(binary) => {
            let left = eval_expr(&binary.left, ctx, registry)?;
            match binary.op {
                markql_ir::LogicalOp::And => Ok(left && eval_expr(&binary.right, ctx, registry)?),
                markql_ir::LogicalOp::Or => Ok(left || eval_expr(&binary.right, ctx, registry)?),
            }
        }
    }
}

fn lhs_value(compare: &CompareExpr, ctx: &dyn RowContext, registry: &FunctionRegistry) -> Result<Value, RuntimeError> {
    match &compare.lhs_expr {
        Some(expr) => eval_scalar(expr, ctx, registry),
        None => ctx.value_of(&compare.lhs),
    }
}

fn eval_compare(compare: &CompareExpr, ctx: &dyn RowContext, registry: &FunctionRegistry) -> Result<bool, RuntimeError> {
    match compare.op {
        CompareOp::IsNull => lhs_presence(compare, ctx).map(|present| !present),
        CompareOp::IsNotNull => lhs_presence(compare, ctx),
        CompareOp::HasDirectText => {
            let needle = compare.rhs.values.first().map(String::as_str).unwrap_or("");
            let haystack = ctx.direct_text_of_self()?;
            Ok(contains_icase(&haystack, needle))
        }
        CompareOp::Like => {
            let lhs = lhs_value(compare, ctx, registry)?.display_text();
            let pattern = compare.rhs.values.first().map(String::as_str).unwrap_or("");
            Ok(like_match(&lhs, pattern))
        }
        CompareOp::Regex => {
            let lhs = lhs_value(compare, ctx, registry)?.display_text();
            let pattern = compare.rhs.values.first().map(String::as_str).unwrap_or("");
            Ok(regex::Regex::new(pattern).map(|re| re.is_match(&lhs)).unwrap_or(false))
        }
        CompareOp::Contains | CompareOp::ContainsAll | CompareOp::ContainsAny => {
            let lhs = lhs_value(compare, ctx, registry)?.display_text();
            let needle = compare.rhs.values.first().map(String::as_str).unwrap_or("");
            Ok(eval_contains(compare.op, &lhs, needle))
        }
        CompareOp::In => {
            let lhs = lhs_value(compare, ctx, registry)?;
            Ok(eval_membership(compare, &lhs, ctx, registry)?)
        }
        CompareOp::Eq | CompareOp::NotEq | CompareOp::Lt | CompareOp::Lte | CompareOp::Gt | CompareOp::Gte => {
            let lhs = lhs_value(compare, ctx, registry)?;
            let rhs = rhs_single_value(compare, ctx, registry)?;
            if is_class_attribute(&compare.lhs) && matches!(compare.op, CompareOp::Eq | CompareOp::NotEq) {
                let is_member = class_tokens(&lhs.display_text()).any(|t| t == rhs.display_text());
                return Ok(if compare.op == CompareOp::Eq { is_member } else { !is_member });
            }
            Ok(compare_ordered(compare.op, &lhs, &rhs))
        }
    }
}

fn lhs_presence(compare: &CompareExpr, ctx: &dyn RowContext) -> Result<bool, RuntimeError> {
    if compare.lhs_expr.is_some() {
        // Function-valued LHS: presence means "not null".
        return Ok(true);
    }
    ctx.has_value(&compare.lhs)
}

fn rhs_single_value(compare: &CompareExpr, ctx: &dyn RowContext, registry: &FunctionRegistry) -> Result<Value, RuntimeError> {
    if let Some(expr) = &compare.rhs_expr {
        return eval_scalar(expr, ctx, registry);
    }
    Ok(Value::text(compare.rhs.values.first().cloned().unwrap_or_default()))
}

fn eval_membership(compare: &CompareExpr, lhs: &Value, ctx: &dyn RowContext, registry: &FunctionRegistry) -> Result<bool, RuntimeError> {
    if is_class_attribute(&compare.lhs) {
        let tokens: Vec<&str> = class_tokens(&lhs.display_text()).collect();
        return Ok(compare.rhs.values.iter().any(|v| tokens.contains(&v.as_str())));
    }
    if !compare.rhs_expr_list.is_empty() {
        for expr in &compare.rhs_expr_list {
            let candidate = eval_scalar(expr, ctx, registry)?;
            if values_equal(lhs, &candidate) {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    Ok(compare.rhs.values.iter().any(|v| values_equal(lhs, &Value::text(v.clone()))))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a.display_text() == b.display_text(),
    }
}

/// Numeric comparison when both sides parse as integers, otherwise
/// byte-wise string comparison.
fn compare_ordered(op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
    let ordering = match (lhs.as_i64(), rhs.as_i64()) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => lhs.display_text().cmp(&rhs.display_text()),
    };
    match op {
        CompareOp::Eq => ordering == std::cmp::Ordering::Equal,
        CompareOp::NotEq => ordering != std::cmp::Ordering::Equal,
        CompareOp::Lt => ordering == std::cmp::Ordering::Less,
        CompareOp::Lte => ordering != std::cmp::Ordering::Greater,
        CompareOp::Gt => ordering == std::cmp::Ordering::Greater,
        CompareOp::Gte => ordering != std::cmp::Ordering::Less,
        _ => false,
    }
}

fn is_class_attribute(operand: &Operand) -> bool {
    operand.field_kind == markql_ir::FieldKind::Attribute && operand.attribute.eq_ignore_ascii_case("class")
}

fn class_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split_ascii_whitespace()
}

fn contains_icase(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

/// `CONTAINS`/`CONTAINS ALL`/`CONTAINS ANY`: plain `CONTAINS` is a
/// case-insensitive substring test against the whole value; `ALL`/`ANY`
/// split the right-hand value on whitespace into needles and require
/// every/any of them to appear as a substring (not a token match — that's
/// `class =`/`class IN`'s job).
fn eval_contains(op: CompareOp, haystack: &str, rhs: &str) -> bool {
    match op {
        CompareOp::Contains => contains_icase(haystack, rhs),
        CompareOp::ContainsAll => rhs.split_ascii_whitespace().all(|needle| contains_icase(haystack, needle)),
        CompareOp::ContainsAny => {
            let mut needles = rhs.split_ascii_whitespace().peekable();
            if needles.peek().is_none() {
                return false;
            }
            needles.any(|needle| contains_icase(haystack, needle))
        }
        _ => false,
    }
}

/// ASCII-case-insensitive SQL `LIKE`: `%` matches any run of characters,
/// `_` matches exactly one. Implemented as a streaming two-pointer scan
/// (backtracking only on a `%`) rather than compiling a regex per call.
fn like_match(text: &str, pattern: &str) -> bool {
    let t: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
    let p: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let (mut ti, mut pi) = (0usize, 0usize);
    let (mut star_pi, mut star_ti) = (None, 0usize);

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) {
            ti += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(sp) = star_pi {
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '%' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_match_handles_percent_and_underscore() {
        assert!(like_match("hello world", "hel%rld"));
        assert!(like_match("cat", "c_t"));
        assert!(!like_match("cats", "c_t"));
        assert!(like_match("ANYTHING", "%"));
    }

    #[test]
    fn contains_all_requires_every_token() {
        assert!(eval_contains(CompareOp::ContainsAll, "the quick brown fox", "quick fox"));
        assert!(!eval_contains(CompareOp::ContainsAll, "the quick brown fox", "quick slow"));
    }

    #[test]
    fn contains_any_requires_one_token() {
        assert!(eval_contains(CompareOp::ContainsAny, "the quick brown fox", "slow fox"));
        assert!(!eval_contains(CompareOp::ContainsAny, "the quick brown fox", "slow turtle"));
    }

    #[test]
    fn compare_ordered_is_numeric_when_both_sides_parse() {
        assert!(compare_ordered(CompareOp::Lt, &Value::text("9"), &Value::text("10")));
        assert!(!compare_ordered(CompareOp::Lt, &Value::text("b"), &Value::text("10")));
    }
}
