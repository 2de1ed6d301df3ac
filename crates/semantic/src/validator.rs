// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Static validation rules that the parser's grammar cannot express:
//! projection shape, scoped-WHERE requirements on whole-subtree accessors,
//! alias/qualifier binding, `ORDER BY` field restrictions, the
//! attributes-map comparison restriction, export sink compatibility, and
//! `LIMIT` bounds. Parse-time checks (duplicate CTE names, derived table
//! aliasing, `JOIN ... ON` shape) already live in the parser and are not
//! repeated here.

use markql_functions::FunctionRegistry;
use markql_ir::{
    Aggregate, CompareOp, Expr, FieldKind, FlattenExtractExpr, FlattenExtractKind, OrderBy, Query,
    ScalarExpr, ScalarExprKind, SelectItem,
};

use crate::error::ValidationError;

/// The implementation-chosen ceiling for `LIMIT` (§4.3).
pub const MAX_LIMIT: usize = 10_000_000;

const ORDER_BY_FIELDS: &[&str] = &[
    "node_id",
    "tag",
    "text",
    "parent_id",
    "sibling_pos",
    "max_depth",
    "doc_order",
];

const SUMMARIZE_ORDER_BY_FIELDS: &[&str] = &["tag", "count"];

/// Runs every static validation rule against `query`, returning every
/// violation found rather than stopping at the first (so `lint_query` can
/// surface them all at once).
pub fn validate(query: &Query) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let registry = FunctionRegistry::new();

    let bound_aliases = collect_bound_aliases(query, &mut errors);

    check_projection_shape(query, &mut errors);
    check_scoped_where_requirement(query, &mut errors);
    check_order_by(query, &mut errors);
    check_export_sink(query, &mut errors);
    check_limit(query, &mut errors);

    if let Some(where_clause) = &query.where_clause {
        check_expr(where_clause, &bound_aliases, &registry, &mut errors);
    }
    for join in &query.joins {
        if let Some(on) = &join.on {
            check_expr(on, &bound_aliases, &registry, &mut errors);
        }
    }
    for item in &query.select_items {
        if let Some(expr) = &item.expr {
            check_scalar_expr(expr, &bound_aliases, &registry, &mut errors);
        }
        for (i, flatten_expr) in item.flatten_extract_exprs.iter().enumerate() {
            let seen = &item.flatten_extract_aliases[..i.min(item.flatten_extract_aliases.len())];
            check_flatten_extract_expr(flatten_expr, &bound_aliases, seen, &registry, &mut errors);
        }
    }

    errors
}

/// Collects every alias bound by `FROM`/`JOIN` in this query's own scope,
/// flagging duplicates. CTE names are bound only as `FROM <name>` sources,
/// not as standalone qualifiers, so they are not added here.
fn collect_bound_aliases(query: &Query, errors: &mut Vec<ValidationError>) -> Vec<String> {
    let mut aliases = Vec::new();
    push_alias(query.source.effective_alias(), &mut aliases, errors);
    for join in &query.joins {
        push_alias(join.right_source.effective_alias(), &mut aliases, errors);
    }
    aliases
}

fn push_alias(alias: &str, aliases: &mut Vec<String>, errors: &mut Vec<ValidationError>) {
    if aliases.iter().any(|a: &String| a.eq_ignore_ascii_case(alias)) {
        errors.push(ValidationError::new(format!("Duplicate source alias '{alias}'")));
        return;
    }
    aliases.push(alias.to_string());
}

fn check_qualifier(qualifier: &str, bound_aliases: &[String]) -> Option<ValidationError> {
    if bound_aliases.iter().any(|a| a.eq_ignore_ascii_case(qualifier)) {
        return None;
    }
    if qualifier.eq_ignore_ascii_case("doc") {
        let actual = bound_aliases.first().map(String::as_str).unwrap_or("doc");
        return Some(ValidationError::new(format!(
            "Identifier 'doc' is not bound in this query; the source is addressed as '{actual}'"
        )));
    }
    Some(ValidationError::new(format!(
        "Unknown identifier '{qualifier}'; expected one of the bound source aliases: {}",
        bound_aliases.join(", ")
    )))
}

fn check_operand(
    operand: &markql_ir::Operand,
    bound_aliases: &[String],
    errors: &mut Vec<ValidationError>,
) {
    if let Some(qualifier) = &operand.qualifier {
        if let Some(err) = check_qualifier(qualifier, bound_aliases) {
            errors.push(err);
        }
    }
}

fn check_scalar_expr(
    expr: &ScalarExpr,
    bound_aliases: &[String],
    registry: &FunctionRegistry,
    errors: &mut Vec<ValidationError>,
) {
    match &expr.kind {
        ScalarExprKind::Operand(operand) => check_operand(operand, bound_aliases, errors),
        ScalarExprKind::FunctionCall { name, args } => {
            check_function_call(name, args.len(), registry, errors);
            for arg in args {
                check_scalar_expr(arg, bound_aliases, registry, errors);
            }
        }
        ScalarExprKind::SelfRef(_)
        | ScalarExprKind::StringLiteral(_)
        | ScalarExprKind::NumberLiteral(_)
        | ScalarExprKind::NullLiteral => {}
    }
}

fn check_function_call(
    name: &str,
    arg_count: usize,
    registry: &FunctionRegistry,
    errors: &mut Vec<ValidationError>,
) {
    match registry.get(name) {
        None => errors.push(ValidationError::new(format!("Unknown function '{name}'"))),
        Some(meta) if !meta.arity.accepts(arg_count) => errors.push(ValidationError::new(format!(
            "Function '{name}' called with {arg_count} argument(s); expected {}",
            describe_arity(&meta.arity)
        ))),
        Some(_) => {}
    }
}

fn describe_arity(arity: &markql_functions::Arity) -> String {
    match arity.max {
        Some(max) if max == arity.min => format!("{}", arity.min),
        Some(max) => format!("between {} and {max}", arity.min),
        None => format!("at least {}", arity.min),
    }
}

fn check_expr(
    expr: &Expr,
    bound_aliases: &[String],
    registry: &FunctionRegistry,
    errors: &mut Vec<ValidationError>,
) {
    match expr {
        Expr::Compare(cmp) => {
            check_operand(&cmp.lhs, bound_aliases, errors);
            if cmp.lhs.field_kind == FieldKind::AttributesMap
                && !matches!(cmp.op, CompareOp::IsNull | CompareOp::IsNotNull)
            {
                errors.push(ValidationError::new(
                    "The attributes map only supports IS NULL / IS NOT NULL comparisons; compare a specific attribute instead",
                ));
            }
            if let Some(lhs_expr) = &cmp.lhs_expr {
                check_scalar_expr(lhs_expr, bound_aliases, registry, errors);
            }
            if let Some(rhs_expr) = &cmp.rhs_expr {
                check_scalar_expr(rhs_expr, bound_aliases, registry, errors);
            }
            for rhs in &cmp.rhs_expr_list {
                check_scalar_expr(rhs, bound_aliases, registry, errors);
            }
        }
        Expr::Exists(exists) => {
            if let Some(inner) = &exists.where_clause {
                check_expr(inner, bound_aliases, registry, errors);
            }
        }
        Expr::Binary(binary) => {
            check_expr(&binary.left, bound_aliases, registry, errors);
            check_expr(&binary.right, bound_aliases, registry, errors);
        }
    }
}

fn check_flatten_extract_expr(
    expr: &FlattenExtractExpr,
    bound_aliases: &[String],
    seen_aliases: &[String],
    registry: &FunctionRegistry,
    errors: &mut Vec<ValidationError>,
) {
    match expr.kind {
        FlattenExtractKind::AliasRef => {
            if !seen_aliases.iter().any(|a| a == &expr.alias_ref) {
                errors.push(ValidationError::new(format!(
                    "Unknown identifier '{}'; expected one of the earlier PROJECT aliases: {}",
                    expr.alias_ref,
                    seen_aliases.join(", ")
                )));
            }
        }
        FlattenExtractKind::FunctionCall => {
            check_function_call(&expr.function_name, expr.args.len(), registry, errors);
        }
        FlattenExtractKind::OperandRef => {
            if let Some(operand) = &expr.operand {
                check_operand(operand, bound_aliases, errors);
            }
        }
        _ => {}
    }
    for arg in &expr.args {
        check_flatten_extract_expr(arg, bound_aliases, seen_aliases, registry, errors);
    }
    for condition in &expr.case_when_conditions {
        check_expr(condition, bound_aliases, registry, errors);
    }
    for value in &expr.case_when_values {
        check_flatten_extract_expr(value, bound_aliases, seen_aliases, registry, errors);
    }
    if let Some(else_branch) = &expr.case_else {
        check_flatten_extract_expr(else_branch, bound_aliases, seen_aliases, registry, errors);
    }
}

/// Whether a `SelectItem` is a whole-subtree scalar projection (`TEXT()`,
/// `INNER_HTML()`, `RAW_INNER_HTML()`) that needs a non-tag `WHERE` filter
/// to avoid dumping the entire matched subtree unscoped.
fn is_whole_subtree_projection(item: &SelectItem) -> bool {
    item.text_function || item.inner_html_function || item.raw_inner_html_function
}

fn check_scoped_where_requirement(query: &Query, errors: &mut Vec<ValidationError>) {
    if !query.select_items.iter().any(is_whole_subtree_projection) {
        return;
    }
    let has_non_tag_predicate = query
        .where_clause
        .as_ref()
        .map(has_non_tag_predicate)
        .unwrap_or(false);
    if !has_non_tag_predicate {
        errors.push(ValidationError::new(
            "TEXT()/INNER_HTML()/RAW_INNER_HTML() require a WHERE clause with at least one non-tag predicate",
        ));
    }
}

fn has_non_tag_predicate(expr: &Expr) -> bool {
    match expr {
        Expr::Compare(cmp) => cmp.lhs.field_kind != FieldKind::Tag || cmp.lhs_expr.is_some(),
        Expr::Exists(_) => true,
        Expr::Binary(binary) => has_non_tag_predicate(&binary.left) || has_non_tag_predicate(&binary.right),
    }
}

fn check_projection_shape(query: &Query, errors: &mut Vec<ValidationError>) {
    let items = &query.select_items;
    if items.is_empty() {
        return;
    }

    let aggregate_count = items.iter().filter(|i| i.aggregate != Aggregate::None).count();
    if aggregate_count > 0 && (aggregate_count != items.len() || items.len() != 1) {
        errors.push(ValidationError::new(
            "Aggregates (COUNT/SUMMARIZE/TFIDF) must stand alone and may not be combined with other select items",
        ));
    }

    if aggregate_count == 0 {
        let has_star = items.iter().any(|i| i.is_star());
        let has_tag_only = items.iter().any(|i| is_tag_only(i));
        let has_projected = items.iter().any(|i| is_projected(i));
        if has_projected && (has_tag_only || has_star) {
            errors.push(ValidationError::new(
                "Cannot mix tag-only select items with projected (TEXT()/INNER_HTML()/PROJECT()/expression) items",
            ));
        }
    }

    if !query.exclude_fields.is_empty() && !(items.len() == 1 && items[0].is_star()) {
        errors.push(ValidationError::new(
            "EXCLUDE(...) requires SELECT * as the only select item",
        ));
    }

    if query.to_list && items.len() != 1 {
        errors.push(ValidationError::new(
            "TO LIST() requires exactly one projected column in the SELECT list",
        ));
    }

    if query.to_table {
        let ok = items.len() == 1
            && !items[0].is_star()
            && is_tag_only(&items[0])
            && items[0].tag.eq_ignore_ascii_case("table");
        if !ok {
            errors.push(ValidationError::new(
                "TO TABLE() requires a single tag-only SELECT targeting 'table'",
            ));
        }
    }
}

fn is_tag_only(item: &SelectItem) -> bool {
    item.aggregate == Aggregate::None
        && !item.is_star()
        && !is_projected(item)
        && !item.tag.is_empty()
}

fn is_projected(item: &SelectItem) -> bool {
    item.text_function
        || item.direct_text_function
        || item.inner_html_function
        || item.raw_inner_html_function
        || item.flatten_text
        || item.flatten_extract
        || item.expr_projection
}

fn check_order_by(query: &Query, errors: &mut Vec<ValidationError>) {
    if query.order_by.is_empty() {
        return;
    }
    let is_summarize = query.select_items.iter().any(|i| i.aggregate == Aggregate::Summarize);
    let allowed: &[&str] = if is_summarize { SUMMARIZE_ORDER_BY_FIELDS } else { ORDER_BY_FIELDS };
    for ob in &query.order_by {
        let field_name = base_field_name(ob);
        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(field_name)) {
            errors.push(ValidationError::new(format!(
                "ORDER BY field '{}' is not supported here; allowed fields: {}",
                ob.field,
                allowed.join(", ")
            )));
        }
    }
}

fn base_field_name(ob: &OrderBy) -> &str {
    match ob.field.rsplit_once('.') {
        Some((_, field)) => field,
        None => ob.field.as_str(),
    }
}

fn check_export_sink(query: &Query, errors: &mut Vec<ValidationError>) {
    let Some(sink) = &query.export_sink else {
        return;
    };
    if query.to_table && matches!(sink.kind, markql_ir::ExportKind::Json | markql_ir::ExportKind::Ndjson) {
        errors.push(ValidationError::new(
            "Export to JSON/NDJSON is not permitted for TO TABLE() results; use CSV or PARQUET",
        ));
    }
    if sink.path.trim().is_empty() {
        errors.push(ValidationError::new("Export sink requires a non-empty destination path"));
    }
}

fn check_limit(query: &Query, errors: &mut Vec<ValidationError>) {
    if let Some(limit) = query.limit {
        if limit > MAX_LIMIT {
            errors.push(ValidationError::new(format!(
                "LIMIT {limit} exceeds the maximum supported value of {MAX_LIMIT}"
            )));
        }
    }
}

/// The set of aliases a query's `FROM`/`JOIN` sources are addressed by.
/// Exposed so the relation-oriented executor can resolve unqualified and
/// `doc.`-qualified references the same way the validator does.
pub fn effective_aliases(query: &Query) -> Vec<String> {
    let mut aliases = vec![query.source.effective_alias().to_string()];
    for join in &query.joins {
        aliases.push(join.right_source.effective_alias().to_string());
    }
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_parser::parse;

    fn validate_sql(sql: &str) -> Vec<ValidationError> {
        let query = parse(sql).expect("query should parse");
        validate(&query)
    }

    #[test]
    fn plain_selection_has_no_errors() {
        let errors = validate_sql("SELECT div FROM document WHERE attributes.id = 'c'");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let errors = validate_sql("SELECT d.tag FROM document AS d JOIN document AS d ON d.tag = 'x'");
        assert!(errors.iter().any(|e| e.message.contains("Duplicate source alias")));
    }

    #[test]
    fn unbound_qualifier_is_rejected() {
        let errors = validate_sql("SELECT rows.tag FROM document WHERE rows.attributes.id = 'x'");
        assert!(errors.iter().any(|e| e.message.contains("Unknown identifier")));
    }

    #[test]
    fn doc_qualifier_after_rename_gets_specific_message() {
        let errors = validate_sql("SELECT doc.tag FROM document AS d WHERE doc.tag = 'div'");
        assert!(errors.iter().any(|e| e.message.contains("Identifier 'doc' is not bound")));
    }

    #[test]
    fn text_function_without_where_is_rejected() {
        let errors = validate_sql("SELECT TEXT(p) FROM document");
        assert!(errors
            .iter()
            .any(|e| e.message.contains("TEXT()/INNER_HTML()/RAW_INNER_HTML()")));
    }

    #[test]
    fn text_function_with_tag_only_where_is_still_rejected() {
        let errors = validate_sql("SELECT TEXT(p) FROM document WHERE tag = 'p'");
        assert!(errors
            .iter()
            .any(|e| e.message.contains("TEXT()/INNER_HTML()/RAW_INNER_HTML()")));
    }

    #[test]
    fn text_function_with_attribute_where_passes() {
        let errors = validate_sql("SELECT TEXT(p) FROM document WHERE attributes.id = 'intro'");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn to_list_requires_single_column() {
        let errors = validate_sql("SELECT div, span FROM document TO LIST()");
        assert!(errors.iter().any(|e| e.message.contains("TO LIST()")));
    }

    #[test]
    fn to_table_requires_tag_only_table_select() {
        let errors = validate_sql("SELECT div FROM document TO TABLE()");
        assert!(errors.iter().any(|e| e.message.contains("TO TABLE()")));
    }

    #[test]
    fn to_table_accepts_table_tag() {
        let errors = validate_sql("SELECT table FROM document TO TABLE()");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn order_by_rejects_unsupported_field() {
        let errors = validate_sql("SELECT div FROM document ORDER BY attributes");
        assert!(errors.iter().any(|e| e.message.contains("ORDER BY")));
    }

    #[test]
    fn order_by_accepts_allowed_field() {
        let errors = validate_sql("SELECT div FROM document ORDER BY doc_order");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn attributes_map_rejects_equality() {
        let errors = validate_sql("SELECT div FROM document WHERE attributes = 'x'");
        assert!(errors.iter().any(|e| e.message.contains("attributes map")));
    }

    #[test]
    fn attributes_map_accepts_is_null() {
        let errors = validate_sql("SELECT div FROM document WHERE attributes IS NOT NULL");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn limit_over_maximum_is_rejected() {
        let errors = validate_sql("SELECT div FROM document LIMIT 99999999999999");
        assert!(errors.iter().any(|e| e.message.contains("LIMIT")));
    }

    #[test]
    fn unknown_function_is_rejected() {
        let errors = validate_sql("SELECT div FROM document WHERE nope('x') = 'hi'");
        assert!(errors.iter().any(|e| e.message.contains("Unknown function")));
    }
}
