// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `ORDER BY` + `LIMIT`, shared by the node-oriented and relation-oriented
//! pipelines: both produce a `Vec<ResultRow>` before this stage runs.

use std::cmp::Ordering;

use markql_functions::Value;
use markql_ir::OrderBy;

use crate::result::ResultRow;

fn field_value(row: &ResultRow, field: &str) -> Value {
    let field = field.strip_prefix("doc.").unwrap_or(field);
    match field {
        "tag" => row.tag.clone().map(Value::text).unwrap_or(Value::Null),
        "text" => row.text.clone().map(Value::text).unwrap_or(Value::Null),
        "inner_html" => row.inner_html.clone().map(Value::text).unwrap_or(Value::Null),
        "node_id" => row.node_id.map(|n| Value::Number(n as i64)).unwrap_or(Value::Null),
        "parent_id" => row.parent_id.map(|n| Value::Number(n as i64)).unwrap_or(Value::Null),
        "sibling_pos" => row.sibling_pos.map(|n| Value::Number(n as i64)).unwrap_or(Value::Null),
        "max_depth" => row.max_depth.map(|n| Value::Number(n as i64)).unwrap_or(Value::Null),
        "doc_order" => row.doc_order.map(|n| Value::Number(n as i64)).unwrap_or(Value::Null),
        other => {
            if let Some(value) = row.computed_fields.get(other) {
                return value.clone();
            }
            if let Some(attr) = other.strip_prefix("attributes.") {
                return row.attributes.get(attr).cloned().map(Value::text).unwrap_or(Value::Null);
            }
            // Relation-path `alias.field` forms resolve to the same
            // computed-field bucket the relation pipeline populates.
            row.computed_fields.get(other).cloned().unwrap_or(Value::Null)
        }
    }
}

/// Numeric comparison when both sides parse as integers (`Value::as_i64`),
/// `Null` sorts before any present value, otherwise byte-wise string
/// comparison — matches the engine's `Eq`/`Lt`/... coercion rule so
/// `ORDER BY count` and `WHERE count > 1` agree on what "numeric" means.
fn value_ordering(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.display_text().cmp(&b.display_text()),
    }
}

/// Stable multi-key sort by `order_by`, in clause order (earlier keys take
/// precedence), then truncates to `limit` if given.
pub fn order_and_limit(mut rows: Vec<ResultRow>, order_by: &[OrderBy], limit: Option<usize>) -> Vec<ResultRow> {
    if !order_by.is_empty() {
        rows.sort_by(|a, b| {
            for key in order_by {
                let ordering = value_ordering(&field_value(a, &key.field), &field_value(b, &key.field));
                let ordering = if key.descending { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_ir::Span;

    fn row_with_doc_order(n: u32) -> ResultRow {
        ResultRow { doc_order: Some(n), ..ResultRow::default() }
    }

    #[test]
    fn orders_by_doc_order_ascending_by_default() {
        let rows = vec![row_with_doc_order(3), row_with_doc_order(1), row_with_doc_order(2)];
        let order_by = vec![OrderBy { field: "doc_order".to_string(), descending: false, span: Span::new(0, 0) }];
        let sorted = order_and_limit(rows, &order_by, None);
        let order: Vec<u32> = sorted.iter().map(|r| r.doc_order.unwrap()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn limit_truncates_after_ordering() {
        let rows = vec![row_with_doc_order(3), row_with_doc_order(1), row_with_doc_order(2)];
        let order_by = vec![OrderBy { field: "doc_order".to_string(), descending: true, span: Span::new(0, 0) }];
        let sorted = order_and_limit(rows, &order_by, Some(2));
        let order: Vec<u32> = sorted.iter().map(|r| r.doc_order.unwrap()).collect();
        assert_eq!(order, vec![3, 2]);
    }
}
