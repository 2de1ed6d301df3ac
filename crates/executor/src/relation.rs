// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The relation-oriented [`RowContext`] adapter: one tuple assembled from
//! one or more aliased sources (`FROM ... JOIN ...`), used by `WITH`
//! materialization and the join pipeline (engine specification §4.8).
//!
//! A tuple has no single node identity, so `RelationRow` binds each alias
//! to its own [`RelationBinding`] rather than sharing one tree across the
//! whole row; a `LEFT JOIN` with no match binds an alias to an unmatched
//! binding instead of a node id.

use std::collections::BTreeMap;
use std::rc::Rc;

use markql_functions::{FunctionRegistry, Value};
use markql_ir::{Axis, Expr, FieldKind, Operand, ScalarExpr, ScalarExprKind};

use crate::domfn::{self, TreeIndex};
use crate::error::RuntimeError;
use crate::eval::{RowContext, eval_expr};

/// One alias's binding within a relation tuple.
///
/// `Node` binds directly to a real document node, the shape every
/// `FROM`/non-virtual `JOIN` source produces. `Virtual` binds to a CTE's
/// own projected columns (`row_id`, `val`, ...) instead: a CTE materializes
/// its full `FROM`/`JOIN`/`WHERE`/`SELECT` pipeline once, and the aliases it
/// used internally (`r`, `c`, ...) aren't visible outside it, only the
/// flat column values its own `SELECT` list produced.
#[derive(Clone)]
pub enum RelationBinding {
    Node { tree: Rc<TreeIndex>, node_id: Option<u32> },
    Virtual(Option<Rc<BTreeMap<String, Value>>>),
}

impl RelationBinding {
    pub fn matched(tree: Rc<TreeIndex>, node_id: u32) -> Self {
        Self::Node { tree, node_id: Some(node_id) }
    }

    pub fn unmatched(tree: Rc<TreeIndex>) -> Self {
        Self::Node { tree, node_id: None }
    }

    pub fn matched_virtual(fields: Rc<BTreeMap<String, Value>>) -> Self {
        Self::Virtual(Some(fields))
    }

    pub fn unmatched_virtual() -> Self {
        Self::Virtual(None)
    }

    /// A same-shape unmatched placeholder for a `LEFT JOIN` with no
    /// surviving right-hand candidate.
    pub fn unmatched_like(&self) -> Self {
        match self {
            Self::Node { tree, .. } => Self::unmatched(Rc::clone(tree)),
            Self::Virtual(_) => Self::unmatched_virtual(),
        }
    }
}

/// One assembled tuple: an ordered map from alias to its binding, built up
/// one `JOIN` at a time. `BTreeMap` keeps alias iteration order
/// deterministic wherever a row is rendered without an explicit
/// projection (`SELECT *`-equivalent paths).
#[derive(Clone, Default)]
pub struct RelationRow {
    pub bindings: BTreeMap<String, RelationBinding>,
}

impl RelationRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binding(mut self, alias: impl Into<String>, binding: RelationBinding) -> Self {
        self.bindings.insert(alias.into(), binding);
        self
    }

    pub fn binding(&self, alias: &str) -> Option<&RelationBinding> {
        self.bindings.iter().find(|(a, _)| a.eq_ignore_ascii_case(alias)).map(|(_, b)| b)
    }
}

/// Adapts one [`RelationRow`], plus a default alias for unqualified
/// operands, to [`RowContext`]. The validator requires every operand in a
/// multi-source query to be qualified once more than one alias is bound,
/// but a single-source `WITH`/join-free relation row still allows a bare
/// operand, which resolves against `default_alias` the same way a
/// node-oriented query's bare operand resolves against the implicit
/// `doc` source.
pub struct RelationContext<'a> {
    pub row: &'a RelationRow,
    pub default_alias: &'a str,
    pub registry: &'a FunctionRegistry,
}

impl<'a> RelationContext<'a> {
    pub fn new(row: &'a RelationRow, default_alias: &'a str, registry: &'a FunctionRegistry) -> Self {
        Self { row, default_alias, registry }
    }

    fn resolve_alias<'op>(&self, operand: &'op Operand) -> &'op str
    where
        'a: 'op,
    {
        operand.qualifier.as_deref().unwrap_or(self.default_alias)
    }

    fn binding(&self, alias: &str) -> Result<&RelationBinding, RuntimeError> {
        self.row.binding(alias).ok_or_else(|| RuntimeError::UnknownIdentifier {
            identifier: alias.to_string(),
            bound: self.row.bindings.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }

    fn axis_first(&self, binding: &RelationBinding, axis: Axis) -> Option<u32> {
        match binding {
            RelationBinding::Node { tree, node_id } => {
                let node_id = (*node_id)?;
                tree.axis_nodes(node_id, axis).into_iter().next()
            }
            RelationBinding::Virtual(_) => None,
        }
    }

    fn field_value(&self, tree: &TreeIndex, id: u32, field_kind: FieldKind, attribute: &str) -> Value {
        let node = tree.node(id);
        match field_kind {
            FieldKind::Attribute => Value::from(node.attr(attribute).map(str::to_string)),
            FieldKind::AttributesMap => Value::Number(node.attributes.len() as i64),
            FieldKind::Tag => Value::text(node.tag.clone()),
            FieldKind::Text => Value::text(node.text.clone()),
            FieldKind::NodeId => Value::Number(id as i64),
            FieldKind::ParentId => Value::from(node.parent_id.map(|p| p.to_string())),
            FieldKind::SiblingPos => Value::Number(node.sibling_pos as i64),
            FieldKind::MaxDepth => Value::Number(node.max_depth as i64),
            FieldKind::DocOrder => Value::Number(node.doc_order as i64),
        }
    }

    /// A virtual (CTE-projected) binding only answers `SelfAxis` accesses
    /// by its own column name; it has no tree to walk axes over, so a core
    /// field word (`tag`, `node_id`, ...) maps to the column of that name
    /// rather than a real node field, same as any other projected column.
    fn virtual_value(fields: Option<&BTreeMap<String, Value>>, axis: Axis, field_kind: FieldKind, attribute: &str) -> Value {
        if axis != Axis::SelfAxis {
            return Value::Null;
        }
        let key = match field_kind {
            FieldKind::Attribute => attribute,
            FieldKind::Tag => "tag",
            FieldKind::Text => "text",
            FieldKind::NodeId => "node_id",
            FieldKind::ParentId => "parent_id",
            FieldKind::SiblingPos => "sibling_pos",
            FieldKind::MaxDepth => "max_depth",
            FieldKind::DocOrder => "doc_order",
            FieldKind::AttributesMap => return Value::Null,
        };
        fields.and_then(|f| f.get(key)).cloned().unwrap_or(Value::Null)
    }

    /// The alias-matched form of `TEXT(alias)`/`INNER_HTML(alias)`: reads
    /// the bound node's own text/inner HTML directly, ignoring any further
    /// arguments (depth, attribute name) a tag-scoped call would take.
    fn alias_html_value(binding: &RelationBinding, upper: &str) -> Value {
        match binding {
            RelationBinding::Node { tree, node_id: Some(id) } => {
                let node = tree.node(*id);
                if upper == "INNER_HTML" || upper == "RAW_INNER_HTML" {
                    Value::text(node.inner_html.clone())
                } else {
                    Value::text(node.text.clone())
                }
            }
            RelationBinding::Node { node_id: None, .. } => Value::Null,
            RelationBinding::Virtual(fields) => {
                let key = if upper == "INNER_HTML" || upper == "RAW_INNER_HTML" { "inner_html" } else { "text" };
                fields.as_deref().and_then(|f| f.get(key)).cloned().unwrap_or(Value::Null)
            }
        }
    }
}

impl<'a> RowContext for RelationContext<'a> {
    fn value_of(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        let alias = self.resolve_alias(operand);
        let binding = self.binding(alias)?;
        match binding {
            RelationBinding::Node { tree, .. } => match self.axis_first(binding, operand.axis) {
                Some(id) => Ok(self.field_value(tree, id, operand.field_kind, &operand.attribute)),
                None => Ok(Value::Null),
            },
            RelationBinding::Virtual(fields) => {
                Ok(Self::virtual_value(fields.as_deref(), operand.axis, operand.field_kind, &operand.attribute))
            }
        }
    }

    fn has_value(&self, operand: &Operand) -> Result<bool, RuntimeError> {
        let alias = self.resolve_alias(operand);
        let binding = self.binding(alias)?;
        match binding {
            RelationBinding::Node { tree, .. } => {
                let Some(id) = self.axis_first(binding, operand.axis) else {
                    return Ok(false);
                };
                let node = tree.node(id);
                Ok(match operand.field_kind {
                    FieldKind::AttributesMap => !node.attributes.is_empty(),
                    FieldKind::Attribute => node.attr(&operand.attribute).is_some(),
                    FieldKind::ParentId => node.parent_id.is_some(),
                    _ => true,
                })
            }
            RelationBinding::Virtual(fields) => {
                Ok(!matches!(Self::virtual_value(fields.as_deref(), operand.axis, operand.field_kind, &operand.attribute), Value::Null))
            }
        }
    }

    fn direct_text_of_self(&self) -> Result<String, RuntimeError> {
        let binding = self.binding(self.default_alias)?;
        match binding {
            RelationBinding::Node { tree, node_id: Some(id) } => Ok(tree.direct_text(*id)),
            _ => Ok(String::new()),
        }
    }

    fn exists(&self, axis: Axis, where_clause: Option<&Expr>) -> Result<bool, RuntimeError> {
        let binding = self.binding(self.default_alias)?;
        let RelationBinding::Node { tree, node_id: Some(node_id) } = binding else {
            return Ok(false);
        };
        for id in tree.axis_nodes(*node_id, axis) {
            let sub_row = self
                .row
                .clone()
                .with_binding(self.default_alias.to_string(), RelationBinding::matched(Rc::clone(tree), id));
            let sub_ctx = RelationContext::new(&sub_row, self.default_alias, self.registry);
            let matched = match where_clause {
                Some(expr) => eval_expr(expr, &sub_ctx, self.registry)?,
                None => true,
            };
            if matched {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn self_label(&self) -> Result<Value, RuntimeError> {
        let binding = self.binding(self.default_alias)?;
        match binding {
            RelationBinding::Node { tree, node_id: Some(id) } => Ok(Value::text(tree.node(*id).tag.clone())),
            _ => Ok(Value::Null),
        }
    }

    fn call_dom_function(&self, name: &str, args: &[ScalarExpr], _registry: &FunctionRegistry) -> Result<Value, RuntimeError> {
        // `TEXT`/`DIRECT_TEXT`/`INNER_HTML`/`RAW_INNER_HTML` take a tag
        // name as their first argument in the node-oriented path, but in a
        // joined relation that argument can equally name a bound alias
        // (`TEXT(c)` where `c` is itself a `JOIN` alias) — checked first,
        // since an alias match always wins over a same-named tag.
        let upper = name.to_ascii_uppercase();
        if matches!(upper.as_str(), "TEXT" | "DIRECT_TEXT" | "INNER_HTML" | "RAW_INNER_HTML") {
            if let Some(target) = dom_target_alias(args) {
                if let Some(binding) = self.row.binding(target) {
                    return Ok(Self::alias_html_value(binding, &upper));
                }
            }
        }
        let binding = self.binding(self.default_alias)?;
        match binding {
            RelationBinding::Node { tree, node_id: Some(id) } => domfn::call_dom_function(tree, *id, name, args),
            _ => Ok(Value::Null),
        }
    }
}

/// The literal tag-name-or-alias argument DOM wrapper functions take as
/// their first argument, if it's a plain string literal (an alias can
/// only ever appear this way; `TEXT(self)` parses to `ScalarExpr::self_ref`
/// instead and never reaches this check).
fn dom_target_alias(args: &[ScalarExpr]) -> Option<&str> {
    match args.first()?.kind {
        ScalarExprKind::StringLiteral(ref s) => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_html::parse_html;
    use markql_ir::Span;

    fn tree_for(html: &str) -> Rc<TreeIndex> {
        Rc::new(TreeIndex::new(Rc::new(parse_html(html))))
    }

    #[test]
    fn value_of_resolves_qualified_operand_against_its_alias() {
        let left = tree_for("<div id=\"l\"></div>");
        let right = tree_for("<div id=\"r\"></div>");
        let row = RelationRow::new()
            .with_binding("a", RelationBinding::matched(Rc::clone(&left), 0))
            .with_binding("b", RelationBinding::matched(Rc::clone(&right), 0));
        let registry = FunctionRegistry::new();
        let ctx = RelationContext::new(&row, "a", &registry);
        let operand = Operand::new(Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 0))
            .with_attribute("id")
            .with_qualifier("b");
        assert_eq!(ctx.value_of(&operand).unwrap(), Value::text("r"));
    }

    #[test]
    fn unmatched_left_join_binding_is_null() {
        let left = tree_for("<div id=\"l\"></div>");
        let right = tree_for("<div></div>");
        let row = RelationRow::new()
            .with_binding("a", RelationBinding::matched(Rc::clone(&left), 0))
            .with_binding("b", RelationBinding::unmatched(Rc::clone(&right)));
        let registry = FunctionRegistry::new();
        let ctx = RelationContext::new(&row, "a", &registry);
        let operand = Operand::new(Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 0))
            .with_attribute("id")
            .with_qualifier("b");
        assert_eq!(ctx.value_of(&operand).unwrap(), Value::Null);
    }

    #[test]
    fn unqualified_operand_resolves_against_default_alias() {
        let left = tree_for("<div id=\"l\"></div>");
        let row = RelationRow::new().with_binding("a", RelationBinding::matched(Rc::clone(&left), 0));
        let registry = FunctionRegistry::new();
        let ctx = RelationContext::new(&row, "a", &registry);
        let operand = Operand::new(Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 0)).with_attribute("id");
        assert_eq!(ctx.value_of(&operand).unwrap(), Value::text("l"));
    }
}
