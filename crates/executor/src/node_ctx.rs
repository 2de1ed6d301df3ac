// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The node-oriented [`RowContext`] adapter: one [`HtmlNode`] in one
//! [`TreeIndex`], used by the candidate-selection and `EXISTS`/function
//! evaluation of the node-oriented execution path (engine specification
//! §4.5).

use markql_functions::{FunctionRegistry, Value};
use markql_ir::{Axis, Expr, FieldKind, Operand, ScalarExpr};

use crate::domfn::{self, TreeIndex};
use crate::error::RuntimeError;
use crate::eval::{RowContext, eval_expr};

#[derive(Clone, Copy)]
pub struct NodeContext<'a> {
    pub tree: &'a TreeIndex,
    pub node_id: u32,
    pub registry: &'a FunctionRegistry,
}

impl<'a> NodeContext<'a> {
    pub fn new(tree: &'a TreeIndex, node_id: u32, registry: &'a FunctionRegistry) -> Self {
        Self { tree, node_id, registry }
    }

    fn axis_first(&self, axis: Axis) -> Option<u32> {
        self.tree.axis_nodes(self.node_id, axis).into_iter().next()
    }

    fn field_value(&self, id: u32, field_kind: FieldKind, attribute: &str) -> Value {
        let node = self.tree.node(id);
        match field_kind {
            FieldKind::Attribute => Value::from(node.attr(attribute).map(str::to_string)),
            // Only IS [NOT] NULL is legal against the whole map (the
            // validator enforces this); a scalar read never happens in
            // practice, but a node id still beats panicking.
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
}

impl<'a> RowContext for NodeContext<'a> {
    fn value_of(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match self.axis_first(operand.axis) {
            Some(id) => Ok(self.field_value(id, operand.field_kind, &operand.attribute)),
            None => Ok(Value::Null),
        }
    }

    fn has_value(&self, operand: &Operand) -> Result<bool, RuntimeError> {
        let Some(id) = self.axis_first(operand.axis) else {
            return Ok(false);
        };
        let node = self.tree.node(id);
        Ok(match operand.field_kind {
            FieldKind::AttributesMap => !node.attributes.is_empty(),
            FieldKind::Attribute => node.attr(&operand.attribute).is_some(),
            FieldKind::ParentId => node.parent_id.is_some(),
            _ => true,
        })
    }

    fn direct_text_of_self(&self) -> Result<String, RuntimeError> {
        Ok(self.tree.direct_text(self.node_id))
    }

    fn exists(&self, axis: Axis, where_clause: Option<&Expr>) -> Result<bool, RuntimeError> {
        for id in self.tree.axis_nodes(self.node_id, axis) {
            let sub_ctx = NodeContext::new(self.tree, id, self.registry);
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
        Ok(Value::text(self.tree.node(self.node_id).tag.clone()))
    }

    fn call_dom_function(&self, name: &str, args: &[ScalarExpr], _registry: &FunctionRegistry) -> Result<Value, RuntimeError> {
        domfn::call_dom_function(self.tree, self.node_id, name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_html::parse_html;
    use markql_ir::Span;

    #[test]
    fn value_of_resolves_self_field() {
        let doc = parse_html("<div id=\"x\">hi</div>");
        let tree = TreeIndex::new(std::rc::Rc::new(doc));
        let registry = FunctionRegistry::new();
        let ctx = NodeContext::new(&tree, 0, &registry);
        let operand = Operand::new(Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 0)).with_attribute("id");
        assert_eq!(ctx.value_of(&operand).unwrap(), Value::text("x"));
    }

    #[test]
    fn exists_quantifies_over_children() {
        let doc = parse_html("<ul><li class=\"a\">x</li><li>y</li></ul>");
        let root = doc.nodes.iter().find(|n| n.tag == "ul").unwrap().id;
        let tree = TreeIndex::new(std::rc::Rc::new(doc));
        let registry = FunctionRegistry::new();
        let ctx = NodeContext::new(&tree, root, &registry);
        let where_clause = Expr::Compare(markql_ir::CompareExpr::new(
            markql_ir::CompareOp::Eq,
            Operand::new(Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 0)).with_attribute("class"),
            Span::new(0, 0),
        ));
        let mut where_clause = where_clause;
        if let Expr::Compare(c) = &mut where_clause {
            c.rhs = markql_ir::ValueList { values: vec!["a".to_string()], span: Span::new(0, 0) };
        }
        assert!(ctx.exists(Axis::Child, Some(&where_clause)).unwrap());
    }
}
