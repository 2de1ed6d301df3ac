// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Expressions
//!
//! MarkQL predicates and projected scalars share one expression tree.
//!
//! ## Shape
//!
//! A boolean [`Expr`] is either a single [`CompareExpr`] (the leaf
//! predicate form: `operand op value`), an `EXISTS` probe over an axis, or
//! a binary `AND`/`OR` combination of two `Expr`s. There is no `NOT` node —
//! negation is folded into the comparison operator (`NotEq`, `IsNotNull`,
//! …) by the parser.
//!
//! A scalar value — the thing compared, projected, or passed as a function
//! argument — is a [`ScalarExpr`]: an [`Operand`] (a DOM accessor), the
//! literal `self` keyword, a literal, or a function call.
//!
//! ```text
//! WHERE attributes.id = 'c' AND EXISTS(child WHERE tag = 'li')
//!   => Binary(And,
//!        Compare(Eq, Operand(Attribute, "id"), ["c"]),
//!        Exists(Child, Some(Compare(Eq, Operand(Tag), ["li"]))))
//! ```

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Directional relation used to select nodes relative to a context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// The context node itself.
    SelfAxis,
    /// The single parent node, if any.
    Parent,
    /// Direct children, in document order.
    Child,
    /// The upward chain of ancestors, nearest first.
    Ancestor,
    /// The full subtree below the node, preorder.
    Descendant,
}

/// Which scalar facet of a node an [`Operand`] denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// A single named attribute value (`attribute` holds the name).
    Attribute,
    /// The whole attribute map; only `IS [NOT] NULL` is legal against it.
    AttributesMap,
    Tag,
    Text,
    NodeId,
    ParentId,
    SiblingPos,
    MaxDepth,
    DocOrder,
}

/// A single scalar accessor: `axis.field_kind[.attribute]`, optionally
/// qualified by a source/join alias (`alias.attributes.id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operand {
    pub axis: Axis,
    pub field_kind: FieldKind,
    /// Attribute name; only meaningful when `field_kind == Attribute`.
    pub attribute: String,
    /// Alias qualifier, e.g. `u` in `u.attributes.id`.
    pub qualifier: Option<String>,
    pub span: Span,
}

impl Operand {
    pub fn new(axis: Axis, field_kind: FieldKind, span: Span) -> Self {
        Self {
            axis,
            field_kind,
            attribute: String::new(),
            qualifier: None,
            span,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = name.into();
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

/// The bare `self` keyword, used as a whole-node scalar (e.g. in
/// `PROJECT` bindings that want the raw node rather than one field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRef {
    pub span: Span,
}

/// A scalar value: an accessor, a literal, or a function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarExprKind {
    Operand(Operand),
    SelfRef(SelfRef),
    StringLiteral(String),
    NumberLiteral(i64),
    NullLiteral,
    FunctionCall { name: String, args: Vec<ScalarExpr> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarExpr {
    pub kind: ScalarExprKind,
    pub span: Span,
}

impl ScalarExpr {
    pub fn operand(operand: Operand, span: Span) -> Self {
        Self {
            kind: ScalarExprKind::Operand(operand),
            span,
        }
    }

    pub fn self_ref(span: Span) -> Self {
        Self {
            kind: ScalarExprKind::SelfRef(SelfRef { span }),
            span,
        }
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ScalarExprKind::StringLiteral(value.into()),
            span,
        }
    }

    pub fn number(value: i64, span: Span) -> Self {
        Self {
            kind: ScalarExprKind::NumberLiteral(value),
            span,
        }
    }

    pub fn null(span: Span) -> Self {
        Self {
            kind: ScalarExprKind::NullLiteral,
            span,
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<ScalarExpr>, span: Span) -> Self {
        Self {
            kind: ScalarExprKind::FunctionCall {
                name: name.into(),
                args,
            },
            span,
        }
    }
}

/// A literal `IN (...)` / multi-value comparison list, kept as raw text —
/// numeric-vs-string coercion happens at evaluation time, not parse time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueList {
    pub values: Vec<String>,
    pub span: Span,
}

/// Comparison operator for a [`CompareExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    In,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    IsNull,
    IsNotNull,
    Regex,
    Like,
    Contains,
    ContainsAll,
    ContainsAny,
    HasDirectText,
}

/// A single leaf predicate: `lhs op rhs`.
///
/// `lhs` is always an [`Operand`] for the common case (`attributes.id =
/// 'c'`); `lhs_expr` is populated instead when the left side is a function
/// call or literal expression rather than a bare accessor. `rhs` holds the
/// literal value list for `Eq`/`In`/etc.; `rhs_expr`/`rhs_expr_list` hold
/// richer right-hand sides (used by function-valued comparisons).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareExpr {
    pub op: CompareOp,
    pub lhs: Operand,
    pub rhs: ValueList,
    pub lhs_expr: Option<Box<ScalarExpr>>,
    pub rhs_expr: Option<Box<ScalarExpr>>,
    pub rhs_expr_list: Vec<ScalarExpr>,
    pub span: Span,
}

impl CompareExpr {
    pub fn new(op: CompareOp, lhs: Operand, span: Span) -> Self {
        Self {
            op,
            lhs,
            rhs: ValueList::default(),
            lhs_expr: None,
            rhs_expr: None,
            rhs_expr_list: Vec::new(),
            span,
        }
    }

    pub fn with_rhs(mut self, rhs: ValueList) -> Self {
        self.rhs = rhs;
        self
    }

    pub fn with_rhs_expr(mut self, expr: ScalarExpr) -> Self {
        self.rhs_expr = Some(Box::new(expr));
        self
    }
}

/// `EXISTS(axis [WHERE expr])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistsExpr {
    pub axis: Axis,
    pub where_clause: Option<Expr>,
    pub span: Span,
}

/// Boolean combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: LogicalOp,
    pub left: Expr,
    pub right: Expr,
    pub span: Span,
}

/// A boolean expression tree: a leaf comparison, an `EXISTS` probe, or a
/// binary combination of two sub-expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Compare(CompareExpr),
    Exists(Box<ExistsExpr>),
    Binary(Box<BinaryExpr>),
}

impl Expr {
    pub fn and(left: Expr, right: Expr, span: Span) -> Self {
        Expr::Binary(Box::new(BinaryExpr {
            op: LogicalOp::And,
            left,
            right,
            span,
        }))
    }

    pub fn or(left: Expr, right: Expr, span: Span) -> Self {
        Expr::Binary(Box::new(BinaryExpr {
            op: LogicalOp::Or,
            left,
            right,
            span,
        }))
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Compare(c) => c.span,
            Expr::Exists(e) => e.span,
            Expr::Binary(b) => b.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_builder_sets_attribute_and_qualifier() {
        let op = Operand::new(Axis::SelfAxis, FieldKind::Attribute, Span::new(0, 4))
            .with_attribute("id")
            .with_qualifier("u");
        assert_eq!(op.attribute, "id");
        assert_eq!(op.qualifier.as_deref(), Some("u"));
    }

    #[test]
    fn and_or_wrap_binary_expr() {
        let lhs = Expr::Compare(CompareExpr::new(
            CompareOp::Eq,
            Operand::new(Axis::SelfAxis, FieldKind::Tag, Span::new(0, 1)),
            Span::new(0, 1),
        ));
        let rhs = lhs.clone();
        let combined = Expr::and(lhs, rhs, Span::new(0, 2));
        assert!(matches!(combined, Expr::Binary(b) if b.op == LogicalOp::And));
    }
}
