// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Predicate and scalar expression parsing: `WHERE` clauses, `ON`
//! clauses, and the scalar sub-language shared by `SELECT` items and
//! function arguments.

use markql_ir::{
    Axis, CompareExpr, CompareOp, Expr, ExistsExpr, FieldKind, LogicalOp, Operand, ScalarExpr,
    Span, ValueList,
};
use markql_lexer::TokenKind;

use crate::cursor::Cursor;
use crate::error::ParseResult;

const FIELD_WORDS: &[(&str, FieldKind)] = &[
    ("tag", FieldKind::Tag),
    ("text", FieldKind::Text),
    ("node_id", FieldKind::NodeId),
    ("parent_id", FieldKind::ParentId),
    ("sibling_pos", FieldKind::SiblingPos),
    ("max_depth", FieldKind::MaxDepth),
    ("doc_order", FieldKind::DocOrder),
];

fn axis_for(word: &str) -> Option<Axis> {
    Some(match word {
        "self" => Axis::SelfAxis,
        "parent" => Axis::Parent,
        "child" => Axis::Child,
        "ancestor" => Axis::Ancestor,
        "descendant" => Axis::Descendant,
        _ => return None,
    })
}

fn field_for(word: &str) -> Option<FieldKind> {
    FIELD_WORDS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, kind)| *kind)
}

/// DOM functions take a tag name (or the `self` keyword) as their first
/// argument, which is not an [`Operand`] in MarkQL's grammar — it's a
/// selector, not a field accessor. These names get their arguments parsed
/// by [`parse_dom_function_args`] instead of the generic scalar-expr loop.
const DOM_TAG_FUNCTIONS: &[&str] = &["text", "direct_text", "inner_html", "raw_inner_html", "first_text", "last_text"];
const DOM_ATTR_FUNCTIONS: &[&str] = &["attr", "first_attr", "last_attr"];

/// `tag_or_self [',' attribute_name] [',' depth]`. The scoped `WHERE`
/// form of `first_text`/`last_text`/`first_attr`/`last_attr` is not
/// accepted here (there is no way to embed a predicate in a scalar
/// expression); those functions still parse and evaluate unscoped, over
/// every matching-tag descendant.
fn parse_dom_function_args(cur: &mut Cursor, name: &str) -> ParseResult<Vec<ScalarExpr>> {
    let mut args = Vec::new();
    let tag_start = cur.pos();
    if cur.eat(TokenKind::KeywordSelf) {
        args.push(ScalarExpr::self_ref(Span::new(tag_start, cur.pos())));
    } else {
        let tag = cur.expect_identifier("a tag name or 'self'")?;
        args.push(ScalarExpr::string(tag.text, Span::new(tag_start, cur.pos())));
    }

    if DOM_ATTR_FUNCTIONS.contains(&name) {
        cur.expect(TokenKind::Comma, "',' before the attribute name")?;
        let attr_start = cur.pos();
        let attr = if cur.at(TokenKind::String) {
            cur.bump()
        } else {
            cur.expect_identifier("an attribute name")?
        };
        args.push(ScalarExpr::string(attr.text, Span::new(attr_start, cur.pos())));
    } else if (name == "inner_html" || name == "raw_inner_html") && cur.eat(TokenKind::Comma) {
        let depth_start = cur.pos();
        if cur.at(TokenKind::Number) {
            let tok = cur.bump();
            let value: i64 = tok.text.parse().unwrap_or(0);
            args.push(ScalarExpr::number(value, Span::new(depth_start, cur.pos())));
        } else {
            let ident = cur.expect_identifier("a depth number or MAX_DEPTH")?;
            args.push(ScalarExpr::string(ident.text, Span::new(depth_start, cur.pos())));
        }
    }
    Ok(args)
}

/// `[axis '.'] [qualifier '.'] field ['.' attribute]`
pub fn parse_operand(cur: &mut Cursor) -> ParseResult<Operand> {
    let start = cur.pos();
    let first = cur.expect_identifier("a field accessor (e.g. attributes.id, tag, parent.text)")?;
    let mut lower = first.text.to_ascii_lowercase();
    let mut axis = Axis::SelfAxis;

    if let Some(a) = axis_for(&lower) {
        if cur.at(TokenKind::Dot) {
            axis = a;
            cur.bump();
            let next = cur.expect_identifier("a field name after the axis")?;
            lower = next.text.to_ascii_lowercase();
        }
    }

    if lower == "attributes" {
        let mut operand = Operand::new(axis, FieldKind::AttributesMap, Span::new(start, cur.pos()));
        if cur.at(TokenKind::Dot) {
            cur.bump();
            let attr = cur.expect_identifier("an attribute name after 'attributes.'")?;
            operand.field_kind = FieldKind::Attribute;
            operand.attribute = attr.text;
        }
        operand.span = Span::new(start, cur.pos());
        return Ok(operand);
    }

    if let Some(field_kind) = field_for(&lower) {
        return Ok(Operand::new(axis, field_kind, Span::new(start, cur.pos())));
    }

    // Not a recognized field word: treat it as a qualifier (join/source
    // alias) and require a second segment that IS a recognized field.
    let qualifier = lower;
    cur.expect(TokenKind::Dot, "'.' after the source alias")?;
    let second = cur.expect_identifier("a field name after the alias qualifier")?;
    let lower2 = second.text.to_ascii_lowercase();

    if lower2 == "attributes" {
        let mut operand = Operand::new(axis, FieldKind::AttributesMap, Span::new(start, cur.pos()))
            .with_qualifier(qualifier);
        if cur.at(TokenKind::Dot) {
            cur.bump();
            let attr = cur.expect_identifier("an attribute name after 'attributes.'")?;
            operand.field_kind = FieldKind::Attribute;
            operand.attribute = attr.text;
        }
        operand.span = Span::new(start, cur.pos());
        return Ok(operand);
    }

    if let Some(field_kind) = field_for(&lower2) {
        return Ok(Operand::new(axis, field_kind, Span::new(start, cur.pos())).with_qualifier(qualifier));
    }

    // Not a core field word either: a projected/computed column name, as a
    // CTE's own SELECT list introduces (`cells.val`, `rows.row_id`). The
    // validator only checks that `qualifier` is a bound alias, never the
    // field name, so this is accepted the same way `attributes.*` is.
    Ok(Operand::new(axis, FieldKind::Attribute, Span::new(start, cur.pos()))
        .with_attribute(second.text)
        .with_qualifier(qualifier))
}

/// A scalar value: an operand accessor, `self`, a literal, or a function
/// call (`concat(...)`, `lower(...)`, `attr(tag, name)`, ...).
pub fn parse_scalar_expr(cur: &mut Cursor) -> ParseResult<ScalarExpr> {
    let start = cur.pos();
    match cur.kind() {
        TokenKind::KeywordSelf => {
            cur.bump();
            Ok(ScalarExpr::self_ref(Span::new(start, cur.pos())))
        }
        TokenKind::String => {
            let tok = cur.bump();
            Ok(ScalarExpr::string(tok.text, Span::new(start, cur.pos())))
        }
        TokenKind::Number => {
            let tok = cur.bump();
            let value: i64 = tok.text.parse().unwrap_or(0);
            Ok(ScalarExpr::number(value, Span::new(start, cur.pos())))
        }
        TokenKind::KeywordNull => {
            cur.bump();
            Ok(ScalarExpr::null(Span::new(start, cur.pos())))
        }
        TokenKind::Identifier if cur.peek_at(1).kind == TokenKind::LParen => {
            let name = cur.bump().text;
            cur.bump(); // LParen
            let lower_name = name.to_ascii_lowercase();
            let args = if DOM_TAG_FUNCTIONS.contains(&lower_name.as_str()) || DOM_ATTR_FUNCTIONS.contains(&lower_name.as_str())
            {
                parse_dom_function_args(cur, &lower_name)?
            } else {
                let mut args = Vec::new();
                if !cur.at(TokenKind::RParen) {
                    loop {
                        args.push(parse_scalar_expr(cur)?);
                        if cur.eat(TokenKind::Comma) {
                            continue;
                        }
                        break;
                    }
                }
                args
            };
            cur.expect_rparen(&format!("{name}(...)"))?;
            Ok(ScalarExpr::function(name, args, Span::new(start, cur.pos())))
        }
        _ => {
            let operand = parse_operand(cur)?;
            Ok(ScalarExpr::operand(operand, Span::new(start, cur.pos())))
        }
    }
}

fn parse_value_text(cur: &mut Cursor) -> ParseResult<String> {
    match cur.kind() {
        TokenKind::String => Ok(cur.bump().text),
        TokenKind::Number => Ok(cur.bump().text),
        _ => Err(crate::error::ParseError::new(
            format!("Expected a string or number literal, found '{}'", cur.peek().text),
            cur.pos(),
        )),
    }
}

fn parse_value_list(cur: &mut Cursor) -> ParseResult<ValueList> {
    let start = cur.pos();
    cur.expect_lparen("the value list")?;
    let mut values = Vec::new();
    if !cur.at(TokenKind::RParen) {
        loop {
            values.push(parse_value_text(cur)?);
            if cur.eat(TokenKind::Comma) {
                continue;
            }
            break;
        }
    }
    cur.expect_rparen("the value list")?;
    Ok(ValueList {
        values,
        span: Span::new(start, cur.pos()),
    })
}

/// `Compare := ScalarExpr (CmpOp Value | IN ValueList | LIKE Value |
/// CONTAINS[ALL|ANY] Value | IS [NOT] NULL | HAS_DIRECT_TEXT Value | '~'
/// Value)`
fn parse_compare(cur: &mut Cursor) -> ParseResult<Expr> {
    let start = cur.pos();
    let lhs_scalar = parse_scalar_expr(cur)?;
    let lhs_operand = match &lhs_scalar.kind {
        markql_ir::ScalarExprKind::Operand(op) => Some(op.clone()),
        _ => None,
    };

    let op = match cur.kind() {
        TokenKind::Equal => CompareOp::Eq,
        TokenKind::NotEqual => CompareOp::NotEq,
        TokenKind::Less => CompareOp::Lt,
        TokenKind::LessEqual => CompareOp::Lte,
        TokenKind::Greater => CompareOp::Gt,
        TokenKind::GreaterEqual => CompareOp::Gte,
        TokenKind::KeywordIn => CompareOp::In,
        TokenKind::KeywordLike => CompareOp::Like,
        TokenKind::KeywordContains => CompareOp::Contains,
        TokenKind::KeywordHasDirectText => CompareOp::HasDirectText,
        TokenKind::RegexMatch => CompareOp::Regex,
        TokenKind::KeywordIs => CompareOp::IsNull,
        _ => {
            return Err(crate::error::ParseError::new(
                format!("Expected a comparison operator, found '{}'", cur.peek().text),
                cur.pos(),
            ));
        }
    };
    cur.bump();

    let mut compare = CompareExpr::new(
        op,
        lhs_operand.unwrap_or_else(|| Operand::new(Axis::SelfAxis, FieldKind::Tag, lhs_scalar.span)),
        Span::new(start, cur.pos()),
    );
    if lhs_operand_is_none(&lhs_scalar) {
        compare.lhs_expr = Some(Box::new(lhs_scalar));
    }

    match op {
        CompareOp::In => {
            compare.rhs = parse_value_list(cur)?;
        }
        CompareOp::Contains => {
            if cur.at(TokenKind::KeywordAll) {
                cur.bump();
                compare.op = CompareOp::ContainsAll;
            } else if cur.at(TokenKind::KeywordAny) {
                cur.bump();
                compare.op = CompareOp::ContainsAny;
            }
            let value = parse_value_text(cur)?;
            compare.rhs = ValueList {
                values: vec![value],
                span: Span::new(start, cur.pos()),
            };
        }
        CompareOp::IsNull => {
            if cur.eat(TokenKind::KeywordNot) {
                compare.op = CompareOp::IsNotNull;
            }
            cur.expect(TokenKind::KeywordNull, "NULL after IS [NOT]")?;
        }
        CompareOp::Like | CompareOp::HasDirectText | CompareOp::Regex => {
            let value = parse_value_text(cur)?;
            compare.rhs = ValueList {
                values: vec![value],
                span: Span::new(start, cur.pos()),
            };
        }
        _ => {
            // Eq/NotEq/Lt/Lte/Gt/Gte: the RHS is a literal in the common
            // case (`tag = 'div'`) but a JOIN/WHERE condition comparing two
            // row fields (`rows.node_id = items.parent_id`) needs a scalar
            // expression RHS instead; `rhs_expr` exists on `CompareExpr`
            // for exactly this.
            if matches!(cur.kind(), TokenKind::String | TokenKind::Number) {
                let value = parse_value_text(cur)?;
                compare.rhs = ValueList {
                    values: vec![value],
                    span: Span::new(start, cur.pos()),
                };
            } else {
                let rhs_scalar = parse_scalar_expr(cur)?;
                compare.rhs_expr = Some(Box::new(rhs_scalar));
            }
        }
    }

    compare.span = Span::new(start, cur.pos());
    Ok(Expr::Compare(compare))
}

fn lhs_operand_is_none(scalar: &ScalarExpr) -> bool {
    !matches!(scalar.kind, markql_ir::ScalarExprKind::Operand(_))
}

/// `NotExpr := Compare | 'EXISTS' '(' Axis ['WHERE' Expr] ')' | '(' Expr ')'`
fn parse_not_expr(cur: &mut Cursor) -> ParseResult<Expr> {
    let start = cur.pos();
    if cur.eat(TokenKind::KeywordExists) {
        cur.expect_lparen("EXISTS")?;
        let axis_tok = cur.expect_identifier("an axis name (child, parent, ancestor, descendant, self)")?;
        let axis = axis_for(&axis_tok.text.to_ascii_lowercase()).ok_or_else(|| {
            crate::error::ParseError::new(
                format!("Unknown axis '{}' in EXISTS(...)", axis_tok.text),
                axis_tok.pos,
            )
        })?;
        let where_clause = if cur.eat(TokenKind::KeywordWhere) {
            Some(parse_expr(cur)?)
        } else {
            None
        };
        cur.expect_rparen("EXISTS(...)")?;
        return Ok(Expr::Exists(Box::new(ExistsExpr {
            axis,
            where_clause,
            span: Span::new(start, cur.pos()),
        })));
    }
    if cur.at(TokenKind::LParen) {
        cur.bump();
        let inner = parse_expr(cur)?;
        cur.expect_rparen("the parenthesized expression")?;
        return Ok(inner);
    }
    parse_compare(cur)
}

fn parse_and_expr(cur: &mut Cursor) -> ParseResult<Expr> {
    let start = cur.pos();
    let mut left = parse_not_expr(cur)?;
    while cur.eat(TokenKind::KeywordAnd) {
        let right = parse_not_expr(cur)?;
        left = Expr::and(left, right, Span::new(start, cur.pos()));
    }
    Ok(left)
}

/// `Expr := OrExpr := AndExpr ('OR' AndExpr)*`
pub fn parse_expr(cur: &mut Cursor) -> ParseResult<Expr> {
    let start = cur.pos();
    let mut left = parse_and_expr(cur)?;
    while cur.eat(TokenKind::KeywordOr) {
        let right = parse_and_expr(cur)?;
        left = Expr::or(left, right, Span::new(start, cur.pos()));
    }
    Ok(left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_lexer::lex_all;

    fn parse_where(src: &str) -> Expr {
        let tokens = lex_all(src);
        let mut cur = Cursor::new(tokens);
        parse_expr(&mut cur).expect("expression should parse")
    }

    #[test]
    fn parses_attribute_equality() {
        let expr = parse_where("attributes.id = 'c'");
        match expr {
            Expr::Compare(c) => {
                assert_eq!(c.op, CompareOp::Eq);
                assert_eq!(c.lhs.field_kind, FieldKind::Attribute);
                assert_eq!(c.lhs.attribute, "id");
                assert_eq!(c.rhs.values, vec!["c".to_string()]);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn parses_and_or_precedence() {
        let expr = parse_where("tag = 'a' OR tag = 'b' AND attributes.id = 'c'");
        // OR is outermost: AND binds tighter.
        match expr {
            Expr::Binary(b) => assert_eq!(b.op, LogicalOp::Or),
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn parses_exists_with_axis_and_where() {
        let expr = parse_where("EXISTS(child WHERE tag = 'li')");
        match expr {
            Expr::Exists(e) => {
                assert_eq!(e.axis, Axis::Child);
                assert!(e.where_clause.is_some());
            }
            _ => panic!("expected exists"),
        }
    }

    #[test]
    fn parses_qualified_operand() {
        let expr = parse_where("rows.tag = 'tr'");
        match expr {
            Expr::Compare(c) => {
                assert_eq!(c.lhs.qualifier.as_deref(), Some("rows"));
                assert_eq!(c.lhs.field_kind, FieldKind::Tag);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn parses_dom_function_call_with_tag_argument() {
        let expr = parse_where("text(div) = 'hi'");
        match expr {
            Expr::Compare(c) => match c.lhs_expr.as_deref().map(|e| &e.kind) {
                Some(markql_ir::ScalarExprKind::FunctionCall { name, args }) => {
                    assert_eq!(name, "text");
                    assert_eq!(args.len(), 1);
                    assert!(matches!(args[0].kind, markql_ir::ScalarExprKind::StringLiteral(ref t) if t == "div"));
                }
                other => panic!("expected function call lhs, got {other:?}"),
            },
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn parses_attr_function_with_self_and_attribute_name() {
        let expr = parse_where("attr(self, 'id') = 'c'");
        match expr {
            Expr::Compare(c) => match c.lhs_expr.as_deref().map(|e| &e.kind) {
                Some(markql_ir::ScalarExprKind::FunctionCall { name, args }) => {
                    assert_eq!(name, "attr");
                    assert!(matches!(args[0].kind, markql_ir::ScalarExprKind::SelfRef(_)));
                    assert!(matches!(args[1].kind, markql_ir::ScalarExprKind::StringLiteral(ref a) if a == "id"));
                }
                other => panic!("expected function call lhs, got {other:?}"),
            },
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn parses_operand_valued_rhs_for_join_conditions() {
        let expr = parse_where("rows.node_id = items.parent_id");
        match expr {
            Expr::Compare(c) => {
                assert_eq!(c.lhs.qualifier.as_deref(), Some("rows"));
                assert!(c.rhs.values.is_empty());
                match c.rhs_expr.as_deref().map(|e| &e.kind) {
                    Some(markql_ir::ScalarExprKind::Operand(op)) => {
                        assert_eq!(op.qualifier.as_deref(), Some("items"));
                        assert_eq!(op.field_kind, FieldKind::ParentId);
                    }
                    other => panic!("expected operand rhs_expr, got {other:?}"),
                }
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn parses_is_not_null_on_attributes_map() {
        let expr = parse_where("attributes IS NOT NULL");
        match expr {
            Expr::Compare(c) => assert_eq!(c.op, CompareOp::IsNotNull),
            _ => panic!("expected compare"),
        }
    }
}
