// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MarkQL — Parser
//!
//! Recursive-descent parser: [`markql_lexer`] tokens in, a [`markql_ir::Query`]
//! out. Every grammar-rule function takes a [`cursor::Cursor`] and returns
//! a [`error::ParseResult`]; there is no backtracking — MarkQL's grammar
//! is LL(1) except for a handful of one-token lookaheads handled inline
//! (e.g. distinguishing a bare tag from a function-call select item).
//!
//! The parser never panics on malformed input: every failure path returns
//! an [`error::ParseError`] carrying a byte offset, which the caller turns
//! into a [`markql_diagnostics::Diagnostic`] via `Diagnostic::syntax`.

mod cursor;
pub mod error;
mod expr;
mod select;
mod source;

use markql_ir::{Query, QueryKind, Source, SourceKind, Span, WithClause};
use markql_lexer::{TokenKind, lex_all};

use cursor::Cursor;
use error::{ParseError, ParseResult};
use source::CteScope;

pub use expr::{parse_expr, parse_operand, parse_scalar_expr};

/// Parses a complete MarkQL statement.
pub fn parse(source_text: &str) -> ParseResult<Query> {
    let tokens = lex_all(source_text);
    if let Some(first) = tokens.iter().find(|t| t.kind == TokenKind::Invalid) {
        return Err(ParseError::new(first.text.clone(), first.pos));
    }
    let mut cur = Cursor::new(tokens);
    let mut scope = CteScope::root();
    let query = parse_query(&mut cur, &mut scope)?;
    if !cur.at_end() {
        return Err(ParseError::new(
            format!("Unexpected token after query: '{}'", cur.peek().text),
            cur.pos(),
        ));
    }
    Ok(query)
}

fn parse_query(cur: &mut Cursor, scope: &mut CteScope) -> ParseResult<Query> {
    if cur.at(TokenKind::KeywordShow) {
        return parse_show(cur);
    }
    if cur.at(TokenKind::KeywordDescribe) {
        return parse_describe(cur);
    }
    parse_select_stmt_in_scope(cur, scope)
}

fn parse_show(cur: &mut Cursor) -> ParseResult<Query> {
    let start = cur.pos();
    cur.bump(); // SHOW
    let kind = if cur.eat(TokenKind::KeywordInputs) {
        QueryKind::ShowInputs
    } else if cur.eat(TokenKind::KeywordInput) {
        QueryKind::ShowInput
    } else if cur.eat(TokenKind::KeywordFunctions) {
        QueryKind::ShowFunctions
    } else if cur.eat(TokenKind::KeywordAxes) {
        QueryKind::ShowAxes
    } else if cur.eat(TokenKind::KeywordOperators) {
        QueryKind::ShowOperators
    } else {
        return Err(ParseError::new(
            "Expected INPUT, INPUTS, FUNCTIONS, AXES, or OPERATORS after SHOW",
            cur.pos(),
        ));
    };
    let source = Source::new(SourceKind::Document, Span::new(start, cur.pos()));
    Ok(Query::new(source, Span::new(start, cur.pos())).with_kind(kind))
}

fn parse_describe(cur: &mut Cursor) -> ParseResult<Query> {
    let start = cur.pos();
    cur.bump(); // DESCRIBE
    let kind = if cur.eat(TokenKind::KeywordDocument) {
        QueryKind::DescribeDoc
    } else if cur.kind() == TokenKind::Identifier && cur.peek().text.eq_ignore_ascii_case("language") {
        cur.bump();
        QueryKind::DescribeLanguage
    } else if cur.kind() == TokenKind::Identifier && cur.peek().text.eq_ignore_ascii_case("doc") {
        cur.bump();
        QueryKind::DescribeDoc
    } else {
        return Err(ParseError::new("Expected DOCUMENT or LANGUAGE after DESCRIBE", cur.pos()));
    };
    let source = Source::new(SourceKind::Document, Span::new(start, cur.pos()));
    Ok(Query::new(source, Span::new(start, cur.pos())).with_kind(kind))
}

/// `SelectStmt := [With] Select From [Joins] [Where] [OrderBy] [Exclude]
/// [Limit] [To]`, parsed with a live [`CteScope`] so derived/`WITH`
/// nesting can classify `FROM <ident>` as a CTE reference.
pub(crate) fn parse_select_stmt_in_scope(cur: &mut Cursor, scope: &mut CteScope) -> ParseResult<Query> {
    let start = cur.pos();
    let ctes = source::parse_with(cur, scope)?;
    let with = if ctes.is_empty() {
        None
    } else {
        Some(WithClause {
            ctes,
            span: Span::new(start, cur.pos()),
        })
    };

    cur.expect(TokenKind::KeywordSelect, "SELECT")?;
    let select_items = select::parse_select_items(cur)?;
    cur.expect(TokenKind::KeywordFrom, "FROM after the select list")?;
    let from_source = source::parse_source(cur, scope)?;
    let joins = source::parse_joins(cur, scope)?;

    let mut query = Query::new(from_source, Span::new(start, cur.pos()));
    query.with = with;
    query.select_items = select_items;
    query.joins = joins;

    if cur.eat(TokenKind::KeywordWhere) {
        query.where_clause = Some(expr::parse_expr(cur)?);
    }
    query.order_by = source::parse_order_by(cur)?;
    query.exclude_fields = source::parse_exclude(cur)?;
    query.limit = source::parse_limit(cur)?;
    source::parse_to_clause(cur, &mut query)?;
    query.span = Span::new(start, cur.pos());
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_ir::{Aggregate, CompareOp, Expr, JoinType, QueryKind, SourceKind};

    #[test]
    fn parses_minimal_select() {
        let q = parse("SELECT ul FROM document WHERE attributes.id='c'").unwrap();
        assert_eq!(q.kind, QueryKind::Select);
        assert_eq!(q.select_items.len(), 1);
        assert_eq!(q.select_items[0].tag, "ul");
        assert!(matches!(q.source.kind, SourceKind::Document));
        assert!(matches!(q.where_clause, Some(Expr::Compare(_))));
    }

    #[test]
    fn parses_count_star() {
        let q = parse("SELECT COUNT(*) FROM document").unwrap();
        assert_eq!(q.select_items[0].aggregate, Aggregate::Count);
        assert_eq!(q.select_items[0].tag, "*");
    }

    #[test]
    fn parses_text_requires_where() {
        let q = parse("SELECT TEXT(div) FROM document WHERE attributes.id='r'").unwrap();
        assert!(q.select_items[0].text_function);
        assert_eq!(q.select_items[0].tag, "div");
    }

    #[test]
    fn parses_with_join_lateral() {
        let q = parse(
            "WITH rows AS (SELECT tr FROM document WHERE tag='tr') \
             SELECT rows.tag, items.tag FROM rows \
             LEFT JOIN LATERAL (SELECT td FROM document WHERE tag='td') AS items \
             ON rows.node_id = items.parent_id",
        )
        .unwrap();
        assert!(q.with.is_some());
        assert_eq!(q.joins.len(), 1);
        assert_eq!(q.joins[0].join_type, JoinType::Left);
        assert!(q.joins[0].lateral);
        assert!(q.requires_relation_path());
    }

    #[test]
    fn cross_join_with_on_is_rejected() {
        let err = parse("SELECT * FROM document CROSS JOIN document AS d ON tag = 'a'").unwrap_err();
        assert!(err.message.to_ascii_uppercase().contains("CROSS JOIN DOES NOT ALLOW ON"));
    }

    #[test]
    fn join_without_on_is_rejected() {
        let err = parse("SELECT * FROM document JOIN document AS d").unwrap_err();
        assert!(err.message.to_ascii_uppercase().contains("JOIN REQUIRES ON"));
    }

    #[test]
    fn to_table_options_parse() {
        let q = parse("SELECT table FROM document WHERE attributes.id='p' TO TABLE(TRIM_EMPTY_COLS=ALL, HEADER=FALSE)")
            .unwrap();
        assert!(q.to_table);
        assert!(!q.table_has_header);
        assert_eq!(q.table_options.trim_empty_cols, markql_ir::TrimEmptyCols::All);
    }

    #[test]
    fn project_alias_expression_list_parses() {
        let q = parse(
            "SELECT PROJECT(div) AS (id: attributes.id, upper_id: upper(id)) FROM document WHERE tag='div'",
        )
        .unwrap();
        let item = &q.select_items[0];
        assert!(item.flatten_extract);
        assert_eq!(item.flatten_extract_aliases, vec!["id", "upper_id"]);
    }

    #[test]
    fn unterminated_comment_is_a_syntax_error_at_its_start() {
        let err = parse("SELECT /* oops").unwrap_err();
        assert_eq!(err.message, "Unterminated block comment");
    }

    #[test]
    fn in_predicate_parses_value_list() {
        let q = parse("SELECT div FROM document WHERE attributes.class IN ('newest', 'old')").unwrap();
        match q.where_clause.unwrap() {
            Expr::Compare(c) => {
                assert_eq!(c.op, CompareOp::In);
                assert_eq!(c.rhs.values, vec!["newest".to_string(), "old".to_string()]);
            }
            _ => panic!("expected compare"),
        }
    }
}
