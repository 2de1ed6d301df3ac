// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `SELECT` item parsing: tag projections, aggregates (`COUNT`,
//! `SUMMARIZE`, `TFIDF`), the DOM wrapper functions (`TEXT`,
//! `INNER_HTML`, ...), `FLATTEN_TEXT`, and `PROJECT`/`FLATTEN_EXTRACT`
//! alias-expression lists.

use markql_ir::{Aggregate, FlattenExtractExpr, FlattenExtractKind, SelectItem, Span, TfidfStopwords};
use markql_lexer::TokenKind;

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::expr::{parse_expr, parse_operand, parse_scalar_expr};

/// Identifier-shaped function names that are not lexer keywords but
/// still dispatch to a dedicated `SelectItem` shape rather than a plain
/// scalar expression.
fn dom_wrapper(name: &str) -> Option<&'static str> {
    match name {
        "TEXT" => Some("TEXT"),
        "DIRECT_TEXT" => Some("DIRECT_TEXT"),
        "INNER_HTML" => Some("INNER_HTML"),
        "RAW_INNER_HTML" => Some("RAW_INNER_HTML"),
        _ => None,
    }
}

pub fn parse_select_items(cur: &mut Cursor) -> ParseResult<Vec<SelectItem>> {
    let mut items = Vec::new();
    loop {
        items.push(parse_select_item(cur)?);
        if cur.eat(TokenKind::Comma) {
            continue;
        }
        break;
    }
    Ok(items)
}

fn maybe_alias(cur: &mut Cursor) -> ParseResult<Option<String>> {
    if cur.eat(TokenKind::KeywordAs) {
        Ok(Some(cur.expect_identifier("an alias name after AS")?.text))
    } else {
        Ok(None)
    }
}

fn parse_select_item(cur: &mut Cursor) -> ParseResult<SelectItem> {
    let start = cur.pos();

    if cur.eat(TokenKind::Star) {
        return Ok(SelectItem::tag_only("*", Span::new(start, cur.pos())));
    }

    if cur.at(TokenKind::KeywordCount) {
        cur.bump();
        cur.expect_lparen("COUNT")?;
        let tag = if cur.eat(TokenKind::Star) {
            "*".to_string()
        } else {
            cur.expect_identifier("a tag name or '*' inside COUNT(...)")?.text
        };
        cur.expect_rparen("COUNT(...)")?;
        let mut item = SelectItem::tag_only(tag, Span::new(start, cur.pos()));
        item.aggregate = Aggregate::Count;
        item.alias = maybe_alias(cur)?;
        return Ok(item);
    }

    if cur.at(TokenKind::KeywordProject) || matches!(cur.peek().text.to_ascii_uppercase().as_str(), "FLATTEN_EXTRACT")
    {
        return parse_project_item(cur, start);
    }

    if cur.kind() == TokenKind::Identifier || cur.kind() == TokenKind::KeywordTable {
        let upper = cur.peek().text.to_ascii_uppercase();
        if upper == "TRIM" && cur.peek_at(1).kind == TokenKind::LParen {
            cur.bump();
            cur.bump();
            let mut item = parse_select_item(cur)?;
            item.trim = true;
            cur.expect_rparen("TRIM(...)")?;
            item.alias = maybe_alias(cur)?.or(item.alias);
            item.span = Span::new(start, cur.pos());
            return Ok(item);
        }
        if upper == "FLATTEN_TEXT" && cur.peek_at(1).kind == TokenKind::LParen {
            cur.bump();
            cur.bump();
            let tag = cur.expect_identifier("a tag name inside FLATTEN_TEXT(...)")?.text;
            let depth = if cur.eat(TokenKind::Comma) {
                Some(cur.expect_number("a depth after the comma in FLATTEN_TEXT(...)")?.text.parse().unwrap_or(0))
            } else {
                None
            };
            cur.expect_rparen("FLATTEN_TEXT(...)")?;
            let mut item = SelectItem::tag_only(tag, Span::new(start, cur.pos()));
            item.flatten_text = true;
            item.flatten_depth = depth;
            item.alias = maybe_alias(cur)?;
            if let Some(alias) = &item.alias {
                item.flatten_aliases = vec![alias.clone()];
            }
            return Ok(item);
        }
        if upper == "SUMMARIZE" && cur.peek_at(1).kind == TokenKind::LParen {
            cur.bump();
            cur.bump();
            cur.expect(TokenKind::Star, "'*' inside SUMMARIZE(...)")?;
            cur.expect_rparen("SUMMARIZE(...)")?;
            let mut item = SelectItem::tag_only("*", Span::new(start, cur.pos()));
            item.aggregate = Aggregate::Summarize;
            item.alias = maybe_alias(cur)?;
            return Ok(item);
        }
        if upper == "TFIDF" && cur.peek_at(1).kind == TokenKind::LParen {
            return parse_tfidf_item(cur, start);
        }
        if let Some(wrapper) = dom_wrapper(&upper) {
            if cur.peek_at(1).kind == TokenKind::LParen {
                return parse_dom_wrapper_item(cur, start, wrapper);
            }
        }
        // Qualified accessor (`d.tag`, `r.row_id`, `cells.val`) — an alias
        // or axis qualifier followed by a field name, not a tag filter.
        // Parsed as a scalar operand rather than the bare-tag form below so
        // relation-path projection (`project_row`) can evaluate it; a plain
        // tag has no `.` after it.
        if cur.peek_at(1).kind == TokenKind::Dot {
            let operand = parse_operand(cur)?;
            let span = operand.span;
            let mut item = SelectItem::tag_only(String::new(), Span::new(start, cur.pos()));
            item.expr_projection = true;
            item.expr = Some(markql_ir::ScalarExpr::operand(operand, span));
            item.alias = maybe_alias(cur)?;
            item.span = Span::new(start, cur.pos());
            return Ok(item);
        }

        // Bare tag (not followed by '(') — the common `SELECT div FROM ...` form.
        if cur.peek_at(1).kind != TokenKind::LParen {
            let tag = cur.bump().text;
            let mut item = SelectItem::tag_only(tag, Span::new(start, cur.pos()));
            item.alias = maybe_alias(cur)?;
            return Ok(item);
        }
    }

    // Fall through: a general scalar expression projection, e.g.
    // `concat(attributes.id, '-', tag) AS label`.
    let expr = parse_scalar_expr(cur)?;
    let mut item = SelectItem::tag_only(String::new(), Span::new(start, cur.pos()));
    item.expr_projection = true;
    item.expr = Some(expr);
    item.alias = maybe_alias(cur)?;
    item.span = Span::new(start, cur.pos());
    Ok(item)
}

fn parse_dom_wrapper_item(cur: &mut Cursor, start: usize, wrapper: &'static str) -> ParseResult<SelectItem> {
    cur.bump(); // identifier
    cur.bump(); // LParen
    let tag = if cur.eat(TokenKind::KeywordSelf) {
        "self".to_string()
    } else {
        cur.expect_identifier("a tag name or 'self'")?.text
    };
    let mut depth = None;
    let mut auto_depth = false;
    if wrapper == "INNER_HTML" || wrapper == "RAW_INNER_HTML" {
        if cur.eat(TokenKind::Comma) {
            if cur.at(TokenKind::Number) {
                depth = Some(cur.bump().text.parse().unwrap_or(0));
            } else {
                cur.expect_identifier("a depth or MAX_DEPTH")?;
                auto_depth = true;
            }
        }
    }
    cur.expect_rparen(&format!("{wrapper}(...)"))?;
    let mut item = SelectItem::tag_only(tag, Span::new(start, cur.pos()));
    match wrapper {
        "TEXT" => item.text_function = true,
        "DIRECT_TEXT" => item.direct_text_function = true,
        "INNER_HTML" => item.inner_html_function = true,
        "RAW_INNER_HTML" => item.raw_inner_html_function = true,
        _ => unreachable!(),
    }
    item.inner_html_depth = depth;
    item.inner_html_auto_depth = auto_depth;
    item.alias = maybe_alias(cur)?;
    Ok(item)
}

fn parse_tfidf_item(cur: &mut Cursor, start: usize) -> ParseResult<SelectItem> {
    cur.bump(); // identifier TFIDF
    cur.bump(); // LParen
    let mut item = SelectItem::tag_only(String::new(), Span::new(start, cur.pos()));
    item.aggregate = Aggregate::Tfidf;
    if !cur.at(TokenKind::RParen) {
        loop {
            if cur.at(TokenKind::KeywordAll) {
                cur.bump();
                item.tfidf_all_tags = true;
            } else {
                let ident = cur.expect_identifier("a tag name or a TFIDF option (TOP_TERMS=, MIN_DF=, MAX_DF=, STOPWORDS=)")?;
                if cur.at(TokenKind::Equal) {
                    cur.bump();
                    let upper = ident.text.to_ascii_uppercase();
                    match upper.as_str() {
                        "TOP_TERMS" => item.tfidf_top_terms = cur.expect_number("a number for TOP_TERMS")?.text.parse().unwrap_or(30),
                        "MIN_DF" => item.tfidf_min_df = cur.expect_number("a number for MIN_DF")?.text.parse().unwrap_or(1),
                        "MAX_DF" => item.tfidf_max_df = cur.expect_number("a number for MAX_DF")?.text.parse().unwrap_or(0),
                        "STOPWORDS" => {
                            let value = cur.expect_identifier("NONE or ENGLISH for STOPWORDS")?.text.to_ascii_uppercase();
                            item.tfidf_stopwords = if value == "NONE" {
                                TfidfStopwords::None
                            } else {
                                TfidfStopwords::English
                            };
                        }
                        other => {
                            return Err(ParseError::new(format!("Unknown TFIDF option '{other}'"), ident.pos));
                        }
                    }
                } else {
                    item.tfidf_tags.push(ident.text);
                }
            }
            if cur.eat(TokenKind::Comma) {
                continue;
            }
            break;
        }
    }
    cur.expect_rparen("TFIDF(...)")?;
    item.alias = maybe_alias(cur)?;
    Ok(item)
}

fn parse_project_item(cur: &mut Cursor, start: usize) -> ParseResult<SelectItem> {
    cur.bump(); // PROJECT | FLATTEN_EXTRACT
    cur.expect_lparen("PROJECT/FLATTEN_EXTRACT")?;
    let tag = cur.expect_identifier("a tag name inside PROJECT(...)")?.text;
    cur.expect_rparen("PROJECT(tag)")?;
    cur.expect(TokenKind::KeywordAs, "AS after PROJECT(tag)")?;
    cur.expect_lparen("the PROJECT alias list")?;

    let mut item = SelectItem::tag_only(tag, Span::new(start, cur.pos()));
    item.flatten_extract = true;
    let mut seen_aliases = Vec::new();
    loop {
        let alias = cur.expect_identifier("an alias name")?.text;
        cur.expect(TokenKind::Colon, "':' between the alias and its expression")?;
        let expr = parse_flatten_extract_expr(cur, &seen_aliases)?;
        seen_aliases.push(alias.clone());
        item.flatten_extract_aliases.push(alias);
        item.flatten_extract_exprs.push(expr);
        if cur.eat(TokenKind::Comma) {
            continue;
        }
        break;
    }
    cur.expect_rparen("the PROJECT alias list")?;
    Ok(item)
}

/// One `alias: expr` binding inside `PROJECT(...)`/`FLATTEN_EXTRACT(...)`.
fn parse_flatten_extract_expr(cur: &mut Cursor, seen_aliases: &[String]) -> ParseResult<FlattenExtractExpr> {
    let start = cur.pos();

    if cur.eat(TokenKind::KeywordCase) {
        let mut expr = FlattenExtractExpr::new(FlattenExtractKind::CaseWhen, Span::new(start, cur.pos()));
        while cur.eat(TokenKind::KeywordWhen) {
            let cond = parse_expr(cur)?;
            cur.expect(TokenKind::KeywordThen, "THEN after the WHEN condition")?;
            let value = parse_flatten_extract_expr(cur, seen_aliases)?;
            expr.case_when_conditions.push(cond);
            expr.case_when_values.push(value);
        }
        if cur.eat(TokenKind::KeywordElse) {
            expr.case_else = Some(Box::new(parse_flatten_extract_expr(cur, seen_aliases)?));
        }
        cur.expect(TokenKind::KeywordEnd, "END to close CASE")?;
        expr.span = Span::new(start, cur.pos());
        return Ok(expr);
    }

    if cur.kind() == TokenKind::String {
        let tok = cur.bump();
        let mut expr = FlattenExtractExpr::new(FlattenExtractKind::StringLiteral, Span::new(start, cur.pos()));
        expr.string_value = tok.text;
        return Ok(expr);
    }
    if cur.kind() == TokenKind::Number {
        let tok = cur.bump();
        let mut expr = FlattenExtractExpr::new(FlattenExtractKind::NumberLiteral, Span::new(start, cur.pos()));
        expr.number_value = tok.text.parse().unwrap_or(0);
        return Ok(expr);
    }
    if cur.eat(TokenKind::KeywordNull) {
        return Ok(FlattenExtractExpr::new(FlattenExtractKind::NullLiteral, Span::new(start, cur.pos())));
    }

    if cur.kind() == TokenKind::Identifier && cur.peek_at(1).kind == TokenKind::LParen {
        let name = cur.peek().text.to_ascii_uppercase();
        if name == "TEXT" {
            cur.bump();
            cur.bump();
            let tag = cur.expect_identifier("a tag name inside TEXT(...)")?.text;
            cur.expect_rparen("TEXT(...)")?;
            let mut expr = FlattenExtractExpr::new(FlattenExtractKind::Text, Span::new(start, cur.pos()));
            expr.tag = tag;
            return Ok(expr);
        }
        if name == "ATTR" {
            cur.bump();
            cur.bump();
            let tag = cur.expect_identifier("a tag name inside ATTR(...)")?.text;
            cur.expect(TokenKind::Comma, "',' between tag and attribute name in ATTR(...)")?;
            let attr = cur.expect_identifier("an attribute name inside ATTR(...)")?.text;
            cur.expect_rparen("ATTR(...)")?;
            let mut expr = FlattenExtractExpr::new(FlattenExtractKind::Attr, Span::new(start, cur.pos()));
            expr.tag = tag;
            expr.attribute = Some(attr);
            return Ok(expr);
        }
        if name == "COALESCE" {
            cur.bump();
            cur.bump();
            let mut expr = FlattenExtractExpr::new(FlattenExtractKind::Coalesce, Span::new(start, cur.pos()));
            if !cur.at(TokenKind::RParen) {
                loop {
                    expr.args.push(parse_flatten_extract_expr(cur, seen_aliases)?);
                    if cur.eat(TokenKind::Comma) {
                        continue;
                    }
                    break;
                }
            }
            cur.expect_rparen("COALESCE(...)")?;
            return Ok(expr);
        }
        // Generic function call (string functions: concat, lower, upper, ...).
        cur.bump();
        cur.bump();
        let mut expr = FlattenExtractExpr::new(FlattenExtractKind::FunctionCall, Span::new(start, cur.pos()));
        expr.function_name = name;
        if !cur.at(TokenKind::RParen) {
            loop {
                expr.args.push(parse_flatten_extract_expr(cur, seen_aliases)?);
                if cur.eat(TokenKind::Comma) {
                    continue;
                }
                break;
            }
        }
        cur.expect_rparen("the function call")?;
        return Ok(expr);
    }

    // A bare identifier is either an operand accessor (tag, attributes.id,
    // parent.text, ...) or a reference to an earlier alias in this same
    // PROJECT list.
    if cur.kind() == TokenKind::Identifier || cur.kind().is_keyword() {
        let text = cur.peek().text.clone();
        if seen_aliases.iter().any(|a| a.eq_ignore_ascii_case(&text)) && cur.peek_at(1).kind != TokenKind::Dot {
            cur.bump();
            let mut expr = FlattenExtractExpr::new(FlattenExtractKind::AliasRef, Span::new(start, cur.pos()));
            expr.alias_ref = text;
            return Ok(expr);
        }
        let operand = parse_operand(cur)?;
        let mut expr = FlattenExtractExpr::new(FlattenExtractKind::OperandRef, Span::new(start, cur.pos()));
        expr.operand = Some(operand);
        return Ok(expr);
    }

    Err(ParseError::new(
        format!("Expected an expression inside PROJECT(...), found '{}'", cur.peek().text),
        start,
    ))
}
