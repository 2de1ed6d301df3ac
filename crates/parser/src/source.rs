// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `WITH`, `FROM`/`JOIN` sources, and the trailing `TO LIST()`/`TO
//! TABLE()`/`TO CSV(...)` clause.

use std::collections::HashSet;

use markql_ir::{
    EmptyIs, ExportKind, ExportSink, JoinItem, JoinType, Query, Source, SourceKind, SparseShape,
    Span, TableFormat, TableOptions, TrimEmptyCols,
};
use markql_lexer::TokenKind;

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::expr::{parse_expr, parse_scalar_expr};

/// Tracks CTE names visible at the current nesting level so `FROM <ident>`
/// can be classified as [`SourceKind::CteRef`] vs. an unknown identifier.
/// A nested `PARSE`/`FRAGMENTS`/derived subquery starts from a clone of its
/// enclosing scope (names flow inward, never back out).
#[derive(Clone)]
pub struct CteScope {
    names: HashSet<String>,
}

impl CteScope {
    pub fn root() -> Self {
        Self { names: HashSet::new() }
    }

    pub fn child(&self) -> Self {
        self.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_ascii_lowercase());
    }
}

pub fn parse_with(cur: &mut Cursor, scope: &mut CteScope) -> ParseResult<Vec<markql_ir::CteDef>> {
    let mut ctes = Vec::new();
    if !cur.eat(TokenKind::KeywordWith) {
        return Ok(ctes);
    }
    loop {
        let start = cur.pos();
        let name = cur.expect_identifier("a CTE name")?.text;
        if scope.contains(&name) {
            return Err(ParseError::new(format!("Duplicate CTE name '{name}'"), start));
        }
        cur.expect(TokenKind::KeywordAs, "AS after the CTE name")?;
        cur.expect_lparen("the CTE body")?;
        let inner = crate::parse_select_stmt_in_scope(cur, scope)?;
        cur.expect_rparen("the CTE body")?;
        scope.insert(&name);
        ctes.push(markql_ir::CteDef {
            name,
            query: Box::new(inner),
            span: Span::new(start, cur.pos()),
        });
        if cur.eat(TokenKind::Comma) {
            continue;
        }
        break;
    }
    Ok(ctes)
}

fn is_url(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn parse_source(cur: &mut Cursor, scope: &CteScope) -> ParseResult<Source> {
    let start = cur.pos();

    if cur.at(TokenKind::KeywordDocument) {
        cur.bump();
        return Ok(with_alias(Source::new(SourceKind::Document, Span::new(start, cur.pos())), cur)?);
    }
    if cur.at(TokenKind::KeywordRaw) {
        cur.bump();
        cur.expect_lparen("RAW")?;
        let html = cur.expect_string("an HTML string literal inside RAW(...)")?.text;
        cur.expect_rparen("RAW(...)")?;
        let source = Source::new(SourceKind::RawHtml, Span::new(start, cur.pos())).with_value(html);
        return with_alias(source, cur);
    }
    if cur.at(TokenKind::KeywordParse) || cur.at(TokenKind::KeywordFragments) {
        let is_fragments = cur.at(TokenKind::KeywordFragments);
        cur.bump();
        cur.expect_lparen(if is_fragments { "FRAGMENTS" } else { "PARSE" })?;
        let mut source = Source::new(
            if is_fragments { SourceKind::Fragments } else { SourceKind::Parse },
            Span::new(start, cur.pos()),
        );
        if cur.at(TokenKind::KeywordSelect) || cur.at(TokenKind::KeywordWith) {
            let mut inner_scope = scope.child();
            let inner = crate::parse_select_stmt_in_scope(cur, &mut inner_scope)?;
            if is_fragments {
                source.fragments_query = Some(Box::new(inner));
            } else {
                source.parse_query = Some(Box::new(inner));
            }
        } else {
            let scalar = parse_scalar_expr(cur)?;
            if is_fragments {
                source.fragments_raw = Some(scalar_to_raw_placeholder(&scalar));
            } else {
                source.parse_expr = Some(Box::new(scalar));
            }
        }
        cur.expect_rparen(if is_fragments { "FRAGMENTS(...)" } else { "PARSE(...)" })?;
        return with_alias(source, cur);
    }
    if cur.at(TokenKind::LParen) {
        cur.bump();
        let mut inner_scope = scope.child();
        let inner = crate::parse_select_stmt_in_scope(cur, &mut inner_scope)?;
        cur.expect_rparen("the derived subquery")?;
        let mut source = Source::new(SourceKind::DerivedSubquery, Span::new(start, cur.pos()));
        source.derived_query = Some(Box::new(inner));
        if !cur.eat(TokenKind::KeywordAs) {
            return Err(ParseError::new("Derived table requires an alias", start));
        }
        let alias = cur.expect_identifier("an alias name after AS")?.text;
        source.alias = Some(alias);
        return Ok(source);
    }
    if cur.at(TokenKind::String) {
        let text = cur.bump().text;
        let kind = if is_url(&text) { SourceKind::Url } else { SourceKind::Path };
        let source = Source::new(kind, Span::new(start, cur.pos())).with_value(text);
        return with_alias(source, cur);
    }
    if cur.kind() == TokenKind::Identifier {
        let ident = cur.bump().text;
        let lower = ident.to_ascii_lowercase();
        let source = if lower == "doc" {
            Source::new(SourceKind::Document, Span::new(start, cur.pos()))
        } else {
            Source::new(SourceKind::CteRef, Span::new(start, cur.pos())).with_value(ident)
        };
        return with_alias(source, cur);
    }

    Err(ParseError::new(
        format!("Expected a FROM source (document, a CTE name, a path/URL string, RAW(...), PARSE(...), or a derived subquery), found '{}'", cur.peek().text),
        start,
    ))
}

/// `PARSE`/`FRAGMENTS` given a non-SELECT scalar expression: the raw HTML
/// text is resolved at execution time, not parse time, so we stash a
/// placeholder marker — the executor re-derives the actual fragment text
/// from `parse_expr`/`fragments_raw`'s sibling field when present.
fn scalar_to_raw_placeholder(expr: &markql_ir::ScalarExpr) -> String {
    match &expr.kind {
        markql_ir::ScalarExprKind::StringLiteral(s) => s.clone(),
        _ => String::new(),
    }
}

fn with_alias(mut source: Source, cur: &mut Cursor) -> ParseResult<Source> {
    if cur.eat(TokenKind::KeywordAs) {
        let alias = cur.expect_identifier("an alias name after AS")?.text;
        source.alias = Some(alias);
    }
    Ok(source)
}

pub fn parse_joins(cur: &mut Cursor, scope: &CteScope) -> ParseResult<Vec<JoinItem>> {
    let mut joins = Vec::new();
    loop {
        let start = cur.pos();
        let join_type = if cur.eat(TokenKind::KeywordLeft) {
            Some(JoinType::Left)
        } else if cur.eat(TokenKind::KeywordInner) {
            Some(JoinType::Inner)
        } else if cur.eat(TokenKind::KeywordCross) {
            Some(JoinType::Cross)
        } else {
            None
        };
        if !cur.at(TokenKind::KeywordJoin) {
            if join_type.is_some() {
                return Err(ParseError::new("Expected JOIN after the join type keyword", cur.pos()));
            }
            break;
        }
        cur.bump();
        let lateral = cur.eat(TokenKind::KeywordLateral);
        let right_source = parse_source(cur, scope)?;
        if lateral && right_source.alias.is_none() {
            return Err(ParseError::new("LATERAL subquery requires an alias", start));
        }
        let join_type = join_type.unwrap_or(JoinType::Inner);
        let on = if cur.eat(TokenKind::KeywordOn) {
            Some(parse_expr(cur)?)
        } else {
            None
        };
        if matches!(join_type, JoinType::Cross) && on.is_some() {
            return Err(ParseError::new("CROSS JOIN does not allow ON", start));
        }
        if !matches!(join_type, JoinType::Cross) && on.is_none() {
            return Err(ParseError::new("JOIN requires ON (use CROSS JOIN for an unconditional join)", start));
        }
        joins.push(JoinItem {
            join_type,
            right_source,
            on,
            lateral,
            span: Span::new(start, cur.pos()),
        });
    }
    Ok(joins)
}

pub fn parse_order_by(cur: &mut Cursor) -> ParseResult<Vec<markql_ir::OrderBy>> {
    let mut items = Vec::new();
    if !cur.eat(TokenKind::KeywordOrder) {
        return Ok(items);
    }
    cur.expect(TokenKind::KeywordBy, "BY after ORDER")?;
    loop {
        let start = cur.pos();
        let mut field = cur.expect_identifier("an ORDER BY field name")?.text;
        if cur.eat(TokenKind::Dot) {
            let second = cur.expect_identifier("a field name after the alias")?.text;
            field = format!("{field}.{second}");
        }
        let descending = if cur.eat(TokenKind::KeywordDesc) {
            true
        } else {
            cur.eat(TokenKind::KeywordAsc);
            false
        };
        items.push(markql_ir::OrderBy {
            field,
            descending,
            span: Span::new(start, cur.pos()),
        });
        if cur.eat(TokenKind::Comma) {
            continue;
        }
        break;
    }
    Ok(items)
}

pub fn parse_exclude(cur: &mut Cursor) -> ParseResult<Vec<String>> {
    let mut fields = Vec::new();
    if !cur.eat(TokenKind::KeywordExclude) {
        return Ok(fields);
    }
    cur.expect_lparen("EXCLUDE")?;
    if !cur.at(TokenKind::RParen) {
        loop {
            fields.push(cur.expect_identifier("a field name inside EXCLUDE(...)")?.text);
            if cur.eat(TokenKind::Comma) {
                continue;
            }
            break;
        }
    }
    cur.expect_rparen("EXCLUDE(...)")?;
    Ok(fields)
}

pub fn parse_limit(cur: &mut Cursor) -> ParseResult<Option<usize>> {
    if !cur.eat(TokenKind::KeywordLimit) {
        return Ok(None);
    }
    let tok = cur.expect_number("a non-negative integer after LIMIT")?;
    Ok(Some(tok.text.parse().unwrap_or(0)))
}

/// Applies the trailing `TO LIST()` / `TO TABLE(...)` / `TO CSV(...)` /
/// `TO PARQUET(...)` / `TO JSON(...)` / `TO NDJSON(...)` clause to `query`.
pub fn parse_to_clause(cur: &mut Cursor, query: &mut Query) -> ParseResult<()> {
    if !cur.eat(TokenKind::KeywordTo) {
        return Ok(());
    }
    if cur.eat(TokenKind::KeywordList) {
        cur.expect_lparen("LIST")?;
        cur.expect_rparen("LIST()")?;
        query.to_list = true;
        return Ok(());
    }
    if cur.eat(TokenKind::KeywordTable) {
        cur.expect_lparen("TABLE")?;
        query.to_table = true;
        query.table_options = parse_table_options(cur, &mut query.table_has_header)?;
        cur.expect_rparen("TABLE(...)")?;
        return Ok(());
    }
    let kind = if cur.eat(TokenKind::KeywordCsv) {
        ExportKind::Csv
    } else if cur.eat(TokenKind::KeywordParquet) {
        ExportKind::Parquet
    } else if cur.eat(TokenKind::KeywordJson) {
        ExportKind::Json
    } else if cur.eat(TokenKind::KeywordNdjson) {
        ExportKind::Ndjson
    } else {
        return Err(ParseError::new(
            format!("Expected LIST, TABLE, CSV, PARQUET, JSON, or NDJSON after TO, found '{}'", cur.peek().text),
            cur.pos(),
        ));
    };
    let start = cur.pos();
    cur.expect_lparen("the export sink")?;
    let path = cur.expect_string("a destination path string")?.text;
    cur.expect_rparen("the export sink")?;
    query.export_sink = Some(ExportSink {
        kind,
        path,
        span: Span::new(start, cur.pos()),
    });
    Ok(())
}

fn parse_table_options(cur: &mut Cursor, table_has_header: &mut bool) -> ParseResult<TableOptions> {
    let mut options = TableOptions::default();
    if cur.at(TokenKind::RParen) {
        return Ok(options);
    }
    loop {
        let key = cur.expect_identifier("a TO TABLE(...) option name")?.text.to_ascii_uppercase();
        cur.expect(TokenKind::Equal, "'=' after the option name")?;
        match key.as_str() {
            "HEADER" => *table_has_header = parse_bool(cur)?,
            "HEADER_NORMALIZE" => {
                options.header_normalize = parse_bool(cur)?;
                options.header_normalize_explicit = true;
            }
            "TRIM_EMPTY_ROWS" => options.trim_empty_rows = parse_bool(cur)?,
            "TRIM_EMPTY_COLS" => {
                let value = cur.expect_identifier("OFF, TRAILING, or ALL")?.text.to_ascii_uppercase();
                options.trim_empty_cols = match value.as_str() {
                    "OFF" => TrimEmptyCols::Off,
                    "TRAILING" => TrimEmptyCols::Trailing,
                    "ALL" => TrimEmptyCols::All,
                    other => return Err(ParseError::new(format!("Unknown TRIM_EMPTY_COLS value '{other}'"), cur.pos())),
                };
            }
            "EMPTY_IS" => {
                let value = cur.expect_identifier("BLANK_OR_NULL, NULL_ONLY, or BLANK_ONLY")?.text.to_ascii_uppercase();
                options.empty_is = match value.as_str() {
                    "BLANK_OR_NULL" => EmptyIs::BlankOrNull,
                    "NULL_ONLY" => EmptyIs::NullOnly,
                    "BLANK_ONLY" => EmptyIs::BlankOnly,
                    other => return Err(ParseError::new(format!("Unknown EMPTY_IS value '{other}'"), cur.pos())),
                };
            }
            "FORMAT" => {
                let value = cur.expect_identifier("RECT or SPARSE")?.text.to_ascii_uppercase();
                options.format = match value.as_str() {
                    "RECT" => TableFormat::Rect,
                    "SPARSE" => TableFormat::Sparse,
                    other => return Err(ParseError::new(format!("Unknown FORMAT value '{other}'"), cur.pos())),
                };
            }
            "SPARSE_SHAPE" => {
                let value = cur.expect_identifier("LONG or WIDE")?.text.to_ascii_uppercase();
                options.sparse_shape = match value.as_str() {
                    "LONG" => SparseShape::Long,
                    "WIDE" => SparseShape::Wide,
                    other => return Err(ParseError::new(format!("Unknown SPARSE_SHAPE value '{other}'"), cur.pos())),
                };
            }
            "STOP_AFTER_EMPTY_ROWS" => {
                options.stop_after_empty_rows = cur.expect_number("a number for STOP_AFTER_EMPTY_ROWS")?.text.parse().unwrap_or(0);
            }
            other => return Err(ParseError::new(format!("Unknown TO TABLE(...) option '{other}'"), cur.pos())),
        }
        if cur.eat(TokenKind::Comma) {
            continue;
        }
        break;
    }
    Ok(options)
}

fn parse_bool(cur: &mut Cursor) -> ParseResult<bool> {
    let ident = cur.expect_identifier("TRUE or FALSE")?.text.to_ascii_uppercase();
    match ident.as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        other => Err(ParseError::new(format!("Expected TRUE or FALSE, found '{other}'"), cur.pos())),
    }
}
