// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use serde::{Deserialize, Serialize};

/// Every lexical token the lexer can produce. Keyword variants exist
/// one-per-keyword rather than as a single `Keyword(String)` payload so
/// the parser can match on them exhaustively without a second string
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    String,
    Number,
    Comma,
    Colon,
    Dot,
    LParen,
    RParen,
    Semicolon,
    Star,
    End,
    Invalid,

    KeywordSelect,
    KeywordWith,
    KeywordFrom,
    KeywordJoin,
    KeywordLeft,
    KeywordInner,
    KeywordCross,
    KeywordLateral,
    KeywordOn,
    KeywordWhere,
    KeywordAnd,
    KeywordOr,
    KeywordIn,
    KeywordExists,
    KeywordDocument,
    KeywordLimit,
    KeywordExclude,
    KeywordOrder,
    KeywordBy,
    KeywordAsc,
    KeywordDesc,
    KeywordAs,
    KeywordTo,
    KeywordList,
    KeywordCount,
    KeywordTable,
    KeywordCsv,
    KeywordParquet,
    KeywordJson,
    KeywordNdjson,
    KeywordRaw,
    KeywordFragments,
    KeywordParse,
    KeywordContains,
    KeywordHasDirectText,
    KeywordLike,
    KeywordAll,
    KeywordAny,
    KeywordIs,
    KeywordNot,
    KeywordNull,
    KeywordCase,
    KeywordWhen,
    KeywordThen,
    KeywordElse,
    KeywordEnd,
    KeywordShow,
    KeywordDescribe,
    KeywordProject,
    KeywordInput,
    KeywordInputs,
    KeywordFunctions,
    KeywordAxes,
    KeywordOperators,
    KeywordSelf,

    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    RegexMatch,
}

/// A single lexed token: its kind, the exact source text it covers
/// (unescaped for string literals), and the byte offset its first
/// character starts at.
///
/// An `Invalid` token repurposes `text` to carry the lexer's error
/// message, matching how the parser surfaces lex errors as diagnostics
/// without a separate error channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }
}

impl TokenKind {
    /// True for any `Keyword*` variant — used by the parser to accept
    /// keywords as bare names in positions like `AS <alias>` where
    /// MarkQL keywords are not fully reserved.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KeywordSelect
                | TokenKind::KeywordWith
                | TokenKind::KeywordFrom
                | TokenKind::KeywordJoin
                | TokenKind::KeywordLeft
                | TokenKind::KeywordInner
                | TokenKind::KeywordCross
                | TokenKind::KeywordLateral
                | TokenKind::KeywordOn
                | TokenKind::KeywordWhere
                | TokenKind::KeywordAnd
                | TokenKind::KeywordOr
                | TokenKind::KeywordIn
                | TokenKind::KeywordExists
                | TokenKind::KeywordDocument
                | TokenKind::KeywordLimit
                | TokenKind::KeywordExclude
                | TokenKind::KeywordOrder
                | TokenKind::KeywordBy
                | TokenKind::KeywordAsc
                | TokenKind::KeywordDesc
                | TokenKind::KeywordAs
                | TokenKind::KeywordTo
                | TokenKind::KeywordList
                | TokenKind::KeywordCount
                | TokenKind::KeywordTable
                | TokenKind::KeywordCsv
                | TokenKind::KeywordParquet
                | TokenKind::KeywordJson
                | TokenKind::KeywordNdjson
                | TokenKind::KeywordRaw
                | TokenKind::KeywordFragments
                | TokenKind::KeywordParse
                | TokenKind::KeywordContains
                | TokenKind::KeywordHasDirectText
                | TokenKind::KeywordLike
                | TokenKind::KeywordAll
                | TokenKind::KeywordAny
                | TokenKind::KeywordIs
                | TokenKind::KeywordNot
                | TokenKind::KeywordNull
                | TokenKind::KeywordCase
                | TokenKind::KeywordWhen
                | TokenKind::KeywordThen
                | TokenKind::KeywordElse
                | TokenKind::KeywordEnd
                | TokenKind::KeywordShow
                | TokenKind::KeywordDescribe
                | TokenKind::KeywordProject
                | TokenKind::KeywordInput
                | TokenKind::KeywordInputs
                | TokenKind::KeywordFunctions
                | TokenKind::KeywordAxes
                | TokenKind::KeywordOperators
                | TokenKind::KeywordSelf
        )
    }
}
