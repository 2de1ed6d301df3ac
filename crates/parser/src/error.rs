// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Parse errors carry a byte position (not a [`Span`](markql_ir::Span))
//! because the position is all [`markql_diagnostics::Diagnostic::syntax`]
//! needs to render a caret frame — the span itself is reconstructed from
//! the surrounding query text at diagnostic-rendering time.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: usize) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.pos)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;
