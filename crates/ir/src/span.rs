// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Byte-offset source spans attached to every IR node.
//!
//! A [`Span`] is a half-open `[start, end)` byte range into the original
//! query text. Spans are produced by the lexer and threaded through the
//! parser unchanged; the diagnostics layer turns them into line/column
//! caret frames.

use serde::{Deserialize, Serialize};

/// A byte-offset range `[start, end)` into the source query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `pos`, used for synthetic/inserted nodes.
    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
