// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use serde::{Deserialize, Serialize};

/// Which half of the function surface a name belongs to. DOM functions
/// need axis/document context and are dispatched by the executor; string
/// functions are pure and dispatched from [`crate::builtin::string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionCategory {
    Dom,
    String,
}

/// Arity bounds for a function call; `max` of `None` means unbounded
/// (`CONCAT`, `COALESCE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub fn exact(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub fn range(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    pub fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionMetadata {
    pub name: String,
    pub category: FunctionCategory,
    pub arity: Arity,
    /// `true` for functions where a `NULL` argument does not force the
    /// whole call to `NULL` (`coalesce`, `case-when`).
    pub null_tolerant: bool,
    pub description: String,
}

impl FunctionMetadata {
    pub fn new(name: impl Into<String>, category: FunctionCategory, arity: Arity) -> Self {
        Self {
            name: name.into(),
            category,
            arity,
            null_tolerant: false,
            description: String::new(),
        }
    }

    pub fn null_tolerant(mut self) -> Self {
        self.null_tolerant = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
