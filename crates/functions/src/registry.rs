// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::builtin;
use crate::metadata::{FunctionCategory, FunctionMetadata};

/// Registry of builtin function metadata, used by the static validator to
/// reject unknown names and wrong arities before the executor ever runs,
/// and by `SHOW FUNCTIONS` to list what's available.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: Vec<FunctionMetadata>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut functions = builtin::dom::all_functions();
        functions.extend(builtin::string::all_functions());
        Self { functions }
    }

    pub fn all(&self) -> &[FunctionMetadata] {
        &self.functions
    }

    pub fn get(&self, name: &str) -> Option<&FunctionMetadata> {
        self.functions.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn category(&self, name: &str) -> Option<FunctionCategory> {
        self.get(name).map(|f| f.category)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_loads_both_categories() {
        let registry = FunctionRegistry::new();
        assert!(registry.has_function("TEXT"));
        assert!(registry.has_function("concat"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("UPPER").is_some());
        assert!(registry.get("upper").is_some());
        assert!(registry.get("Upper").is_some());
    }

    #[test]
    fn unknown_function_is_absent() {
        let registry = FunctionRegistry::new();
        assert!(!registry.has_function("nonexistent"));
    }

    #[test]
    fn arity_checks_reject_wrong_argument_counts() {
        let registry = FunctionRegistry::new();
        let attr = registry.get("attr").unwrap();
        assert!(!attr.arity.accepts(1));
        assert!(attr.arity.accepts(2));
    }
}
