// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Metadata for DOM accessor functions. Unlike the string functions in
//! [`crate::builtin::string`], these aren't dispatched here — they need
//! axis walking and document access that only the executor has — so this
//! module exists purely to describe names and arities for validation and
//! `SHOW FUNCTIONS`.

use crate::metadata::{Arity, FunctionCategory, FunctionMetadata};

pub fn all_functions() -> Vec<FunctionMetadata> {
    vec![
        FunctionMetadata::new("text", FunctionCategory::Dom, Arity::exact(1))
            .with_description("Concatenated descendant text of a tag or self"),
        FunctionMetadata::new("direct_text", FunctionCategory::Dom, Arity::exact(1))
            .with_description("Direct text of a tag or self, excluding descendants"),
        FunctionMetadata::new("inner_html", FunctionCategory::Dom, Arity::range(1, 2))
            .with_description("Minified inner HTML, optionally depth-limited"),
        FunctionMetadata::new("raw_inner_html", FunctionCategory::Dom, Arity::range(1, 2))
            .with_description("Unminified inner HTML, optionally depth-limited"),
        FunctionMetadata::new("attr", FunctionCategory::Dom, Arity::exact(2))
            .with_description("Named attribute value of a tag or self"),
        FunctionMetadata::new("first_text", FunctionCategory::Dom, Arity::exact(1))
            .with_description("Text of the first matching descendant"),
        FunctionMetadata::new("last_text", FunctionCategory::Dom, Arity::exact(1))
            .with_description("Text of the last matching descendant"),
        FunctionMetadata::new("first_attr", FunctionCategory::Dom, Arity::exact(2))
            .with_description("Attribute value of the first matching descendant"),
        FunctionMetadata::new("last_attr", FunctionCategory::Dom, Arity::exact(2))
            .with_description("Attribute value of the last matching descendant"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_text_and_attr() {
        let funcs = all_functions();
        assert!(funcs.iter().any(|f| f.name == "text"));
        assert!(funcs.iter().any(|f| f.name == "attr"));
    }
}
