// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Pure string function evaluation.
//!
//! DOM functions (`text`, `attr`, `inner_html`, ...) need axis/document
//! context the executor owns, so they aren't dispatched here — only the
//! string surface, which is a pure function of its argument [`Value`]s.

use crate::metadata::{Arity, FunctionCategory, FunctionMetadata};
use crate::value::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CallError {
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("{name}() expects {expected}, got {actual}")]
    Arity { name: String, expected: String, actual: usize },
}

pub fn all_functions() -> Vec<FunctionMetadata> {
    vec![
        FunctionMetadata::new("concat", FunctionCategory::String, Arity::at_least(1))
            .with_description("Concatenates its arguments"),
        FunctionMetadata::new("lower", FunctionCategory::String, Arity::exact(1))
            .with_description("Lowercases a string"),
        FunctionMetadata::new("upper", FunctionCategory::String, Arity::exact(1))
            .with_description("Uppercases a string"),
        FunctionMetadata::new("trim", FunctionCategory::String, Arity::exact(1))
            .with_description("Trims leading and trailing whitespace"),
        FunctionMetadata::new("ltrim", FunctionCategory::String, Arity::exact(1))
            .with_description("Trims leading whitespace"),
        FunctionMetadata::new("rtrim", FunctionCategory::String, Arity::exact(1))
            .with_description("Trims trailing whitespace"),
        FunctionMetadata::new("replace", FunctionCategory::String, Arity::exact(3))
            .with_description("Replaces all occurrences of a substring"),
        FunctionMetadata::new("length", FunctionCategory::String, Arity::exact(1))
            .with_description("Byte length of a string"),
        FunctionMetadata::new("char_length", FunctionCategory::String, Arity::exact(1))
            .with_description("Character count of a string"),
        FunctionMetadata::new("substring", FunctionCategory::String, Arity::range(2, 3))
            .with_description("1-based substring extraction"),
        FunctionMetadata::new("substr", FunctionCategory::String, Arity::range(2, 3))
            .with_description("Alias of substring"),
        FunctionMetadata::new("position", FunctionCategory::String, Arity::exact(2))
            .with_description("1-based index of a substring, 0 if absent"),
        FunctionMetadata::new("locate", FunctionCategory::String, Arity::range(2, 3))
            .with_description("1-based index of a substring from an optional start"),
        FunctionMetadata::new("coalesce", FunctionCategory::String, Arity::at_least(1))
            .null_tolerant()
            .with_description("First non-null argument"),
        FunctionMetadata::new("case", FunctionCategory::String, Arity::at_least(1))
            .null_tolerant()
            .with_description("CASE WHEN ... THEN ... ELSE ... END, structural in the query IR"),
    ]
}

/// Dispatches a string function by name. Arity is assumed already
/// validated (the static validator checks it against [`all_functions`]
/// before the executor ever calls this); a mismatch here is a logic
/// error, not a user-facing one.
pub fn call(name: &str, args: &[Value]) -> Result<Value, CallError> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "coalesce" => Ok(coalesce(args)),
        "concat" => Ok(propagate_null(args, |a| Value::text(a.iter().map(|v| v.display_text()).collect::<String>()))),
        "lower" => Ok(propagate_null(args, |a| Value::text(a[0].display_text().to_lowercase()))),
        "upper" => Ok(propagate_null(args, |a| Value::text(a[0].display_text().to_uppercase()))),
        "trim" => Ok(propagate_null(args, |a| Value::text(a[0].display_text().trim().to_string()))),
        "ltrim" => Ok(propagate_null(args, |a| Value::text(a[0].display_text().trim_start().to_string()))),
        "rtrim" => Ok(propagate_null(args, |a| Value::text(a[0].display_text().trim_end().to_string()))),
        "replace" => Ok(propagate_null(args, |a| {
            Value::text(a[0].display_text().replace(&a[1].display_text(), &a[2].display_text()))
        })),
        "length" => Ok(propagate_null(args, |a| Value::Number(a[0].display_text().len() as i64))),
        "char_length" => Ok(propagate_null(args, |a| Value::Number(a[0].display_text().chars().count() as i64))),
        "substring" | "substr" => Ok(propagate_null(args, substring)),
        "position" => Ok(propagate_null(args, |a| {
            Value::Number(find_1based(&a[1].display_text(), &a[0].display_text()))
        })),
        "locate" => Ok(propagate_null(args, locate)),
        _ => Err(CallError::UnknownFunction(name.to_string())),
    }
}

fn propagate_null(args: &[Value], f: impl FnOnce(&[Value]) -> Value) -> Value {
    if args.iter().any(Value::is_null) {
        Value::Null
    } else {
        f(args)
    }
}

fn coalesce(args: &[Value]) -> Value {
    args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null)
}

/// 1-based `substring(str, start[, length])`, clamped to the string's
/// bounds rather than erroring on out-of-range indices.
fn substring(args: &[Value]) -> Value {
    let text = args[0].display_text();
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;
    let start_1based = args[1].as_i64().unwrap_or(1);
    let start0 = (start_1based.max(1) - 1).min(len);
    let take = args.get(2).and_then(Value::as_i64).unwrap_or(len - start0).max(0);
    let end0 = (start0 + take).min(len);
    Value::text(chars[start0 as usize..end0 as usize].iter().collect::<String>())
}

fn find_1based(haystack: &str, needle: &str) -> i64 {
    if needle.is_empty() {
        return 1;
    }
    match haystack.find(needle) {
        Some(byte_idx) => haystack[..byte_idx].chars().count() as i64 + 1,
        None => 0,
    }
}

fn locate(args: &[Value]) -> Value {
    let needle = args[0].display_text();
    let haystack = args[1].display_text();
    let start_1based = args.get(2).and_then(Value::as_i64).unwrap_or(1).max(1);
    let chars: Vec<char> = haystack.chars().collect();
    let start0 = ((start_1based - 1) as usize).min(chars.len());
    let tail: String = chars[start0..].iter().collect();
    match find_1based(&tail, &needle) {
        0 => Value::Number(0),
        found => Value::Number(found + start0 as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_propagates_null() {
        assert_eq!(call("concat", &[Value::text("a"), Value::Null]).unwrap(), Value::Null);
        assert_eq!(
            call("concat", &[Value::text("a"), Value::text("b")]).unwrap(),
            Value::text("ab")
        );
    }

    #[test]
    fn coalesce_returns_first_non_null() {
        assert_eq!(
            call("coalesce", &[Value::Null, Value::Null, Value::text("x")]).unwrap(),
            Value::text("x")
        );
    }

    #[test]
    fn substring_is_one_based_and_clamped() {
        assert_eq!(call("substring", &[Value::text("hello"), Value::Number(2)]).unwrap(), Value::text("ello"));
        assert_eq!(
            call("substring", &[Value::text("hello"), Value::Number(2), Value::Number(2)]).unwrap(),
            Value::text("el")
        );
        assert_eq!(
            call("substring", &[Value::text("hi"), Value::Number(1), Value::Number(99)]).unwrap(),
            Value::text("hi")
        );
    }

    #[test]
    fn position_and_locate_are_one_based() {
        assert_eq!(call("position", &[Value::text("lo"), Value::text("hello")]).unwrap(), Value::Number(4));
        assert_eq!(
            call("locate", &[Value::text("l"), Value::text("hello"), Value::Number(4)]).unwrap(),
            Value::Number(4)
        );
        assert_eq!(call("position", &[Value::text("z"), Value::text("hello")]).unwrap(), Value::Number(0));
    }

    #[test]
    fn unknown_function_errors() {
        assert_eq!(call("nope", &[]).unwrap_err(), CallError::UnknownFunction("nope".to_string()));
    }
}
