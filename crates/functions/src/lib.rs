// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # MarkQL — Functions
//!
//! Function metadata and pure-string evaluation for the DOM accessor and
//! string surfaces described by expression evaluation. The static
//! validator uses [`FunctionRegistry`] to reject unknown names and wrong
//! arities up front; the executor dispatches string calls through
//! [`builtin::string::call`] directly, since those need no document
//! context, while DOM calls (`text`, `attr`, ...) are evaluated by the
//! executor itself against its own axis walkers.

pub mod builtin;
mod metadata;
mod registry;
mod value;

pub use builtin::string::CallError;
pub use metadata::{Arity, FunctionCategory, FunctionMetadata};
pub use registry::FunctionRegistry;
pub use value::Value;
