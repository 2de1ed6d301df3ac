// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures and assertion helpers shared across MarkQL's crates:
//! sample HTML documents and queries, plus assertions over
//! `markql-core`'s `QueryResult`/`Diagnostic` shapes.

pub mod assertions;
pub mod fixtures;

pub use assertions::{assert_failed_with_code, assert_row_count, assert_success};
pub use fixtures::{HtmlFixtures, QueryFixtures};
