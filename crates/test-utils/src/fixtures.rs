// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Sample HTML documents and MarkQL queries shared across the crates'
//! test suites, so a fixture used in `markql-executor`'s tests and one
//! used in `markql-core`'s reads the same way.

/// Small HTML documents exercising the shapes the engine specification's
/// concrete scenarios name: a class-token list, a table with a noisy
/// header, and a two-row table with a missing trailing cell (the `LEFT
/// JOIN LATERAL` padding scenario).
pub struct HtmlFixtures;

impl HtmlFixtures {
    /// An id'd `<ul>` plus two `<div>`s carrying space-separated class
    /// tokens, for `attributes.id`/`attributes.class IN (...)` tests.
    pub const fn id_and_class_tokens() -> &'static str {
        "<ul id='c'><li>US</li></ul><div class=\"subtle newest\"></div><div class=\"old\"></div>"
    }

    /// A `<div>` whose only child is whitespace-padded text, for
    /// `INNER_HTML()`/`RAW_INNER_HTML()` minification tests.
    pub const fn whitespace_padded_span() -> &'static str {
        "<div id='r'><span>   hi   there  </span></div>"
    }

    /// A table with a duplicated-token, padded header and one blank
    /// cell, for `TO TABLE()` header normalization tests.
    pub const fn table_with_noisy_header() -> &'static str {
        "<table><tr><th> Price   Price </th><th></th></tr><tr><td>3</td><td></td></tr></table>"
    }

    /// Two `<tr>`s of four `<td>`s each, the second missing its last
    /// cell, for `LEFT JOIN LATERAL` padding tests.
    pub const fn two_rows_second_missing_a_cell() -> &'static str {
        "<table>\
         <tr><td>1</td><td>widget</td><td>2</td><td>5.00</td></tr>\
         <tr><td>2</td><td>gadget</td><td>1</td></tr>\
         </table>"
    }

    /// Two `<div>`s and a `<span>`, for `COUNT(*)`/`SUMMARIZE(*)` tests.
    pub const fn two_divs_one_span() -> &'static str {
        "<div></div><div></div><span></span>"
    }
}

/// Sample MarkQL queries, valid and invalid, covering the shapes named
/// in the engine specification's concrete scenarios.
pub struct QueryFixtures;

impl QueryFixtures {
    pub const fn select_by_id() -> &'static str {
        "SELECT ul FROM document WHERE attributes.id = 'c'"
    }

    pub const fn select_by_class_token() -> &'static str {
        "SELECT div FROM document WHERE attributes.class IN ('newest')"
    }

    pub const fn count_star() -> &'static str {
        "SELECT COUNT(*) FROM document"
    }

    pub const fn summarize_star() -> &'static str {
        "SELECT SUMMARIZE(*) FROM document"
    }

    pub const fn inner_html_minified() -> &'static str {
        "SELECT inner_html(div) FROM document WHERE attributes.id = 'r'"
    }

    pub const fn raw_inner_html() -> &'static str {
        "SELECT raw_inner_html(div) FROM document WHERE attributes.id = 'r'"
    }

    pub const fn to_table() -> &'static str {
        "SELECT table FROM document TO TABLE()"
    }

    /// `TEXT()` without a non-tag `WHERE` predicate: `MQL-SEM-0301`.
    pub const fn text_requires_non_tag_where() -> &'static str {
        "SELECT TEXT(div) FROM document WHERE tag = 'div'"
    }

    /// A `FROM`/`JOIN` pair sharing an alias: `MQL-SEM-0101`.
    pub const fn duplicate_source_alias() -> &'static str {
        "SELECT d.tag FROM document AS d JOIN document AS d ON d.tag = 'x'"
    }

    /// Missing `FROM` entirely: a syntax error.
    pub const fn missing_from() -> &'static str {
        "SELECT id, name, email"
    }
}
