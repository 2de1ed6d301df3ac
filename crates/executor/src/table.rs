// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `TO TABLE(...)` extraction: every `<tr>` under a matching `<table>`
//! becomes a row, every `<td>`/`<th>` a cell, shaped by [`TableOptions`].

use std::collections::BTreeMap;

use markql_ir::{EmptyIs, SparseShape, TableFormat, TableOptions, TrimEmptyCols};

use crate::domfn::TreeIndex;
use crate::result::{SparseCell, TableResult};

fn is_empty_cell(cell: &Option<String>, empty_is: EmptyIs) -> bool {
    match empty_is {
        EmptyIs::NullOnly => cell.is_none(),
        EmptyIs::BlankOnly => cell.as_deref().map(str::trim).is_some_and(str::is_empty),
        EmptyIs::BlankOrNull => cell.is_none() || cell.as_deref().map(str::trim).is_some_and(str::is_empty),
    }
}

fn row_is_empty(row: &[Option<String>], empty_is: EmptyIs) -> bool {
    row.iter().all(|c| is_empty_cell(c, empty_is))
}

fn collect_rows(tree: &TreeIndex, table_id: u32) -> Vec<Vec<Option<String>>> {
    let mut rows = Vec::new();
    for &tr_id in &tree.descendants_of(table_id) {
        if !tree.node(tr_id).tag.eq_ignore_ascii_case("tr") {
            continue;
        }
        let cells: Vec<Option<String>> = tree
            .children_of(tr_id)
            .iter()
            .filter(|&&id| {
                let tag = &tree.node(id).tag;
                tag.eq_ignore_ascii_case("td") || tag.eq_ignore_ascii_case("th")
            })
            .map(|&id| Some(tree.node(id).text.trim().to_string()))
            .collect();
        rows.push(cells);
    }
    rows
}

/// Collapse internal whitespace, dedupe adjacent repeated tokens, and
/// fall back to `col_N` for an empty header, then dedupe across the
/// whole header row with `_2`, `_3`, ... suffixes.
fn normalize_headers(raw: &[Option<String>]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    raw.iter()
        .enumerate()
        .map(|(i, cell)| {
            let text = cell.as_deref().unwrap_or("").trim();
            let collapsed = text.split_whitespace().collect::<Vec<_>>();
            let mut deduped: Vec<&str> = Vec::new();
            for tok in collapsed {
                if deduped.last() != Some(&tok) {
                    deduped.push(tok);
                }
            }
            let mut name = deduped.join(" ");
            if name.is_empty() {
                name = format!("col_{}", i + 1);
            }
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                format!("{name}_{count}")
            } else {
                name
            }
        })
        .collect()
}

fn trim_columns(rows: &mut Vec<Vec<Option<String>>>, headers: &mut Vec<String>, options: &TableOptions) {
    if options.trim_empty_cols == TrimEmptyCols::Off {
        return;
    }
    let width = headers.len();
    let col_empty: Vec<bool> = (0..width)
        .map(|c| rows.iter().all(|r| is_empty_cell(r.get(c).unwrap_or(&None), options.empty_is)))
        .collect();

    let keep: Vec<bool> = match options.trim_empty_cols {
        TrimEmptyCols::Off => vec![true; width],
        TrimEmptyCols::All => col_empty.iter().map(|e| !e).collect(),
        TrimEmptyCols::Trailing => {
            let mut keep = vec![true; width];
            for c in (0..width).rev() {
                if col_empty[c] {
                    keep[c] = false;
                } else {
                    break;
                }
            }
            keep
        }
    };

    *headers = headers.iter().zip(&keep).filter(|(_, k)| **k).map(|(h, _)| h.clone()).collect();
    for row in rows.iter_mut() {
        *row = row.iter().zip(&keep).filter(|(_, k)| **k).map(|(c, _)| c.clone()).collect();
    }
}

/// Extracts every `<tr>` under `table_id` into a [`TableResult`] shaped
/// by `options`. `has_header` selects the header row from the data
/// (`TO TABLE(HEADER)`); without it, headers are synthesized as
/// `col_1`, `col_2`, ...
pub fn extract_table(tree: &TreeIndex, table_id: u32, options: &TableOptions, has_header: bool) -> TableResult {
    let mut rows = collect_rows(tree, table_id);
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, None);
    }

    let mut headers = if has_header && !rows.is_empty() {
        let header_row = rows.remove(0);
        if options.header_normalize {
            normalize_headers(&header_row)
        } else {
            header_row.iter().map(|c| c.clone().unwrap_or_default()).collect()
        }
    } else {
        (1..=width).map(|i| format!("col_{i}")).collect()
    };

    if options.trim_empty_rows {
        rows.retain(|r| !row_is_empty(r, options.empty_is));
    }

    if options.stop_after_empty_rows > 0 {
        let mut streak = 0usize;
        let mut cutoff = rows.len();
        for (i, row) in rows.iter().enumerate() {
            if row_is_empty(row, options.empty_is) {
                streak += 1;
                if streak >= options.stop_after_empty_rows {
                    cutoff = i + 1 - streak;
                    break;
                }
            } else {
                streak = 0;
            }
        }
        rows.truncate(cutoff);
    }

    trim_columns(&mut rows, &mut headers, options);

    match options.format {
        TableFormat::Rect => TableResult::Rect { headers, rows },
        TableFormat::Sparse => match options.sparse_shape {
            SparseShape::Long => {
                let mut cells = Vec::new();
                for (row_index, row) in rows.iter().enumerate() {
                    for (col_index, cell) in row.iter().enumerate() {
                        if is_empty_cell(cell, options.empty_is) {
                            continue;
                        }
                        cells.push(SparseCell {
                            row_index,
                            col_index,
                            header: headers.get(col_index).cloned(),
                            value: cell.clone().unwrap_or_default(),
                        });
                    }
                }
                TableResult::SparseLong { cells }
            }
            SparseShape::Wide => {
                let wide_rows = rows
                    .iter()
                    .map(|row| {
                        let mut map = BTreeMap::new();
                        for (col_index, cell) in row.iter().enumerate() {
                            if is_empty_cell(cell, options.empty_is) {
                                continue;
                            }
                            if let Some(header) = headers.get(col_index) {
                                map.insert(header.clone(), cell.clone().unwrap_or_default());
                            }
                        }
                        map
                    })
                    .collect();
                TableResult::SparseWide { headers, rows: wide_rows }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_html::parse_html;
    use std::rc::Rc;

    fn table_tree(html: &str) -> (TreeIndex, u32) {
        let doc = parse_html(html);
        let table_id = doc.nodes.iter().find(|n| n.tag == "table").unwrap().id;
        (TreeIndex::new(Rc::new(doc)), table_id)
    }

    #[test]
    fn extracts_a_simple_header_and_rows() {
        let (tree, table_id) = table_tree("<table><tr><th>Name</th><th>Qty</th></tr><tr><td>Widget</td><td>3</td></tr></table>");
        let result = extract_table(&tree, table_id, &TableOptions::default(), true);
        match result {
            TableResult::Rect { headers, rows } => {
                assert_eq!(headers, vec!["Name", "Qty"]);
                assert_eq!(rows, vec![vec![Some("Widget".to_string()), Some("3".to_string())]]);
            }
            _ => panic!("expected Rect"),
        }
    }

    #[test]
    fn synthesizes_col_n_headers_without_header_flag() {
        let (tree, table_id) = table_tree("<table><tr><td>a</td><td>b</td></tr></table>");
        let result = extract_table(&tree, table_id, &TableOptions::default(), false);
        match result {
            TableResult::Rect { headers, .. } => assert_eq!(headers, vec!["col_1", "col_2"]),
            _ => panic!("expected Rect"),
        }
    }

    #[test]
    fn trims_trailing_empty_columns() {
        let (tree, table_id) = table_tree("<table><tr><td>a</td><td></td></tr><tr><td>b</td><td></td></tr></table>");
        let options = TableOptions { trim_empty_cols: TrimEmptyCols::Trailing, ..TableOptions::default() };
        let result = extract_table(&tree, table_id, &options, false);
        match result {
            TableResult::Rect { headers, rows } => {
                assert_eq!(headers, vec!["col_1"]);
                assert_eq!(rows.len(), 2);
            }
            _ => panic!("expected Rect"),
        }
    }

    #[test]
    fn sparse_long_skips_empty_cells() {
        let (tree, table_id) = table_tree("<table><tr><td>a</td><td></td></tr></table>");
        let options = TableOptions { format: TableFormat::Sparse, sparse_shape: SparseShape::Long, ..TableOptions::default() };
        let result = extract_table(&tree, table_id, &options, false);
        match result {
            TableResult::SparseLong { cells } => {
                assert_eq!(cells.len(), 1);
                assert_eq!(cells[0].value, "a");
            }
            _ => panic!("expected SparseLong"),
        }
    }
}
