// Copyright (c) 2026 MarkQL Contributors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `COUNT(*)`, `SUMMARIZE(*)`, and `TFIDF(...)` over a set of matched
//! node ids. Kept separate from `node_path.rs` so the fast `COUNT(*)`
//! path (no `text`/`inner_html` materialization) is visibly isolated from
//! the heavier per-node text work `SUMMARIZE`/`TFIDF` both need.

use std::collections::BTreeMap;

use markql_functions::Value;
use markql_ir::{SelectItem, TfidfStopwords};

use crate::domfn::TreeIndex;
use crate::result::ResultRow;

/// `COUNT(*)`/`COUNT(tag)`: the candidate-selection step has already
/// applied the tag restriction (if any) and `WHERE`, so this is just
/// `matches.len()` — no node field is read.
pub fn count(matches: &[u32]) -> ResultRow {
    let mut row = ResultRow::default();
    row.computed_fields.insert("count".to_string(), Value::Number(matches.len() as i64));
    row
}

/// `SUMMARIZE(*)`: one row per distinct tag among the matches, ordered by
/// `count DESC, tag ASC` unless the caller's `ORDER BY` overrides it
/// downstream.
pub fn summarize(tree: &TreeIndex, matches: &[u32]) -> Vec<ResultRow> {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for &id in matches {
        *counts.entry(tree.node(id).tag.clone()).or_insert(0) += 1;
    }
    let mut rows: Vec<(String, i64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.into_iter()
        .map(|(tag, count)| {
            let mut row = ResultRow::default();
            row.computed_fields.insert("tag".to_string(), Value::text(tag));
            row.computed_fields.insert("count".to_string(), Value::Number(count));
            row
        })
        .collect()
}

/// Fixed, crate-local English stopword list used by `TFIDF` unless
/// `STOPWORDS=NONE` is given. Committed rather than computed so a
/// snapshot test catches accidental edits.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it", "no", "not", "of",
    "on", "or", "such", "that", "the", "their", "then", "there", "these", "they", "this", "to", "was", "will", "with",
    "from", "has", "have", "had", "he", "her", "him", "his", "i", "its", "me", "my", "our", "she", "them", "we",
    "what", "when", "which", "who", "why", "you", "your",
];

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_lowercase())
        .collect()
}

/// `TFIDF(tags…, TOP_TERMS=k, MIN_DF=m, MAX_DF=M, STOPWORDS=…)`: one row
/// per matched node, carrying its top-k scored terms in
/// [`ResultRow::term_scores`]. Scores use the standard smoothed
/// `tf * ln(N / df)` weighting; document frequency is computed over the
/// whole matched set, not a global corpus.
pub fn tfidf(tree: &TreeIndex, matches: &[u32], item: &SelectItem) -> Vec<ResultRow> {
    let stop: &[&str] = match item.tfidf_stopwords {
        TfidfStopwords::English => ENGLISH_STOPWORDS,
        TfidfStopwords::None => &[],
    };

    let doc_terms: Vec<Vec<String>> = matches
        .iter()
        .map(|&id| {
            tokenize(&tree.direct_text(id))
                .into_iter()
                .filter(|t| !stop.iter().any(|s| s.eq_ignore_ascii_case(t)))
                .collect()
        })
        .collect();

    let n = doc_terms.len().max(1) as f64;
    let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
    for terms in &doc_terms {
        let mut seen = std::collections::BTreeSet::new();
        for t in terms {
            if seen.insert(t.clone()) {
                *doc_freq.entry(t.clone()).or_insert(0) += 1;
            }
        }
    }

    matches
        .iter()
        .zip(doc_terms.iter())
        .map(|(&id, terms)| {
            let mut tf: BTreeMap<String, usize> = BTreeMap::new();
            for t in terms {
                *tf.entry(t.clone()).or_insert(0) += 1;
            }
            let mut scored: Vec<(String, f64)> = tf
                .into_iter()
                .filter_map(|(term, freq)| {
                    let df = *doc_freq.get(&term).unwrap_or(&0);
                    if df < item.tfidf_min_df.max(1) {
                        return None;
                    }
                    if item.tfidf_max_df > 0 && df > item.tfidf_max_df {
                        return None;
                    }
                    let idf = (n / df.max(1) as f64).ln().max(0.0);
                    Some((term, freq as f64 * idf))
                })
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
            scored.truncate(item.tfidf_top_terms.max(1));

            let mut row = ResultRow::from_node(tree.node(id), tree.doc.source_uri.as_deref());
            for (term, score) in scored {
                row.term_scores.insert(term, score);
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use markql_html::parse_html;
    use std::rc::Rc;

    #[test]
    fn english_stopwords_list_is_stable() {
        assert_eq!(ENGLISH_STOPWORDS.len(), 56);
        assert!(ENGLISH_STOPWORDS.contains(&"the"));
        assert!(ENGLISH_STOPWORDS.contains(&"and"));
        assert!(!ENGLISH_STOPWORDS.contains(&"widget"));
    }

    #[test]
    fn count_reports_match_len_without_reading_nodes() {
        let row = count(&[1, 2, 3]);
        assert_eq!(row.computed_fields["count"], Value::Number(3));
    }

    #[test]
    fn summarize_orders_by_count_desc_then_tag_asc() {
        let doc = parse_html("<div></div><div></div><span></span>");
        let ids: Vec<u32> = doc.nodes.iter().map(|n| n.id).collect();
        let tree = TreeIndex::new(Rc::new(doc));
        let rows = summarize(&tree, &ids);
        assert_eq!(rows[0].computed_fields["tag"], Value::text("div"));
        assert_eq!(rows[0].computed_fields["count"], Value::Number(2));
        assert_eq!(rows[1].computed_fields["tag"], Value::text("span"));
    }

    #[test]
    fn tfidf_scores_rarer_terms_higher() {
        let doc = parse_html("<p>apple apple banana</p><p>apple cherry cherry</p>");
        let ids: Vec<u32> = doc.nodes.iter().map(|n| n.id).collect();
        let tree = TreeIndex::new(Rc::new(doc));
        let item = SelectItem::tag_only("p", markql_ir::Span::new(0, 0));
        let rows = tfidf(&tree, &ids, &item);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].term_scores.contains_key("banana") || rows[0].term_scores.contains_key("apple"));
    }
}
