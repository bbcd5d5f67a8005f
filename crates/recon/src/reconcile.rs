use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::{ComparableRecord, KeyResult, ReconOutcome, SideStats};

/// Classify every distinct key across two sources.
///
/// Each side is collapsed to a set first; the first raw value seen for a key
/// is the one displayed. Output is sorted ascending by key and contains each
/// key of the union exactly once.
pub fn reconcile<K: Ord + Clone>(
    a: impl IntoIterator<Item = ComparableRecord<K>>,
    b: impl IntoIterator<Item = ComparableRecord<K>>,
) -> Vec<KeyResult<K>> {
    let left = collapse(a);
    let right = collapse(b);

    let mut results = Vec::with_capacity(left.len().max(right.len()));

    for (key, raw_a) in &left {
        let (value_b, outcome) = match right.get(key) {
            Some(raw_b) => (Some(raw_b.clone()), ReconOutcome::Matched),
            None => (None, ReconOutcome::OnlyInA),
        };
        results.push(KeyResult {
            key: key.clone(),
            value_a: Some(raw_a.clone()),
            value_b,
            outcome,
        });
    }

    for (key, raw_b) in &right {
        if !left.contains_key(key) {
            results.push(KeyResult {
                key: key.clone(),
                value_a: None,
                value_b: Some(raw_b.clone()),
                outcome: ReconOutcome::OnlyInB,
            });
        }
    }

    results.sort_by(|x, y| x.key.cmp(&y.key));
    results
}

fn collapse<K: Ord>(records: impl IntoIterator<Item = ComparableRecord<K>>) -> BTreeMap<K, String> {
    let mut set = BTreeMap::new();
    for r in records {
        set.entry(r.key).or_insert(r.raw);
    }
    set
}

/// Trimmed key, upper-cased when `case_insensitive`. Blank → `None`.
pub fn normalize_id(raw: &str, case_insensitive: bool) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() {
        None
    } else if case_insensitive {
        Some(t.to_uppercase())
    } else {
        Some(t.to_string())
    }
}

/// Identifier records from one column; blanks are dropped.
pub fn id_records<I, S>(values: I, case_insensitive: bool) -> Vec<ComparableRecord<String>>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flatten()
        .filter_map(|v| {
            let raw = v.as_ref().trim();
            normalize_id(raw, case_insensitive).map(|key| ComparableRecord { key, raw: raw.to_string() })
        })
        .collect()
}

/// Date records from one column, displayed with `display` (strftime).
/// Unparseable / empty cells arrive as `None` and are dropped.
pub fn date_records<I>(values: I, display: &str) -> Vec<ComparableRecord<NaiveDate>>
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    values
        .into_iter()
        .flatten()
        .map(|d| ComparableRecord { key: d, raw: d.format(display).to_string() })
        .collect()
}

/// `total_rows` is the source row count; `records` the non-blank subset.
pub fn side_stats<K: Ord>(total_rows: usize, records: &[ComparableRecord<K>]) -> SideStats {
    let distinct: BTreeSet<&K> = records.iter().map(|r| &r.key).collect();
    SideStats {
        total_rows,
        used_rows: records.len(),
        distinct_keys: distinct.len(),
    }
}
