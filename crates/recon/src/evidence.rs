use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{KeyAxis, SideStats, SplitAxis};

/// Occurrences per outcome name.
pub fn compute_summary<I, T>(outcomes: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for o in outcomes {
        *counts.entry(o.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Rows of the "Date Counts" sheet.
pub fn date_metrics(axis: &KeyAxis<NaiveDate>) -> Vec<(String, usize)> {
    let mut out = side_metrics("excel", "dates", &axis.stats_a, "_rows");
    out.extend(side_metrics("csv", "dates", &axis.stats_b, "_rows"));
    out
}

/// Rows of the "ID Counts" sheet.
pub fn id_metrics(axis: &KeyAxis<String>) -> Vec<(String, usize)> {
    let mut out = side_metrics("excel_id", "", &axis.stats_a, "");
    out.extend(side_metrics("csv_id", "", &axis.stats_b, ""));
    out
}

fn side_metrics(prefix: &str, noun: &str, s: &SideStats, suffix: &str) -> Vec<(String, usize)> {
    let distinct = if noun.is_empty() {
        format!("{prefix}_distinct")
    } else {
        format!("{prefix}_distinct_{noun}")
    };
    vec![
        (format!("{prefix}_total{suffix}"), s.total_rows),
        (format!("{prefix}_used{suffix}"), s.used_rows),
        (distinct, s.distinct_keys),
    ]
}

/// One-line summary for a key axis, e.g. `12 keys: 10 matched, 1 only in xlsx, 1 only in csv`.
pub fn describe_key_axis<K>(axis: &KeyAxis<K>) -> String {
    let get = |k: &str| axis.outcome_counts.get(k).copied().unwrap_or(0);
    format!(
        "{} keys: {} matched, {} only in xlsx, {} only in csv",
        axis.results.len(),
        get("MATCHED"),
        get("ONLY_IN_A"),
        get("ONLY_IN_B"),
    )
}

pub fn describe_split_axis(axis: &SplitAxis) -> String {
    let parts: Vec<String> = axis
        .outcome_counts
        .iter()
        .map(|(k, v)| format!("{v} {}", k.to_lowercase()))
        .collect();
    if parts.is_empty() {
        "0 checks".to_string()
    } else {
        format!("{} checks: {}", axis.results.len(), parts.join(", "))
    }
}
