use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Typed cell value produced by ingestion. The engine never sees raw
/// spreadsheet cell kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Trimmed display text, `None` for empty cells and blank text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            }
            Self::Number(n) => {
                // Integers without decimals
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{n}"))
                }
            }
            Self::Date(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 {
                    Some(dt.date().format("%Y-%m-%d").to_string())
                } else {
                    Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

impl CellValue {
    /// Text cell from a raw field, `Empty` when blank after trimming.
    pub fn from_trimmed(s: &str) -> Self {
        Self::from(s.trim())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

/// One logical record from either source. `index` is the 0-based data row
/// position (header excluded).
#[derive(Debug, Clone, Default)]
pub struct SourceRow {
    pub index: usize,
    pub fields: HashMap<String, CellValue>,
}

impl SourceRow {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Trimmed, non-blank text of `column`.
    pub fn text(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(CellValue::as_text)
    }
}

/// A fully materialized dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl Dataset {
    /// Header matching `column`, ignoring case and surrounding whitespace.
    pub fn column(&self, column: &str) -> Option<&str> {
        let wanted = column.trim();
        self.headers
            .iter()
            .find(|h| h.trim().eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }
}

/// Both sides of one run.
#[derive(Debug, Clone)]
pub struct CheckInput {
    pub excel: Dataset,
    pub text: Dataset,
}

/// A normalized comparison unit: `key` drives equality, `raw` is kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparableRecord<K> {
    pub key: K,
    pub raw: String,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconOutcome {
    Matched,
    OnlyInA,
    OnlyInB,
}

impl ReconOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::OnlyInA => "ONLY_IN_A",
            Self::OnlyInB => "ONLY_IN_B",
        }
    }

    /// Report text. `noun` is the compared field ("Date", "ID").
    pub fn label(&self, noun: &str) -> String {
        match self {
            Self::Matched => format!("{noun} present in both xlsx and csv and it matches"),
            Self::OnlyInA => "Present in xlsx only".to_string(),
            Self::OnlyInB => "Present in csv only".to_string(),
        }
    }

    /// Swap sides.
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Matched => Self::Matched,
            Self::OnlyInA => Self::OnlyInB,
            Self::OnlyInB => Self::OnlyInA,
        }
    }
}

impl std::fmt::Display for ReconOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitOutcome {
    Pass,
    RawMismatch,
    LgMismatch,
    AdditionalValue,
}

impl SplitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::RawMismatch => "RAW_MISMATCH",
            Self::LgMismatch => "LG_MISMATCH",
            Self::AdditionalValue => "ADDITIONAL_VALUE",
        }
    }
}

impl std::fmt::Display for SplitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityOutcome {
    Pass,
    Fail,
    MissingEntity,
    Ignored,
}

impl EntityOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::MissingEntity => "MISSING_ENTITY",
            Self::Ignored => "IGNORED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::MissingEntity => "MISSING ENTITY",
            Self::Ignored => "IGNORED (no rule)",
        }
    }
}

impl std::fmt::Display for EntityOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One distinct key of a two-source reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyResult<K> {
    pub key: K,
    pub value_a: Option<String>,
    pub value_b: Option<String>,
    pub outcome: ReconOutcome,
}

/// One (rule, row) pair of the split-column check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitResult {
    pub row_index: usize,
    pub column: String,
    pub excel_value: Option<String>,
    pub raw_value: Option<String>,
    pub lg_value: Option<String>,
    pub outcome: SplitOutcome,
}

/// One text-dataset row of the device→entity check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityResult {
    pub row_index: usize,
    pub device_id: Option<String>,
    pub entity_id: Option<String>,
    pub expected: Option<String>,
    pub outcome: EntityOutcome,
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Row/key counts for one side of a key reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideStats {
    pub total_rows: usize,
    pub used_rows: usize,
    pub distinct_keys: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub total: usize,
    pub with_rule: usize,
    pub pass: usize,
    pub fail: usize,
    pub missing_entity: usize,
    pub ignored: usize,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct KeyAxis<K> {
    pub results: Vec<KeyResult<K>>,
    pub stats_a: SideStats,
    pub stats_b: SideStats,
    pub outcome_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityAxis {
    pub results: Vec<EntityResult>,
    pub counts: EntityCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitAxis {
    pub results: Vec<SplitResult>,
    pub outcome_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub date_display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub meta: ReportMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<KeyAxis<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_ids: Option<KeyAxis<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntityAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splits: Option<SplitAxis>,
}

impl CheckReport {
    /// Number of result rows whose outcome is not a pass/match.
    /// Ignored entity rows are not failures.
    pub fn failure_count(&self) -> usize {
        let mut n = 0;
        if let Some(ref axis) = self.dates {
            n += axis.results.iter().filter(|r| r.outcome != ReconOutcome::Matched).count();
        }
        if let Some(ref axis) = self.device_ids {
            n += axis.results.iter().filter(|r| r.outcome != ReconOutcome::Matched).count();
        }
        if let Some(ref axis) = self.entities {
            n += axis.counts.fail + axis.counts.missing_entity;
        }
        if let Some(ref axis) = self.splits {
            n += axis.results.iter().filter(|r| r.outcome != SplitOutcome::Pass).count();
        }
        n
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_text_drops_integral_fraction() {
        assert_eq!(CellValue::Number(12.0).as_text().as_deref(), Some("12"));
        assert_eq!(CellValue::Number(12.5).as_text().as_deref(), Some("12.5"));
    }

    #[test]
    fn blank_text_is_absent() {
        assert!(CellValue::Text("   ".into()).is_blank());
        assert!(CellValue::Empty.is_blank());
        assert_eq!(CellValue::Text("  A-1 ".into()).as_text().as_deref(), Some("A-1"));
    }

    #[test]
    fn midnight_dates_render_without_time() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let midnight = CellValue::Date(d.and_hms_opt(0, 0, 0).unwrap());
        let later = CellValue::Date(d.and_hms_opt(9, 30, 0).unwrap());
        assert_eq!(midnight.as_text().as_deref(), Some("2025-03-04"));
        assert_eq!(later.as_text().as_deref(), Some("2025-03-04 09:30:00"));
    }

    #[test]
    fn column_lookup_ignores_case_and_padding() {
        let ds = Dataset {
            name: "t".into(),
            headers: vec!["Device sample ID".into(), " created_on ".into()],
            rows: vec![],
        };
        assert_eq!(ds.column("device sample id"), Some("Device sample ID"));
        assert_eq!(ds.column("CREATED_ON"), Some(" created_on "));
        assert_eq!(ds.column("entity"), None);
    }

    #[test]
    fn mirrored_swaps_only_sides() {
        assert_eq!(ReconOutcome::Matched.mirrored(), ReconOutcome::Matched);
        assert_eq!(ReconOutcome::OnlyInA.mirrored(), ReconOutcome::OnlyInB);
        assert_eq!(ReconOutcome::OnlyInB.mirrored(), ReconOutcome::OnlyInA);
    }

    #[test]
    fn outcome_serializes_screaming() {
        let json = serde_json::to_string(&EntityOutcome::MissingEntity).unwrap();
        assert_eq!(json, "\"MISSING_ENTITY\"");
        let json = serde_json::to_string(&ReconOutcome::OnlyInA).unwrap();
        assert_eq!(json, "\"ONLY_IN_A\"");
    }
}
