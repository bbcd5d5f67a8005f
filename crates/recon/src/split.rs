use crate::config::{AlignmentPolicy, SplitColumnRule};
use crate::error::ReconError;
use crate::model::{SourceRow, SplitOutcome, SplitResult};

/// Classify one split column value triple. Branch order is significant.
///
/// * spreadsheet blank, raw filled → `AdditionalValue`
/// * raw differs from the spreadsheet value (trimmed) → `RawMismatch`
/// * spreadsheet value has anything besides digits and `.` → lg must hold the
///   whole value; otherwise lg must be blank
pub fn classify(excel: Option<&str>, raw: Option<&str>, lg: Option<&str>) -> SplitOutcome {
    let excel = excel.map(str::trim).unwrap_or("");
    let raw = raw.map(str::trim).unwrap_or("");
    let lg = lg.map(str::trim).unwrap_or("");

    if excel.is_empty() {
        return if raw.is_empty() {
            SplitOutcome::Pass
        } else {
            SplitOutcome::AdditionalValue
        };
    }

    if excel != raw {
        return SplitOutcome::RawMismatch;
    }

    let lg_ok = if has_special_chars(excel) {
        lg == excel
    } else {
        lg.is_empty()
    };

    if lg_ok {
        SplitOutcome::Pass
    } else {
        SplitOutcome::LgMismatch
    }
}

fn has_special_chars(value: &str) -> bool {
    value.chars().any(|c| !(c.is_ascii_digit() || c == '.'))
}

/// Run every split rule over positionally aligned rows.
///
/// Row N of the spreadsheet is compared with row N of the text export; there
/// is no key join, so both exports must preserve the same record order.
/// Results are grouped by rule (config order), then by row.
pub fn validate_columns(
    rules: &[SplitColumnRule],
    excel_rows: &[SourceRow],
    text_rows: &[SourceRow],
    policy: AlignmentPolicy,
) -> Result<Vec<SplitResult>, ReconError> {
    let rows = aligned_len(excel_rows.len(), text_rows.len(), policy)?;
    let mut results = Vec::with_capacity(rules.len() * rows);

    for rule in rules {
        for (excel_row, text_row) in excel_rows.iter().zip(text_rows).take(rows) {
            let excel_value = excel_row.text(&rule.source_column);
            let raw_value = text_row.text(&rule.primary_column);
            let lg_value = text_row.text(&rule.secondary_column);
            let outcome = classify(excel_value.as_deref(), raw_value.as_deref(), lg_value.as_deref());

            results.push(SplitResult {
                row_index: excel_row.index,
                column: rule.source_column.clone(),
                excel_value,
                raw_value,
                lg_value,
                outcome,
            });
        }
    }

    Ok(results)
}

fn aligned_len(excel_rows: usize, text_rows: usize, policy: AlignmentPolicy) -> Result<usize, ReconError> {
    if excel_rows == text_rows {
        return Ok(excel_rows);
    }
    match policy {
        AlignmentPolicy::Strict => Err(ReconError::InputAlignment { excel_rows, text_rows }),
        AlignmentPolicy::Truncate => {
            let rows = excel_rows.min(text_rows);
            log::warn!(
                "split columns: row counts differ (excel={excel_rows}, text={text_rows}); \
                 classifying the first {rows} row(s) only"
            );
            Ok(rows)
        }
    }
}
