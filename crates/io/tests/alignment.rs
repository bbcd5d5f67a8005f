// Both readers must agree on which rows exist: split checks pair the
// spreadsheet and text rows by position.

use std::path::Path;

use crossval_io::{csv, xlsx};
use crossval_recon::model::SplitOutcome;
use crossval_recon::split::validate_columns;
use crossval_recon::{AlignmentPolicy, SplitColumnRule};
use rust_xlsxwriter::Workbook;

fn ph_rule() -> Vec<SplitColumnRule> {
    vec![SplitColumnRule {
        source_column: "pH".into(),
        primary_column: "pH_raw".into(),
        secondary_column: "pH_lg".into(),
        description: String::new(),
    }]
}

/// pH 7, an all-blank row, then pH 8.
fn write_sdc(path: &Path) {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "Device sample ID").unwrap();
    ws.write_string(0, 1, "pH").unwrap();
    ws.write_string(1, 0, "767010").unwrap();
    ws.write_number(1, 1, 7.0).unwrap();
    ws.write_string(2, 0, " ").unwrap();
    ws.write_string(3, 0, "767011").unwrap();
    ws.write_number(3, 1, 8.0).unwrap();
    wb.save(path).unwrap();
}

#[test]
fn blank_middle_rows_keep_sources_aligned() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx_path = dir.path().join("sdc.xlsx");
    write_sdc(&xlsx_path);
    let csv_path = dir.path().join("bioht.csv");
    std::fs::write(&csv_path, "device_sample_id;pH_raw;pH_lg\n767010;7;\n;;\n767011;8;\n").unwrap();

    let excel = xlsx::read_dataset(&xlsx_path, None).unwrap();
    let text = csv::read_dataset(&csv_path).unwrap();
    assert_eq!(excel.rows.len(), 2);
    assert_eq!(text.rows.len(), 2);

    let results = validate_columns(&ph_rule(), &excel.rows, &text.rows, AlignmentPolicy::Strict).unwrap();
    let got: Vec<_> = results
        .iter()
        .map(|r| (r.row_index, r.excel_value.as_deref(), r.raw_value.as_deref(), r.outcome))
        .collect();
    assert_eq!(
        got,
        vec![
            (0, Some("7"), Some("7"), SplitOutcome::Pass),
            (1, Some("8"), Some("8"), SplitOutcome::Pass),
        ]
    );
}

#[test]
fn comma_only_record_is_not_a_row() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx_path = dir.path().join("sdc.xlsx");
    write_sdc(&xlsx_path);
    let csv_path = dir.path().join("bioht.csv");
    std::fs::write(&csv_path, "device_sample_id,pH_raw,pH_lg\n767010,7,\n,,\n767011,8,\n").unwrap();

    let excel = xlsx::read_dataset(&xlsx_path, None).unwrap();
    let text = csv::read_dataset(&csv_path).unwrap();

    let results = validate_columns(&ph_rule(), &excel.rows, &text.rows, AlignmentPolicy::Truncate).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.outcome == SplitOutcome::Pass));
}
