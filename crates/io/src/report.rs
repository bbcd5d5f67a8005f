// XLSX validation report

use std::path::Path;

use crossval_recon::evidence::{date_metrics, id_metrics};
use crossval_recon::model::{
    CheckReport, EntityAxis, EntityOutcome, KeyAxis, ReconOutcome, SplitAxis, SplitOutcome,
};
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet, XlsxError};

use crate::error::IoError;

pub const DATE_MATCH_SHEET: &str = "Date Match";
pub const DATE_COUNTS_SHEET: &str = "Date Counts";
pub const ID_MATCH_SHEET: &str = "Device ID Match";
pub const ID_COUNTS_SHEET: &str = "ID Counts";
pub const ENTITY_SHEET: &str = "Device→Entity Report";
pub const ENTITY_COUNTS_SHEET: &str = "Entity Counts";
pub const SPLIT_SHEET: &str = "Column Split Validation";

/// What was written.
#[derive(Debug, Default, Clone)]
pub struct ReportSummary {
    pub sheets: Vec<String>,
    pub rows_written: usize,
}

struct Styles {
    header: Format,
    green: Format,
    red: Format,
    yellow: Format,
}

impl Styles {
    fn new() -> Self {
        let fill = |c: u32| Format::new().set_pattern(FormatPattern::Solid).set_background_color(Color::RGB(c));
        Self {
            header: Format::new().set_bold(),
            green: fill(0x00FF00),
            red: fill(0xFF0000).set_font_color(Color::White),
            yellow: fill(0xFFFF99),
        }
    }
}

/// Write every axis present in `report` to an XLSX workbook at `path`.
/// An existing file is replaced; missing parent directories are created.
pub fn write_workbook(report: &CheckReport, path: &Path) -> Result<ReportSummary, IoError> {
    let report_err = |message: String| IoError::Report { path: path.to_path_buf(), message };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| report_err(e.to_string()))?;
    }

    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let mut summary = ReportSummary::default();

    build_sheets(&mut workbook, report, &styles, &mut summary).map_err(|e| report_err(e.to_string()))?;
    if summary.sheets.is_empty() {
        return Err(report_err("report contains no results".into()));
    }

    workbook.save(path).map_err(|e| report_err(e.to_string()))?;
    log::info!("wrote {} sheet(s) to {}", summary.sheets.len(), path.display());
    Ok(summary)
}

fn build_sheets(
    workbook: &mut Workbook,
    report: &CheckReport,
    styles: &Styles,
    summary: &mut ReportSummary,
) -> Result<(), XlsxError> {
    if let Some(ref axis) = report.dates {
        let ws = add_sheet(workbook, DATE_MATCH_SHEET, summary)?;
        summary.rows_written += write_key_sheet(ws, axis, ["Measurement date", "created_on"], "Date", styles)?;
        let ws = add_sheet(workbook, DATE_COUNTS_SHEET, summary)?;
        write_counts_sheet(ws, &date_metrics(axis), styles)?;
    }
    if let Some(ref axis) = report.device_ids {
        let ws = add_sheet(workbook, ID_MATCH_SHEET, summary)?;
        summary.rows_written +=
            write_key_sheet(ws, axis, ["device_sample_id_excel", "device_sample_id_csv"], "ID", styles)?;
        let ws = add_sheet(workbook, ID_COUNTS_SHEET, summary)?;
        write_counts_sheet(ws, &id_metrics(axis), styles)?;
    }
    if let Some(ref axis) = report.entities {
        let ws = add_sheet(workbook, ENTITY_SHEET, summary)?;
        summary.rows_written += write_entity_sheet(ws, axis, styles)?;
        let ws = add_sheet(workbook, ENTITY_COUNTS_SHEET, summary)?;
        let metrics: Vec<(String, usize)> =
            axis.counts.metrics().into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        write_counts_sheet(ws, &metrics, styles)?;
    }
    if let Some(ref axis) = report.splits {
        let ws = add_sheet(workbook, SPLIT_SHEET, summary)?;
        summary.rows_written += write_split_sheet(ws, axis, styles)?;
    }
    Ok(())
}

fn add_sheet<'a>(
    workbook: &'a mut Workbook,
    name: &str,
    summary: &mut ReportSummary,
) -> Result<&'a mut Worksheet, XlsxError> {
    summary.sheets.push(name.to_string());
    let ws = workbook.add_worksheet();
    ws.set_name(name)?;
    Ok(ws)
}

fn write_header(ws: &mut Worksheet, labels: &[&str], styles: &Styles) -> Result<(), XlsxError> {
    for (col, label) in labels.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *label, &styles.header)?;
    }
    Ok(())
}

/// Optional text cell. With a format, an absent value becomes a formatted blank.
fn write_opt(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match (value, format) {
        (Some(v), Some(f)) => ws.write_string_with_format(row, col, v, f).map(|_| ()),
        (Some(v), None) => ws.write_string(row, col, v).map(|_| ()),
        (None, Some(f)) => ws.write_blank(row, col, f).map(|_| ()),
        (None, None) => Ok(()),
    }
}

/// Side columns hold each source's own display value; a missing side is a
/// red blank.
fn write_key_sheet<K>(
    ws: &mut Worksheet,
    axis: &KeyAxis<K>,
    side_labels: [&str; 2],
    noun: &str,
    styles: &Styles,
) -> Result<usize, XlsxError> {
    write_header(ws, &[side_labels[0], side_labels[1], "result"], styles)?;

    for (i, r) in axis.results.iter().enumerate() {
        let row = i as u32 + 1;
        let a = r.value_a.as_deref();
        let b = r.value_b.as_deref();
        write_opt(ws, row, 0, a, a.is_none().then_some(&styles.red))?;
        write_opt(ws, row, 1, b, b.is_none().then_some(&styles.red))?;
        let fill = match r.outcome {
            ReconOutcome::Matched => &styles.green,
            ReconOutcome::OnlyInA | ReconOutcome::OnlyInB => &styles.red,
        };
        ws.write_string_with_format(row, 2, r.outcome.label(noun), fill)?;
    }

    ws.autofit();
    Ok(axis.results.len())
}

fn write_entity_sheet(ws: &mut Worksheet, axis: &EntityAxis, styles: &Styles) -> Result<usize, XlsxError> {
    write_header(ws, &["device_sample_id", "entity_id", "expected_entity", "status"], styles)?;

    for (i, r) in axis.results.iter().enumerate() {
        let row = i as u32 + 1;
        let status_fill = match r.outcome {
            EntityOutcome::Pass => &styles.green,
            EntityOutcome::Ignored => &styles.yellow,
            EntityOutcome::Fail | EntityOutcome::MissingEntity => &styles.red,
        };
        let entity_fill = (r.outcome == EntityOutcome::MissingEntity).then_some(&styles.red);

        write_opt(ws, row, 0, r.device_id.as_deref(), None)?;
        write_opt(ws, row, 1, r.entity_id.as_deref(), entity_fill)?;
        write_opt(ws, row, 2, r.expected.as_deref(), None)?;
        ws.write_string_with_format(row, 3, r.outcome.label(), status_fill)?;
    }

    ws.autofit();
    Ok(axis.results.len())
}

fn write_split_sheet(ws: &mut Worksheet, axis: &SplitAxis, styles: &Styles) -> Result<usize, XlsxError> {
    write_header(ws, &["row", "column", "excel_value", "raw_value", "lg_value", "status"], styles)?;

    for (i, r) in axis.results.iter().enumerate() {
        let row = i as u32 + 1;
        let fill = match r.outcome {
            SplitOutcome::Pass => &styles.green,
            SplitOutcome::AdditionalValue => &styles.yellow,
            SplitOutcome::RawMismatch | SplitOutcome::LgMismatch => &styles.red,
        };
        // 1-based data row number, header excluded
        ws.write_number(row, 0, (r.row_index + 1) as f64)?;
        ws.write_string(row, 1, &r.column)?;
        write_opt(ws, row, 2, r.excel_value.as_deref(), None)?;
        write_opt(ws, row, 3, r.raw_value.as_deref(), None)?;
        write_opt(ws, row, 4, r.lg_value.as_deref(), None)?;
        ws.write_string_with_format(row, 5, r.outcome.as_str(), fill)?;
    }

    ws.autofit();
    Ok(axis.results.len())
}

fn write_counts_sheet(ws: &mut Worksheet, metrics: &[(String, usize)], styles: &Styles) -> Result<(), XlsxError> {
    write_header(ws, &["metric", "value"], styles)?;
    for (i, (name, value)) in metrics.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, name)?;
        ws.write_number(row, 1, *value as f64)?;
    }
    ws.autofit();
    Ok(())
}
