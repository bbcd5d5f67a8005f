//! Date coercion for cells of either source.
//!
//! The spreadsheet and the text export disagree on field order: spreadsheet
//! text dates are day-first, text export dates are month-first or ISO.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

use crate::model::CellValue;

/// Spreadsheet text dates. Two-digit years are tried before four-digit ones
/// so `5/3/24` is not read as year 24.
const EXCEL_DATETIME_FORMATS: &[&str] = &["%d/%m/%y %H:%M", "%d/%m/%Y %H:%M"];
const EXCEL_DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%d%m%Y"];

const CSV_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];
const CSV_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Which source a text date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    Excel,
    Csv,
}

/// Parse a spreadsheet text date (`d/M/yy H:mm`, `d/M/yyyy`, `ddMMyyyy`, ...).
pub fn parse_excel_text(s: &str) -> Option<NaiveDate> {
    parse_with(s.trim(), EXCEL_DATE_FORMATS, EXCEL_DATETIME_FORMATS)
}

/// Parse a text export date (`MM/dd/yyyy`, ISO, RFC 3339, ...).
pub fn parse_csv_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    parse_with(s, CSV_DATE_FORMATS, CSV_DATETIME_FORMATS)
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn parse_with(s: &str, date_formats: &[&str], datetime_formats: &[&str]) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    date_formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            datetime_formats
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Excel 1900-system serial number to a date. The fractional part is the
/// time of day and is dropped.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Day 60 is the phantom 1900-02-29; serials above it are offset by one.
    let days = serial.trunc() as u64;
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_days(Days::new(days))
}

/// Calendar date of a cell: typed dates directly, numbers as Excel serials,
/// text through the parser for `style`.
pub fn cell_date(cell: &CellValue, style: DateStyle) -> Option<NaiveDate> {
    match cell {
        CellValue::Empty => None,
        CellValue::Date(dt) => Some(dt.date()),
        CellValue::Number(n) => from_excel_serial(*n),
        CellValue::Text(s) => match style {
            DateStyle::Excel => parse_excel_text(s),
            DateStyle::Csv => parse_csv_text(s),
        },
    }
}
