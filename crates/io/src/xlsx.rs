// Spreadsheet ingestion (xlsx, xls, xlsb, ods)

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use crossval_recon::dates::from_excel_serial;
use crossval_recon::model::{CellValue, Dataset, SourceRow};

use crate::error::IoError;

/// Read one worksheet as a dataset. The first row of the used range is the
/// header row; rows with no non-blank cell are skipped.
///
/// `sheet` selects a worksheet by name (case-insensitive); the first sheet is
/// used when absent.
pub fn read_dataset(path: &Path, sheet: Option<&str>) -> Result<Dataset, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.trim().eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| IoError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names.first().cloned().ok_or_else(|| IoError::Workbook {
            path: path.to_path_buf(),
            message: "workbook contains no sheets".into(),
        })?,
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| IoError::Workbook {
        path: path.to_path_buf(),
        message: format!("failed to read sheet '{sheet_name}': {e}"),
    })?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .map(|c| cell_value(c).as_text().unwrap_or_default())
            .collect(),
        None => Vec::new(),
    };
    if headers.iter().all(String::is_empty) {
        return Err(IoError::NoHeader { path: path.to_path_buf() });
    }

    let mut data = Vec::new();
    for cells in rows {
        let mut fields = HashMap::with_capacity(headers.len());
        let mut blank = true;
        for (header, cell) in headers.iter().zip(cells.iter()) {
            if header.is_empty() {
                continue;
            }
            let value = cell_value(cell);
            blank &= value.is_blank();
            // Duplicate headers: first column wins
            fields.entry(header.clone()).or_insert(value);
        }
        if blank {
            continue;
        }
        data.push(SourceRow { index: data.len(), fields });
    }

    log::info!(
        "read {} data row(s) from {} [{}]",
        data.len(),
        path.display(),
        sheet_name
    );

    Ok(Dataset {
        name: crate::file_name(path),
        headers: headers.into_iter().filter(|h| !h.is_empty()).collect(),
        rows: data,
    })
}

/// Map a calamine cell to the engine's typed cell.
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(t.to_string())
            }
        }
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
        // 1900 date system assumed; calamine does not expose the 1904 flag
        Data::DateTime(dt) => match serial_to_datetime(dt.as_f64()) {
            Some(v) => CellValue::Date(v),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let date = from_excel_serial(serial)?;
    let secs = ((serial.fract() * 86_400.0).round() as u32).min(86_399);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)?;
    Some(date.and_time(time))
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
