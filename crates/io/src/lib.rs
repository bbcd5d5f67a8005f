// File I/O: source ingestion and report output

pub mod csv;
pub mod error;
pub mod report;
pub mod xlsx;

use std::path::Path;

use crossval_recon::model::{CheckInput, Dataset};

pub use error::IoError;

/// Load both sides of a run. Spreadsheet-like extensions go through calamine,
/// everything else is read as delimited text.
pub fn load_input(excel: &Path, text: &Path, sheet: Option<&str>) -> Result<CheckInput, IoError> {
    Ok(CheckInput {
        excel: read_any(excel, sheet)?,
        text: read_any(text, None)?,
    })
}

/// Dispatch on extension.
pub fn read_any(path: &Path, sheet: Option<&str>) -> Result<Dataset, IoError> {
    if is_spreadsheet(path) {
        xlsx::read_dataset(path, sheet)
    } else {
        csv::read_dataset(path)
    }
}

pub fn is_spreadsheet(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    matches!(ext.as_str(), "xlsx" | "xlsm" | "xls" | "xlsb" | "ods")
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
