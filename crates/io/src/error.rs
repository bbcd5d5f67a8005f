use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to open workbook {}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("sheet '{sheet}' not found in {} (available: {})", path.display(), available.join(", "))]
    SheetNotFound { path: PathBuf, sheet: String, available: Vec<String> },

    /// First row missing or entirely blank.
    #[error("{} has no header row", path.display())]
    NoHeader { path: PathBuf },

    #[error("malformed CSV in {}: {message}", path.display())]
    Csv { path: PathBuf, message: String },

    #[error("failed to write report {}: {message}", path.display())]
    Report { path: PathBuf, message: String },
}
