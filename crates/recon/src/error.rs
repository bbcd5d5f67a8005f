use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML / JSON parse or deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty rule list, blank column name, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Rule file absent from every search location.
    #[error("could not find {file} in any known location (searched: {})", display_paths(searched))]
    NotFound { file: String, searched: Vec<PathBuf> },

    /// Positional alignment requested on sources with different row counts.
    #[error("cannot align rows by position: excel has {excel_rows} row(s), text has {text_rows}")]
    InputAlignment { excel_rows: usize, text_rows: usize },

    /// Configured column absent from a dataset header.
    #[error("source '{source_name}': missing column '{column}'")]
    MissingColumn { source_name: String, column: String },

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl ReconError {
    /// True for the configuration family: missing, unreadable, or invalid rules.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_) | Self::ConfigValidation(_) | Self::NotFound { .. }
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
