//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts and CI jobs gate on them, so they do not change once published.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success, every axis clean                                 |
//! | 1    | Check completed and found at least one non-pass outcome   |
//! | 2    | CLI usage error (bad args)                                |
//! | 3    | Invalid config or rule files, configured column missing   |
//! | 4    | Sources cannot be aligned row-by-row                      |
//! | 5    | Runtime failure: unreadable input, report write failure   |

use crossval_io::IoError;
use crossval_recon::ReconError;

/// Success - command completed and nothing to report.
pub const EXIT_SUCCESS: u8 = 0;

/// The run finished but some outcome is not a pass/match.
/// Like `diff(1)`, exit 1 means "sources differ."
pub const EXIT_CHECK_MISMATCH: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with the same code for its own parse errors.
pub const EXIT_USAGE: u8 = 2;

/// Config did not parse or validate, a rule file is missing, or a
/// configured column is absent from a source header.
pub const EXIT_CHECK_INVALID_CONFIG: u8 = 3;

/// Positional split checks on sources with different row counts under the
/// strict alignment policy.
pub const EXIT_CHECK_ALIGNMENT: u8 = 4;

/// I/O failure reading sources or writing outputs.
pub const EXIT_CHECK_RUNTIME: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::InputAlignment { .. } => EXIT_CHECK_ALIGNMENT,
        ReconError::MissingColumn { .. } => EXIT_CHECK_INVALID_CONFIG,
        ReconError::Io(_) => EXIT_CHECK_RUNTIME,
        e if e.is_config() => EXIT_CHECK_INVALID_CONFIG,
        _ => EXIT_CHECK_RUNTIME,
    }
}

/// Every ingestion/report error is a runtime failure.
pub fn io_exit_code(_err: &IoError) -> u8 {
    EXIT_CHECK_RUNTIME
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_CHECK_MISMATCH,
            EXIT_USAGE,
            EXIT_CHECK_INVALID_CONFIG,
            EXIT_CHECK_ALIGNMENT,
            EXIT_CHECK_RUNTIME,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn recon_errors_map_by_family() {
        assert_eq!(
            recon_exit_code(&ReconError::ConfigParse("bad".into())),
            EXIT_CHECK_INVALID_CONFIG
        );
        assert_eq!(
            recon_exit_code(&ReconError::NotFound { file: "x.json".into(), searched: vec![] }),
            EXIT_CHECK_INVALID_CONFIG
        );
        assert_eq!(
            recon_exit_code(&ReconError::MissingColumn {
                source_name: "a.csv".into(),
                column: "entity".into()
            }),
            EXIT_CHECK_INVALID_CONFIG
        );
        assert_eq!(
            recon_exit_code(&ReconError::InputAlignment { excel_rows: 1, text_rows: 2 }),
            EXIT_CHECK_ALIGNMENT
        );
        assert_eq!(recon_exit_code(&ReconError::Io("disk".into())), EXIT_CHECK_RUNTIME);
    }

    #[test]
    fn io_errors_are_runtime() {
        let err = IoError::NoHeader { path: PathBuf::from("empty.csv") };
        assert_eq!(io_exit_code(&err), EXIT_CHECK_RUNTIME);
    }
}
