//! `crossval run | validate | rules`: config loading, source ingestion,
//! engine run and output.

use std::path::{Path, PathBuf};

use crossval_io::report;
use crossval_recon::config::{default_search_dirs, CheckConfig};
use crossval_recon::evidence::{describe_key_axis, describe_split_axis};
use crossval_recon::model::CheckReport;
use crossval_recon::{run_steps, Step};

use crate::exit_codes::{EXIT_CHECK_INVALID_CONFIG, EXIT_CHECK_MISMATCH};
use crate::CliError;

/// Report file name used when only `--output-dir` is given.
pub const DEFAULT_REPORT_NAME: &str = "validation_results.xlsx";

pub struct RunArgs {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub only: Vec<Step>,
}

/// Read, parse, resolve rule files, validate. Returns the config and the
/// directory that relative source paths are resolved against.
fn load_config(path: &Path) -> Result<(CheckConfig, PathBuf), CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::runtime(format!("cannot read config {}: {e}", path.display())))?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let mut config = CheckConfig::from_toml(&text)?;
    config.resolve_rule_files(&default_search_dirs(&base_dir))?;
    config.validate()?;
    log::debug!(
        "config '{}': {} prefix rule(s), {} split rule(s)",
        config.name,
        config.rules.prefix_rules().len(),
        config.rules.split_rules().len()
    );
    Ok((config, base_dir))
}

fn source_path(base_dir: &Path, configured: Option<&str>, field: &str) -> Result<PathBuf, CliError> {
    let name = configured
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CliError::new(EXIT_CHECK_INVALID_CONFIG, format!("sources.{field} is not set"))
                .with_hint("add a [sources] table naming the xlsx and text exports")
        })?;
    Ok(base_dir.join(name))
}

/// `--report` wins; a relative `--report` lands under `--output-dir`.
/// `--output-dir` alone writes the default report name there.
pub fn report_path(report: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    match (report, output_dir) {
        (Some(r), Some(dir)) if r.is_relative() => Some(dir.join(r)),
        (Some(r), _) => Some(r.to_path_buf()),
        (None, Some(dir)) => Some(dir.join(DEFAULT_REPORT_NAME)),
        (None, None) => None,
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (config, base_dir) = load_config(&args.config)?;

    let excel_path = source_path(&base_dir, config.sources.excel.as_deref(), "excel")?;
    let text_path = source_path(&base_dir, config.sources.text.as_deref(), "text")?;
    let input = crossval_io::load_input(&excel_path, &text_path, config.sources.sheet.as_deref())?;

    let steps: &[Step] = if args.only.is_empty() { &Step::ALL } else { &args.only };
    let result = run_steps(&config, &input, steps)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(path) = report_path(args.report.as_deref(), args.output_dir.as_deref()) {
        let written = report::write_workbook(&result, &path)?;
        eprintln!("wrote {} ({} sheets, {} rows)", path.display(), written.sheets.len(), written.rows_written);
    }

    if args.json {
        println!("{json_str}");
    }

    // Human summary to stderr
    for line in summary_lines(&result, &input.excel.name, &input.text.name) {
        eprintln!("{line}");
    }

    let failures = result.failure_count();
    if failures > 0 {
        return Err(CliError::new(EXIT_CHECK_MISMATCH, format!("{failures} non-passing result(s)")));
    }
    Ok(())
}

pub fn summary_lines(result: &CheckReport, excel_name: &str, text_name: &str) -> Vec<String> {
    let mut lines = vec![format!("{}: {excel_name} vs {text_name}", result.meta.config_name)];
    if let Some(ref axis) = result.dates {
        lines.push(format!("dates:    {}", describe_key_axis(axis)));
    }
    if let Some(ref axis) = result.device_ids {
        lines.push(format!("ids:      {}", describe_key_axis(axis)));
    }
    if let Some(ref axis) = result.entities {
        let c = &axis.counts;
        lines.push(format!(
            "entities: {} rows: {} pass, {} fail, {} missing entity, {} ignored",
            c.total, c.pass, c.fail, c.missing_entity, c.ignored
        ));
    }
    if let Some(ref axis) = result.splits {
        lines.push(format!("splits:   {}", describe_split_axis(axis)));
    }
    lines
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, _) = load_config(&config_path)?;
    eprintln!(
        "{}: valid ({} prefix rules, {} split rules)",
        config.name,
        config.rules.prefix_rules().len(),
        config.rules.split_rules().len()
    );
    Ok(())
}

pub fn cmd_rules(config_path: PathBuf, json: bool) -> Result<(), CliError> {
    let (config, _) = load_config(&config_path)?;
    if json {
        let value = serde_json::json!({
            "prefix_rules": config.rules.prefix_rules(),
            "split_rules": config.rules.split_rules(),
        });
        let out = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        print!("{}", config.rules.mappings_summary());
        println!();
        print!("{}", config.rules.validations_summary());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_resolution() {
        let dir = Path::new("out");
        assert_eq!(report_path(None, None), None);
        assert_eq!(report_path(None, Some(dir)), Some(PathBuf::from("out/validation_results.xlsx")));
        assert_eq!(
            report_path(Some(Path::new("r.xlsx")), Some(dir)),
            Some(PathBuf::from("out/r.xlsx"))
        );
        assert_eq!(report_path(Some(Path::new("r.xlsx")), None), Some(PathBuf::from("r.xlsx")));
    }

    #[test]
    fn blank_source_is_config_error() {
        let err = source_path(Path::new("."), Some("  "), "excel").unwrap_err();
        assert_eq!(err.code, EXIT_CHECK_INVALID_CONFIG);
        assert!(err.message.contains("sources.excel"));
    }
}
