// crossval CLI - cross-validate a spreadsheet export against a text export

mod check;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crossval_io::IoError;
use crossval_recon::{ReconError, Step};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exit_codes::{io_exit_code, recon_exit_code, EXIT_CHECK_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "crossval")]
#[command(about = "Cross-validate a spreadsheet export against a delimited text export")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checks described by a TOML config file
    #[command(after_help = "\
Examples:
  crossval run ccpd013.toml
  crossval run ccpd013.toml --json
  crossval run ccpd013.toml --output result.json --report out/validation.xlsx
  crossval run ccpd013.toml --output-dir out
  crossval run ccpd013.toml --only dates,ids")]
    Run {
        /// Path to the check config (.toml)
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the XLSX report to this path (relative to --output-dir when set)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Directory for the XLSX report; defaults the report name to validation_results.xlsx
        #[arg(long, env = "CROSSVAL_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Run a subset of checks (dates, ids, entities, splits). Comma-separated.
        #[arg(long, value_delimiter = ',')]
        only: Vec<Step>,
    },

    /// Validate a config and its rules without reading any source
    #[command(after_help = "\
Examples:
  crossval validate ccpd013.toml")]
    Validate {
        /// Path to the check config (.toml)
        config: PathBuf,
    },

    /// Print the prefix rules and split rules a config resolves to
    #[command(after_help = "\
Examples:
  crossval rules ccpd013.toml
  crossval rules ccpd013.toml --json")]
    Rules {
        /// Path to the check config (.toml)
        config: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

/// Error carried to `main`: exit code, message, optional hint line.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::new(EXIT_CHECK_RUNTIME, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::InputAlignment { .. } => {
                Some("set options.alignment = \"truncate\" to compare only the overlapping rows")
            }
            ReconError::MissingColumn { .. } => {
                Some("check the [columns] table and split rules against the source header row")
            }
            ReconError::NotFound { .. } => {
                Some("rule files are looked up next to the config, in the working directory, then in src/test/resources")
            }
            _ => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: err.to_string(),
            hint: hint.map(String::from),
        }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = match &err {
            IoError::SheetNotFound { .. } => Some("set sources.sheet to one of the listed sheets".to_string()),
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("CROSSVAL_GIT_HASH"),
        ")",
        "\nengine:  crossval-recon ",
        env!("CARGO_PKG_VERSION"),
    )
}

/// Logs go to stderr so `--json` stdout stays a single JSON value.
/// `RUST_LOG` wins over the default level; `log` records from the
/// library crates are bridged by the subscriber.
fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() { ExitCode::from(EXIT_USAGE) } else { ExitCode::from(EXIT_SUCCESS) };
        }
    };
    init_logging(cli.quiet);

    let result = match cli.command {
        Commands::Run { config, json, output, report, output_dir, only } => {
            check::cmd_run(check::RunArgs { config, json, output, report, output_dir, only })
        }
        Commands::Validate { config } => check::cmd_validate(config),
        Commands::Rules { config, json } => check::cmd_rules(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
