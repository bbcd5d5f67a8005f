//! `crossval-recon`: cross-source validation engine.
//!
//! Pure engine crate: receives pre-loaded datasets and an immutable rule set,
//! returns classified results. No CLI or file-format dependencies.

pub mod config;
pub mod dates;
pub mod engine;
pub mod entity;
pub mod error;
pub mod evidence;
pub mod model;
pub mod reconcile;
pub mod split;
pub mod transform;

pub use config::{AlignmentPolicy, CheckConfig, PrefixRule, RuleSet, SplitColumnRule};
pub use engine::{run, run_steps, Step};
pub use error::ReconError;
pub use model::{CellValue, CheckInput, CheckReport, Dataset, SourceRow};
pub use transform::transform;
