use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Ordered prefix rewrite: `prefix` at the start of an id becomes `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub replacement: String,
}

/// One spreadsheet column that the text export splits into a raw mirror
/// column and a secondary ("lg") column.
///
/// The legacy JSON names (`excelColumn`, `rawColumn`, `lgColumn`) are accepted.
/// Missing names deserialize as empty strings so validation can report which
/// one is blank.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct SplitColumnRule {
    #[serde(default, alias = "excelColumn")]
    pub source_column: String,
    #[serde(default, alias = "rawColumn")]
    pub primary_column: String,
    #[serde(default, alias = "lgColumn")]
    pub secondary_column: String,
    #[serde(default)]
    pub description: String,
}

impl SplitColumnRule {
    fn check_fields(&self) -> Result<(), ReconError> {
        if self.source_column.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "invalid split rule: source_column is required".into(),
            ));
        }
        for (field, value) in [
            ("primary_column", &self.primary_column),
            ("secondary_column", &self.secondary_column),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "invalid split rule for '{}': {field} is required",
                    self.source_column
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for SplitColumnRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.source_column, self.primary_column, self.secondary_column
        )
    }
}

/// Immutable rule lists for one run. Built once, then passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    prefix_rules: Vec<PrefixRule>,
    #[serde(default)]
    split_rules: Vec<SplitColumnRule>,
}

/// Legacy `device-entity-mappings` document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappingDocument {
    #[serde(default)]
    device_mappings: Option<Vec<PrefixRule>>,
}

/// Legacy `column-split-validations` document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitDocument {
    #[serde(default)]
    column_split_validations: Option<Vec<SplitColumnRule>>,
}

impl RuleSet {
    /// Build from already-parsed lists. Split rules are field-checked.
    pub fn new(
        prefix_rules: Vec<PrefixRule>,
        split_rules: Vec<SplitColumnRule>,
    ) -> Result<Self, ReconError> {
        let set = Self { prefix_rules, split_rules };
        set.check_split_fields()?;
        Ok(set)
    }

    /// Parse `[[prefix_rules]]` / `[[split_rules]]` tables.
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let set: RuleSet =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        set.check_split_fields()?;
        Ok(set)
    }

    /// Parse the two legacy JSON documents.
    pub fn from_json(mappings_json: &str, splits_json: &str) -> Result<Self, ReconError> {
        Self::new(
            parse_prefix_rules_json(mappings_json)?,
            parse_split_rules_json(splits_json)?,
        )
    }

    /// Locate both legacy JSON documents in `search_dirs` and parse them.
    pub fn load(
        mappings_file: &str,
        splits_file: &str,
        search_dirs: &[PathBuf],
    ) -> Result<Self, ReconError> {
        let mappings = read_located(mappings_file, search_dirs)?;
        let splits = read_located(splits_file, search_dirs)?;
        Self::from_json(&mappings, &splits)
    }

    pub fn prefix_rules(&self) -> &[PrefixRule] {
        &self.prefix_rules
    }

    pub fn split_rules(&self) -> &[SplitColumnRule] {
        &self.split_rules
    }

    /// Both lists must be non-empty and every prefix non-empty.
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.prefix_rules.is_empty() {
            return Err(ReconError::ConfigValidation(
                "no prefix rules defined in configuration".into(),
            ));
        }
        if self.split_rules.is_empty() {
            return Err(ReconError::ConfigValidation(
                "no column split validations defined in configuration".into(),
            ));
        }
        if let Some(pos) = self.prefix_rules.iter().position(|r| r.prefix.is_empty()) {
            return Err(ReconError::ConfigValidation(format!(
                "prefix rule #{} has an empty prefix",
                pos + 1
            )));
        }
        self.check_split_fields()
    }

    fn check_split_fields(&self) -> Result<(), ReconError> {
        self.split_rules.iter().try_for_each(SplitColumnRule::check_fields)
    }

    pub fn mappings_summary(&self) -> String {
        let mut out = String::from("Device-to-Entity Mappings:\n");
        if self.prefix_rules.is_empty() {
            out.push_str("  (No mappings defined)\n");
            return out;
        }
        for (i, r) in self.prefix_rules.iter().enumerate() {
            let _ = writeln!(out, "  [{}] {} → {}", i + 1, r.prefix, r.replacement);
        }
        out
    }

    pub fn validations_summary(&self) -> String {
        let mut out = String::from("Column Split Validations:\n");
        if self.split_rules.is_empty() {
            out.push_str("  (No validations defined)\n");
            return out;
        }
        for (i, r) in self.split_rules.iter().enumerate() {
            let _ = writeln!(
                out,
                "  [{}] {} → {} + {}",
                i + 1,
                r.source_column,
                r.primary_column,
                r.secondary_column
            );
        }
        out
    }
}

pub fn parse_prefix_rules_json(input: &str) -> Result<Vec<PrefixRule>, ReconError> {
    let doc: MappingDocument = serde_json::from_str(input)
        .map_err(|e| ReconError::ConfigParse(format!("device mappings: {e}")))?;
    Ok(doc.device_mappings.unwrap_or_default())
}

pub fn parse_split_rules_json(input: &str) -> Result<Vec<SplitColumnRule>, ReconError> {
    let doc: SplitDocument = serde_json::from_str(input)
        .map_err(|e| ReconError::ConfigParse(format!("column split validations: {e}")))?;
    Ok(doc.column_split_validations.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Search locations
// ---------------------------------------------------------------------------

/// Search order for rule files: the config's own directory, the working
/// directory, then the conventional test resources directory.
pub fn default_search_dirs(base_dir: &Path) -> Vec<PathBuf> {
    vec![
        base_dir.to_path_buf(),
        PathBuf::from("."),
        PathBuf::from("src").join("test").join("resources"),
    ]
}

/// First existing `dir/file_name` across `search_dirs`.
pub fn locate(file_name: &str, search_dirs: &[PathBuf]) -> Result<PathBuf, ReconError> {
    let mut searched = Vec::with_capacity(search_dirs.len());
    for dir in search_dirs {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(candidate);
    }
    Err(ReconError::NotFound { file: file_name.to_string(), searched })
}

fn read_located(file_name: &str, search_dirs: &[PathBuf]) -> Result<String, ReconError> {
    let path = locate(file_name, search_dirs)?;
    let data = std::fs::read_to_string(&path)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
    log::info!("loaded rule file from {}", path.display());
    Ok(data)
}

// ---------------------------------------------------------------------------
// Run config
// ---------------------------------------------------------------------------

/// Top-level `.check.toml` document.
#[derive(Debug, Deserialize)]
pub struct CheckConfig {
    pub name: String,
    #[serde(default)]
    pub sources: SourcesConfig,
    pub columns: ColumnMapping,
    #[serde(default)]
    pub options: CheckOptions,
    /// Legacy JSON rule files, resolved by [`CheckConfig::resolve_rule_files`].
    #[serde(default)]
    pub rule_files: Option<RuleFiles>,
    #[serde(flatten)]
    pub rules: RuleSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub excel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Worksheet name; first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    pub excel_date: String,
    pub excel_device_id: String,
    pub text_date: String,
    pub text_device_id: String,
    pub text_entity: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckOptions {
    #[serde(default = "default_true")]
    pub case_insensitive_id: bool,
    #[serde(default = "default_true")]
    pub case_insensitive_entity: bool,
    #[serde(default)]
    pub alignment: AlignmentPolicy,
    #[serde(default = "default_date_display")]
    pub date_display: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            case_insensitive_id: true,
            case_insensitive_entity: true,
            alignment: AlignmentPolicy::default(),
            date_display: default_date_display(),
        }
    }
}

impl CheckOptions {
    fn check_date_display(&self) -> Result<(), ReconError> {
        use chrono::format::{Item, StrftimeItems};

        if StrftimeItems::new(&self.date_display).any(|i| matches!(i, Item::Error)) {
            return Err(ReconError::ConfigValidation(format!(
                "options.date_display '{}' is not a valid strftime format",
                self.date_display
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_date_display() -> String {
    "%m/%d/%Y".into()
}

/// What the split-column check does when the two sources have different
/// row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Fail before classifying anything.
    #[default]
    Strict,
    /// Classify the common prefix of rows and log a warning.
    Truncate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleFiles {
    pub mappings: String,
    pub splits: String,
}

impl CheckConfig {
    /// Parse and validate. Rule lists may still be empty here when
    /// `rule_files` is set; they are checked again after resolution.
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: CheckConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.rules.check_split_fields()?;
        config.check_columns()?;
        config.options.check_date_display()?;
        if config.rule_files.is_none() {
            config.rules.validate()?;
        }
        Ok(config)
    }

    /// Replace inline rules with the legacy JSON files, if configured.
    pub fn resolve_rule_files(&mut self, search_dirs: &[PathBuf]) -> Result<(), ReconError> {
        if let Some(ref files) = self.rule_files {
            self.rules = RuleSet::load(&files.mappings, &files.splits, search_dirs)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.check_columns()?;
        self.options.check_date_display()?;
        self.rules.validate()
    }

    fn check_columns(&self) -> Result<(), ReconError> {
        let c = &self.columns;
        for (field, value) in [
            ("excel_date", &c.excel_date),
            ("excel_device_id", &c.excel_device_id),
            ("text_date", &c.text_date),
            ("text_device_id", &c.text_device_id),
            ("text_entity", &c.text_entity),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.{field} must not be blank"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
