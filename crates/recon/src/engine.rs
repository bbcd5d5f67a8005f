use crate::config::{CheckConfig, SplitColumnRule};
use crate::dates::{cell_date, DateStyle};
use crate::entity::validate_entities;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::model::{
    CheckInput, CheckReport, ComparableRecord, Dataset, EntityAxis, EntityCounts, KeyAxis, ReportMeta,
    SplitAxis,
};
use crate::reconcile::{date_records, id_records, reconcile, side_stats};
use crate::split::validate_columns;

/// One check of a run. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Dates,
    DeviceIds,
    Entities,
    Splits,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Dates, Step::DeviceIds, Step::Entities, Step::Splits];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dates => "dates",
            Self::DeviceIds => "ids",
            Self::Entities => "entities",
            Self::Splits => "splits",
        }
    }
}

impl std::str::FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dates" | "date" => Ok(Self::Dates),
            "ids" | "id" | "device_ids" => Ok(Self::DeviceIds),
            "entities" | "entity" => Ok(Self::Entities),
            "splits" | "split" => Ok(Self::Splits),
            other => Err(format!(
                "unknown step '{other}' (expected dates, ids, entities, splits)"
            )),
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run every check.
pub fn run(config: &CheckConfig, input: &CheckInput) -> Result<CheckReport, ReconError> {
    run_steps(config, input, &Step::ALL)
}

/// Run the selected checks. Config and column problems are reported before
/// anything is classified.
pub fn run_steps(
    config: &CheckConfig,
    input: &CheckInput,
    steps: &[Step],
) -> Result<CheckReport, ReconError> {
    config.validate()?;
    let cols = Columns::resolve(config, input, steps)?;
    let opts = &config.options;
    let rules = &config.rules;

    let mut report = CheckReport {
        meta: ReportMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            date_display: opts.date_display.clone(),
        },
        dates: None,
        device_ids: None,
        entities: None,
        splits: None,
    };

    if steps.contains(&Step::Splits) {
        // Alignment failures must surface before any other axis is computed.
        let results = validate_columns(&cols.splits, &input.excel.rows, &input.text.rows, opts.alignment)?;
        report.splits = Some(SplitAxis {
            outcome_counts: compute_summary(results.iter().map(|r| r.outcome)),
            results,
        });
    }

    if steps.contains(&Step::Dates) {
        let a = date_records(
            column_dates(&input.excel, &cols.excel_date, DateStyle::Excel),
            &opts.date_display,
        );
        let b = date_records(
            column_dates(&input.text, &cols.text_date, DateStyle::Csv),
            &opts.date_display,
        );
        report.dates = Some(key_axis(&input.excel, &input.text, a, b));
        log::info!("dates: {} distinct", report.dates.as_ref().map_or(0, |x| x.results.len()));
    }

    if steps.contains(&Step::DeviceIds) {
        let a = id_records(column_text(&input.excel, &cols.excel_id), opts.case_insensitive_id);
        let b = id_records(column_text(&input.text, &cols.text_id), opts.case_insensitive_id);
        report.device_ids = Some(key_axis(&input.excel, &input.text, a, b));
        log::info!("device ids: {} distinct", report.device_ids.as_ref().map_or(0, |x| x.results.len()));
    }

    if steps.contains(&Step::Entities) {
        let results = validate_entities(
            &input.text.rows,
            &cols.text_id,
            &cols.text_entity,
            rules.prefix_rules(),
            opts.case_insensitive_entity,
        );
        let counts = EntityCounts::from_results(&results);
        log::info!(
            "entities: {} rows, {} with rule, {} pass",
            counts.total,
            counts.with_rule,
            counts.pass
        );
        report.entities = Some(EntityAxis { results, counts });
    }

    Ok(report)
}

fn key_axis<K: Ord + Clone>(
    excel: &Dataset,
    text: &Dataset,
    a: Vec<ComparableRecord<K>>,
    b: Vec<ComparableRecord<K>>,
) -> KeyAxis<K> {
    let stats_a = side_stats(excel.rows.len(), &a);
    let stats_b = side_stats(text.rows.len(), &b);
    let results = reconcile(a, b);
    KeyAxis {
        outcome_counts: compute_summary(results.iter().map(|r| r.outcome)),
        results,
        stats_a,
        stats_b,
    }
}

fn column_text<'a>(ds: &'a Dataset, column: &'a str) -> impl Iterator<Item = Option<String>> + 'a {
    ds.rows.iter().map(move |r| r.text(column))
}

fn column_dates<'a>(
    ds: &'a Dataset,
    column: &'a str,
    style: DateStyle,
) -> impl Iterator<Item = Option<chrono::NaiveDate>> + 'a {
    ds.rows
        .iter()
        .map(move |r| r.get(column).and_then(|c| cell_date(c, style)))
}

/// Configured column names mapped to the actual dataset headers.
struct Columns {
    excel_date: String,
    excel_id: String,
    text_date: String,
    text_id: String,
    text_entity: String,
    splits: Vec<SplitColumnRule>,
}

impl Columns {
    fn resolve(config: &CheckConfig, input: &CheckInput, steps: &[Step]) -> Result<Self, ReconError> {
        let c = &config.columns;
        let wants = |s: Step| steps.contains(&s);

        let mut cols = Columns {
            excel_date: c.excel_date.clone(),
            excel_id: c.excel_device_id.clone(),
            text_date: c.text_date.clone(),
            text_id: c.text_device_id.clone(),
            text_entity: c.text_entity.clone(),
            splits: Vec::new(),
        };

        if wants(Step::Dates) {
            cols.excel_date = header(&input.excel, &c.excel_date)?;
            cols.text_date = header(&input.text, &c.text_date)?;
        }
        if wants(Step::DeviceIds) {
            cols.excel_id = header(&input.excel, &c.excel_device_id)?;
        }
        if wants(Step::DeviceIds) || wants(Step::Entities) {
            cols.text_id = header(&input.text, &c.text_device_id)?;
        }
        if wants(Step::Entities) {
            cols.text_entity = header(&input.text, &c.text_entity)?;
        }
        if wants(Step::Splits) {
            for rule in config.rules.split_rules() {
                cols.splits.push(SplitColumnRule {
                    source_column: header(&input.excel, &rule.source_column)?,
                    primary_column: header(&input.text, &rule.primary_column)?,
                    secondary_column: header(&input.text, &rule.secondary_column)?,
                    description: rule.description.clone(),
                });
            }
        }
        Ok(cols)
    }
}

fn header(ds: &Dataset, column: &str) -> Result<String, ReconError> {
    ds.column(column)
        .map(str::to_string)
        .ok_or_else(|| ReconError::MissingColumn {
            source_name: ds.name.clone(),
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, EntityOutcome, ReconOutcome, SourceRow, SplitOutcome};

    const CONFIG: &str = r#"
name = "unit"

[columns]
excel_date = "Sampling date"
excel_device_id = "Device sample ID"
text_date = "created_on"
text_device_id = "device_sample_id"
text_entity = "entity"

[[prefix_rules]]
prefix = "767"
replacement = "CCSMP"

[[split_rules]]
source_column = "Result"
primary_column = "Result_raw"
secondary_column = "Result_lg"
"#;

    fn dataset(name: &str, headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, cells)| SourceRow {
                    index: i,
                    fields: headers
                        .iter()
                        .zip(cells.iter())
                        .map(|(h, v)| (h.to_string(), CellValue::from(*v)))
                        .collect(),
                })
                .collect(),
        }
    }

    fn input() -> CheckInput {
        CheckInput {
            excel: dataset(
                "sdc.xlsx",
                &["Sampling date", "Device sample ID", "Result"],
                &[&["05/03/2024", "767010", "7.2"], &["06/03/2024", "767011", "<0.5"]],
            ),
            text: dataset(
                "bioht.csv",
                &["created_on", "device_sample_id", "entity", "Result_raw", "Result_lg"],
                &[
                    &["03/05/2024", "767010", "CCSMP010", "7.2", ""],
                    &["03/07/2024", "767012", "", "<0.5", "<0.5"],
                ],
            ),
        }
    }

    #[test]
    fn runs_all_steps() {
        let config = CheckConfig::from_toml(CONFIG).unwrap();
        let report = run(&config, &input()).unwrap();

        let dates = report.dates.as_ref().unwrap();
        let outcomes: Vec<_> = dates.results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![ReconOutcome::Matched, ReconOutcome::OnlyInA, ReconOutcome::OnlyInB]
        );
        assert_eq!(dates.results[0].value_a.as_deref(), Some("03/05/2024"));

        let ids = report.device_ids.as_ref().unwrap();
        assert_eq!(ids.results.len(), 3);
        assert_eq!(ids.outcome_counts["MATCHED"], 1);

        let entities = report.entities.as_ref().unwrap();
        assert_eq!(entities.counts.pass, 1);
        assert_eq!(entities.counts.missing_entity, 1);
        assert!(entities.results.iter().any(|r| r.outcome == EntityOutcome::MissingEntity));

        let splits = report.splits.as_ref().unwrap();
        assert!(splits.results.iter().all(|r| r.outcome == SplitOutcome::Pass));

        assert_eq!(report.meta.config_name, "unit");
        assert!(!report.is_clean());
    }

    #[test]
    fn only_selected_steps() {
        let config = CheckConfig::from_toml(CONFIG).unwrap();
        let report = run_steps(&config, &input(), &[Step::Entities]).unwrap();
        assert!(report.dates.is_none());
        assert!(report.device_ids.is_none());
        assert!(report.splits.is_none());
        assert!(report.entities.is_some());
    }

    #[test]
    fn missing_column_fails_before_classifying() {
        let config = CheckConfig::from_toml(&CONFIG.replace("\"entity\"", "\"owner\"")).unwrap();
        let err = run(&config, &input()).unwrap_err();
        match err {
            ReconError::MissingColumn { source_name, column } => {
                assert_eq!(source_name, "bioht.csv");
                assert_eq!(column, "owner");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_case_is_ignored() {
        let config = CheckConfig::from_toml(&CONFIG.replace("\"Sampling date\"", "\"SAMPLING DATE\"")).unwrap();
        assert!(run_steps(&config, &input(), &[Step::Dates]).is_ok());
    }

    #[test]
    fn strict_alignment_aborts_run() {
        let config = CheckConfig::from_toml(CONFIG).unwrap();
        let mut inp = input();
        inp.text.rows.pop();
        let err = run(&config, &inp).unwrap_err();
        assert!(matches!(err, ReconError::InputAlignment { excel_rows: 2, text_rows: 1 }));
        // Other steps don't care about row counts
        assert!(run_steps(&config, &inp, &[Step::Dates, Step::DeviceIds]).is_ok());
    }

    #[test]
    fn parse_steps() {
        assert_eq!("ids".parse::<Step>(), Ok(Step::DeviceIds));
        assert_eq!(" Splits ".parse::<Step>(), Ok(Step::Splits));
        assert!("bogus".parse::<Step>().is_err());
    }
}
