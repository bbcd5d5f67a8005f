use crate::config::PrefixRule;
use crate::model::{EntityCounts, EntityOutcome, EntityResult, SourceRow};
use crate::transform::transform;

/// Check one device id against the entity recorded for it.
///
/// The expected entity is derived from the device id via the prefix rules.
/// With `case_insensitive`, only the recorded entity is upper-cased; the
/// expected value is compared exactly as the transformer produced it.
pub fn classify(
    raw_id: Option<&str>,
    entity: Option<&str>,
    rules: &[PrefixRule],
    case_insensitive: bool,
) -> EntityOutcome {
    let Some(expected) = transform(raw_id.map(str::trim), rules, case_insensitive) else {
        return EntityOutcome::Ignored;
    };

    let actual = match entity.map(str::trim) {
        Some(a) if !a.is_empty() => a,
        _ => return EntityOutcome::MissingEntity,
    };

    let equal = if case_insensitive {
        expected == actual.to_uppercase()
    } else {
        expected == actual
    };

    if equal {
        EntityOutcome::Pass
    } else {
        EntityOutcome::Fail
    }
}

/// Classify every row of the text dataset.
///
/// Ordered by entity id, falling back to device id when the entity is blank,
/// then by row index.
pub fn validate_entities(
    rows: &[SourceRow],
    device_column: &str,
    entity_column: &str,
    rules: &[PrefixRule],
    case_insensitive: bool,
) -> Vec<EntityResult> {
    let mut results: Vec<EntityResult> = rows
        .iter()
        .map(|row| {
            let device_id = row.text(device_column);
            let entity_id = row.text(entity_column);
            let expected = transform(device_id.as_deref(), rules, case_insensitive);
            let outcome = classify(device_id.as_deref(), entity_id.as_deref(), rules, case_insensitive);
            EntityResult {
                row_index: row.index,
                device_id,
                entity_id,
                expected,
                outcome,
            }
        })
        .collect();

    results.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)).then(a.row_index.cmp(&b.row_index)));
    results
}

fn sort_key(r: &EntityResult) -> &str {
    r.entity_id
        .as_deref()
        .or(r.device_id.as_deref())
        .unwrap_or("")
}

impl EntityCounts {
    pub fn from_results(results: &[EntityResult]) -> Self {
        let mut c = EntityCounts { total: results.len(), ..Default::default() };
        for r in results {
            match r.outcome {
                EntityOutcome::Pass => c.pass += 1,
                EntityOutcome::Fail => c.fail += 1,
                EntityOutcome::MissingEntity => c.missing_entity += 1,
                EntityOutcome::Ignored => c.ignored += 1,
            }
        }
        c.with_rule = c.pass + c.fail + c.missing_entity;
        c
    }

    /// `metric -> value` rows for the counts sheet.
    pub fn metrics(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("total_rows", self.total),
            ("rule_rows", self.with_rule),
            ("pass_rows", self.pass),
            ("fail_rows", self.fail),
            ("missing_entity_rows", self.missing_entity),
            ("ignored_rows", self.ignored),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn rules() -> Vec<PrefixRule> {
        vec![PrefixRule { prefix: "767".into(), replacement: "CCSMP".into() }]
    }

    #[test]
    fn four_outcomes() {
        let r = rules();
        assert_eq!(classify(Some("767010"), Some("CCSMP010"), &r, false), EntityOutcome::Pass);
        assert_eq!(classify(Some("767010"), Some("CCSMP999"), &r, false), EntityOutcome::Fail);
        assert_eq!(classify(Some("767010"), Some(""), &r, false), EntityOutcome::MissingEntity);
        assert_eq!(classify(Some("767010"), None, &r, false), EntityOutcome::MissingEntity);
        assert_eq!(classify(Some("999010"), Some("CCSMP010"), &r, false), EntityOutcome::Ignored);
        assert_eq!(classify(Some("999010"), None, &r, false), EntityOutcome::Ignored);
    }

    #[test]
    fn case_insensitive_folds_entity_only() {
        let r = vec![PrefixRule { prefix: "ab".into(), replacement: "ENT".into() }];
        assert_eq!(classify(Some("AB1"), Some("ENT1"), &r, true), EntityOutcome::Pass);
        assert_eq!(classify(Some("AB1"), Some("ent1"), &r, true), EntityOutcome::Pass);
        assert_eq!(classify(Some("ab1"), Some("ent1"), &r, false), EntityOutcome::Fail);
        assert_eq!(classify(Some("AB1"), Some("ENT1"), &r, false), EntityOutcome::Ignored);

        // Lower-case replacement never matches an upper-cased entity
        let lower = vec![PrefixRule { prefix: "ab".into(), replacement: "Ent".into() }];
        assert_eq!(classify(Some("AB1"), Some("Ent1"), &lower, true), EntityOutcome::Fail);
    }

    #[test]
    fn lowercase_suffix_is_not_folded() {
        let r = rules();
        assert_eq!(classify(Some("767a01"), Some("CCSMPa01"), &r, true), EntityOutcome::Fail);
        assert_eq!(classify(Some("767A01"), Some("ccsmpa01"), &r, true), EntityOutcome::Pass);
        assert_eq!(classify(Some("767a01"), Some("CCSMPa01"), &r, false), EntityOutcome::Pass);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let r = rules();
        assert_eq!(classify(Some(" 767010 "), Some(" CCSMP010 "), &r, false), EntityOutcome::Pass);
        assert_eq!(classify(Some("767010"), Some("   "), &r, false), EntityOutcome::MissingEntity);
    }

    fn row(index: usize, device: &str, entity: &str) -> SourceRow {
        SourceRow {
            index,
            fields: [
                ("device".to_string(), CellValue::from(device)),
                ("entity".to_string(), CellValue::from(entity)),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn results_sorted_by_entity_then_device() {
        let rows = vec![
            row(0, "767030", "CCSMP030"),
            row(1, "767002", ""),
            row(2, "999001", "ZZZ"),
            row(3, "767010", "CCSMP999"),
        ];
        let out = validate_entities(&rows, "device", "entity", &rules(), false);
        let order: Vec<_> = out.iter().map(|r| r.row_index).collect();
        // "767002" (device fallback) < "CCSMP030" < "CCSMP999" < "ZZZ"
        assert_eq!(order, vec![1, 0, 3, 2]);
        assert_eq!(out[0].outcome, EntityOutcome::MissingEntity);
        assert_eq!(out[0].expected.as_deref(), Some("CCSMP002"));
        assert_eq!(out[3].outcome, EntityOutcome::Ignored);
        assert_eq!(out[3].expected, None);
    }

    #[test]
    fn counts_are_consistent() {
        let rows = vec![
            row(0, "767030", "CCSMP030"),
            row(1, "767002", ""),
            row(2, "999001", "ZZZ"),
            row(3, "767010", "CCSMP999"),
            row(4, "", ""),
        ];
        let out = validate_entities(&rows, "device", "entity", &rules(), false);
        let c = EntityCounts::from_results(&out);
        assert_eq!(c.total, 5);
        assert_eq!(c.pass, 1);
        assert_eq!(c.fail, 1);
        assert_eq!(c.missing_entity, 1);
        assert_eq!(c.ignored, 2);
        assert_eq!(c.with_rule, c.pass + c.fail + c.missing_entity);
        assert_eq!(c.total, c.with_rule + c.ignored);
    }
}
