use crate::config::PrefixRule;

/// Rewrite `raw_id` with the first prefix rule that matches it.
///
/// Rules are tried strictly in list order; overlapping prefixes are never
/// resolved by length. With `case_insensitive` only the prefix comparison is
/// folded, the replacement and the remainder are copied verbatim.
///
/// Returns `None` when `raw_id` is absent or blank, or no rule applies.
pub fn transform(raw_id: Option<&str>, rules: &[PrefixRule], case_insensitive: bool) -> Option<String> {
    let raw_id = raw_id?;
    if raw_id.trim().is_empty() {
        return None;
    }

    rules.iter().find_map(|rule| {
        let n = rule.prefix.chars().count();
        let split_at = match raw_id.char_indices().nth(n) {
            Some((i, _)) => i,
            None if raw_id.chars().count() == n => raw_id.len(),
            None => return None, // shorter than the prefix
        };
        let (head, rest) = raw_id.split_at(split_at);
        if prefix_eq(head, &rule.prefix, case_insensitive) {
            Some(format!("{}{}", rule.replacement, rest))
        } else {
            None
        }
    })
}

fn prefix_eq(head: &str, prefix: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        head.to_uppercase() == prefix.to_uppercase()
    } else {
        head == prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(prefix: &str, replacement: &str) -> PrefixRule {
        PrefixRule { prefix: prefix.into(), replacement: replacement.into() }
    }

    #[test]
    fn replaces_prefix_keeps_suffix() {
        let rules = vec![rule("767", "CCSMP")];
        assert_eq!(transform(Some("767010"), &rules, false).as_deref(), Some("CCSMP010"));
    }

    #[test]
    fn first_match_wins_over_specificity() {
        let rules = vec![rule("AB", "X"), rule("A", "Y")];
        assert_eq!(transform(Some("AB123"), &rules, false).as_deref(), Some("X123"));

        // Reversed order: the shorter prefix now shadows the longer one
        let rules = vec![rule("A", "Y"), rule("AB", "X")];
        assert_eq!(transform(Some("AB123"), &rules, false).as_deref(), Some("YB123"));
    }

    #[test]
    fn no_rule_is_absent() {
        let rules = vec![rule("767", "CCSMP")];
        assert_eq!(transform(Some("999010"), &rules, false), None);
        assert_eq!(transform(None, &rules, false), None);
        assert_eq!(transform(Some("   "), &rules, false), None);
        assert_eq!(transform(Some("76"), &rules, false), None);
    }

    #[test]
    fn exact_length_match_leaves_empty_suffix() {
        let rules = vec![rule("767", "CCSMP")];
        assert_eq!(transform(Some("767"), &rules, false).as_deref(), Some("CCSMP"));
    }

    #[test]
    fn case_fold_only_applies_to_prefix() {
        let rules = vec![rule("AB", "Zz")];
        assert_eq!(transform(Some("ab1c"), &rules, true).as_deref(), Some("Zz1c"));
        assert_eq!(transform(Some("AB1c"), &rules, true).as_deref(), Some("Zz1c"));
        assert_eq!(transform(Some("ab1c"), &rules, false), None);
    }

    #[test]
    fn multibyte_prefix_counts_characters() {
        let rules = vec![rule("é7", "E")];
        assert_eq!(transform(Some("é701"), &rules, false).as_deref(), Some("E01"));
        assert_eq!(transform(Some("É701"), &rules, true).as_deref(), Some("E01"));
    }
}
