//! Conditional-key parsing and matching: `cond1:cond2:...:option`, where
//! each `cond_i` is an `axis-pattern` atom.

use std::collections::BTreeSet;

use regex::Regex;

use crate::error::ExpandError;
use crate::matrix::MatrixRow;

/// A sentinel meaning "this axis isn't constrained by the matrix row being
/// checked"; used only during the unmatchable-condition precheck, where no
/// concrete row exists yet and a condition must be considered satisfiable
/// against *any* declared value for axes it doesn't explicitly name.
pub const MATCH_ANY: &str = "\0match-any\0";

/// One `axis-pattern` condition atom.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Condition {
    pub axis: String,
    pub pattern: String,
}

impl Condition {
    /// Parses a single condition atom. The original implementation splits
    /// on the *first* `-`, so an axis name itself may not contain a dash.
    pub fn parse(text: &str) -> Result<Self, ExpandError> {
        let (axis, pattern) = text
            .split_once('-')
            .ok_or_else(|| ExpandError::InvalidConditionSyntax(text.to_string()))?;
        Ok(Condition {
            axis: axis.to_string(),
            pattern: pattern.to_string(),
        })
    }

    /// True if `pattern` matches (as a prefix, per `re.match` semantics)
    /// any of `values`, or if `values` is [`MATCH_ANY`].
    pub fn matches(&self, values: &[&str]) -> bool {
        if values == [MATCH_ANY] {
            return true;
        }
        let anchored = format!("^(?:{})", self.pattern);
        let Ok(re) = Regex::new(&anchored) else {
            return false;
        };
        values.iter().any(|v| re.is_match(v))
    }

    /// True if this condition matches the row's declared aliases for its axis.
    pub fn matches_row(&self, row: &MatrixRow) -> bool {
        let aliases = row.aliases(&self.axis);
        self.matches(&aliases)
    }
}

/// A parsed `cond1:cond2:...:option` key, split into its conditions and
/// bare option name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalKey {
    pub conditions: ConditionSet,
    pub option: String,
}

impl ConditionalKey {
    pub fn parse(raw_key: &str) -> Result<Self, ExpandError> {
        let mut parts: Vec<&str> = raw_key.split(':').collect();
        let option = parts.pop().expect("split always yields at least one part").to_string();
        let conditions = parts
            .into_iter()
            .map(Condition::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ConditionalKey {
            conditions: ConditionSet(conditions),
            option,
        })
    }
}

/// An ordered set of conditions, used for subset/superset comparison when
/// resolving ambiguity and override between two conditional entries for the
/// same option.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionSet(pub BTreeSet<Condition>);

impl ConditionSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_subset(&self, other: &ConditionSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn is_superset(&self, other: &ConditionSet) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn matches_row(&self, row: &MatrixRow) -> bool {
        self.0.iter().all(|c| c.matches_row(row))
    }
}

impl std::fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| format!("{}-{}", c.axis, c.pattern)).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_condition_atom() {
        let cond = Condition::parse("platform-linux.*").unwrap();
        assert_eq!(cond.axis, "platform");
        assert_eq!(cond.pattern, "linux.*");
    }

    #[test]
    fn condition_matches_prefix_not_full_string() {
        let cond = Condition::parse("platform-linux").unwrap();
        assert!(cond.matches(&["linux-ubuntu"]));
        assert!(!cond.matches(&["windows"]));
    }

    #[test]
    fn match_any_always_matches() {
        let cond = Condition::parse("platform-linux").unwrap();
        assert!(cond.matches(&[MATCH_ANY]));
    }

    #[test]
    fn conditional_key_splits_conditions_and_option() {
        let key = ConditionalKey::parse("platform-linux:compiler-gcc:build_shell_commands").unwrap();
        assert_eq!(key.option, "build_shell_commands");
        assert_eq!(key.conditions.0.len(), 2);
    }

    #[test]
    fn conditional_key_with_no_conditions() {
        let key = ConditionalKey::parse("build_shell_commands").unwrap();
        assert!(key.conditions.is_empty());
    }

    #[test]
    fn condition_set_subset_comparison() {
        let a = ConditionalKey::parse("platform-linux:build_shell_commands").unwrap().conditions;
        let b = ConditionalKey::parse("platform-linux:compiler-gcc:build_shell_commands")
            .unwrap()
            .conditions;
        assert!(a.is_subset(&b));
        assert!(b.is_superset(&a));
    }
}
