//! Ambiguity and override resolution for conditional option keys.
//!
//! When two conditional keys set the same option for the same matrix row
//! (e.g. `platform-linux:build_shell_commands` and
//! `compiler-gcc:build_shell_commands` both matching row `{platform:
//! linux, compiler: gcc}`), the more specific one wins: a condition set
//! that is a superset of another is strictly more specific, so it
//! overrides. Two condition sets that are neither subset nor superset of
//! each other are ambiguous unless they happen to set the same value.

use indexmap::IndexMap;
use jobsfile_model::options::OptionValue;

use crate::condition::ConditionSet;
use crate::error::ExpandError;

/// Accumulates resolved option values for a single matrix row, applying
/// the ambiguity/override rule as each conditional entry is folded in.
#[derive(Debug, Default)]
pub struct Resolver {
    resolved: IndexMap<String, (ConditionSet, OptionValue)>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Folds in `value` for `option`, guarded by `conditions` (already
    /// confirmed to match the row). Entries are expected to arrive in
    /// document order, as iteration order over document keys determines
    /// which of two equally-specific (but differently-valued) entries
    /// would be ambiguous.
    pub fn set(
        &mut self,
        option: &str,
        conditions: ConditionSet,
        value: OptionValue,
    ) -> Result<(), ExpandError> {
        match self.resolved.get(option) {
            None => {
                self.resolved.insert(option.to_string(), (conditions, value));
                Ok(())
            }
            Some((previous_conditions, previous_value)) => {
                if conditions.is_superset(previous_conditions) {
                    self.resolved.insert(option.to_string(), (conditions, value));
                    Ok(())
                } else if previous_conditions.is_superset(&conditions) {
                    // previous entry is more specific; keep it
                    Ok(())
                } else if *previous_value == value {
                    // same value either way; no real conflict
                    Ok(())
                } else {
                    Err(ExpandError::AmbiguousCondition {
                        key: option.to_string(),
                        new_conditions: conditions.to_string(),
                        previous_conditions: previous_conditions.to_string(),
                    })
                }
            }
        }
    }

    pub fn into_options(self) -> IndexMap<String, OptionValue> {
        self.resolved
            .into_iter()
            .map(|(k, (_, v))| (k, v))
            .collect()
    }
}
