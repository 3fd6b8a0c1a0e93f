//! Error types for the YAML front-end and the compiled job descriptor.
//!
//! Mirrors the split the rest of the pipeline uses: one small `thiserror`
//! enum per fallible stage, composed into a top-level [`CompileError`] that
//! callers match on without needing to know which stage produced it.

use thiserror::Error;

/// Errors from parsing and type-checking a single jobs-file option.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown option {0:?}")]
    UnknownOption(String),

    #[error("option {option:?} expects a {expected}, got {actual}")]
    TypeMismatch {
        option: String,
        expected: &'static str,
        actual: String,
    },

    #[error("option {option:?} has unknown sub-option {sub_option:?}")]
    UnknownSubOption { option: String, sub_option: String },

    #[error("option {option:?} has invalid value {value:?}, expected one of {allowed:?}")]
    InvalidEnumValue {
        option: String,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("option {option:?} is missing required field {field:?}")]
    MissingRequired { option: String, field: &'static str },
}

/// Errors from matrix/condition expansion (raised by `jobsfile-expand`, but
/// defined here so both `jobsfile-expand` and `jobsfile` can depend on one
/// shared error type rather than converting between crate-local ones).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    #[error("malformed condition {0:?}, expected axis-pattern")]
    InvalidConditionSyntax(String),

    #[error("condition {condition:?} can never match any matrix row")]
    UnmatchableCondition { condition: String },

    #[error(
        "ambiguous conditions for key {key:?}: {new_conditions:?} neither overrides nor is overridden by previously set {previous_conditions:?}"
    )]
    AmbiguousCondition {
        key: String,
        new_conditions: String,
        previous_conditions: String,
    },

    #[error("placeholder {placeholder:?} in template has no matching value")]
    MissingPlaceholder { placeholder: String },

    #[error("matrix axis {0:?} has no values")]
    EmptyAxis(String),
}

/// The top-level error produced by the YAML-to-`JobDescriptor` stages of
/// the pipeline, composing each stage-specific error into one type callers
/// can match on. Generator and reconciliation errors are defined in the
/// `jobsfile` crate, which is the only consumer of `xmltree` and `reqwest`.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Option(#[from] OptionError),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("invalid repository: {0}")]
    Repository(#[from] crate::repository::RepositoryError),

    #[error("failed to parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
