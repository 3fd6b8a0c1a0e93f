//! The recognized jobs-file option schema and the YAML front-end that
//! parses raw YAML scalars into strongly typed option values.
//!
//! Every scalar loaded here becomes a string, the same failsafe behavior
//! the original implementation gets from PyYAML's `BaseLoader`: `serde_yaml`
//! has no equivalent loader flag, so [`OptionValue::from_yaml`] re-stringifies
//! every scalar node it walks instead of trusting `serde_yaml`'s own
//! bool/int/float inference.

use indexmap::IndexMap;

use crate::error::OptionError;

/// A YAML value with every scalar forced to a string, mirroring the
/// original implementation's `BaseLoader`-backed parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Scalar(String),
    List(Vec<OptionValue>),
    Map(IndexMap<String, OptionValue>),
}

impl OptionValue {
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => OptionValue::Scalar(String::new()),
            serde_yaml::Value::Bool(b) => {
                OptionValue::Scalar(if *b { "True".to_string() } else { "False".to_string() })
            }
            serde_yaml::Value::Number(n) => OptionValue::Scalar(n.to_string()),
            serde_yaml::Value::String(s) => OptionValue::Scalar(s.clone()),
            serde_yaml::Value::Sequence(items) => {
                OptionValue::List(items.iter().map(OptionValue::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => {
                let mut out = IndexMap::new();
                for (k, v) in map {
                    let key = match k {
                        serde_yaml::Value::String(s) => s.clone(),
                        other => OptionValue::from_yaml(other).as_scalar().unwrap_or_default(),
                    };
                    out.insert(key, OptionValue::from_yaml(v));
                }
                OptionValue::Map(out)
            }
            serde_yaml::Value::Tagged(tagged) => OptionValue::from_yaml(&tagged.value),
        }
    }

    pub fn as_scalar(&self) -> Option<String> {
        match self {
            OptionValue::Scalar(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            OptionValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, OptionValue>> {
        match self {
            OptionValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Splits a comma-separated scalar into a list of trimmed strings, the
    /// equivalent of the original `AsList` helper, which treats a bare
    /// scalar as a one-element list and a list as already-a-list.
    pub fn as_comma_list(&self) -> Vec<String> {
        match self {
            OptionValue::Scalar(s) => s.split(',').map(|part| part.trim().to_string()).collect(),
            OptionValue::List(items) => items.iter().filter_map(OptionValue::as_scalar).collect(),
            OptionValue::Map(_) => Vec::new(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Scalar(_) => "scalar",
            OptionValue::List(_) => "list",
            OptionValue::Map(_) => "mapping",
        }
    }
}

/// The shape an option's value is expected to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionShape {
    Scalar,
    List,
    Mapping,
    /// Accepts a scalar or a list (anything `AsList`-able).
    ScalarOrList,
}

/// One entry in the recognized-option table.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub shape: OptionShape,
}

/// The full set of recognized jobs-file options (`PARSEABLE_OPTIONS` in the
/// original), i.e. every option that may appear in a jobs-file document,
/// whether or not it is consumed by the Jenkins generator.
pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec { name: "matrix", shape: OptionShape::Mapping },
    OptionSpec { name: "branch_patterns", shape: OptionShape::ScalarOrList },
    OptionSpec { name: "exclude", shape: OptionShape::Scalar },
    OptionSpec { name: "ignore_unmatchable", shape: OptionShape::Scalar },
    OptionSpec { name: "additional_repositories", shape: OptionShape::List },
    OptionSpec { name: "auth_token", shape: OptionShape::Scalar },
    OptionSpec { name: "boosttest_patterns", shape: OptionShape::ScalarOrList },
    OptionSpec { name: "build_batch_commands", shape: OptionShape::ScalarOrList },
    OptionSpec { name: "build_shell_commands", shape: OptionShape::ScalarOrList },
    OptionSpec { name: "build_python_commands", shape: OptionShape::ScalarOrList },
    OptionSpec { name: "console_color", shape: OptionShape::Scalar },
    OptionSpec { name: "coverage", shape: OptionShape::Mapping },
    OptionSpec { name: "cron", shape: OptionShape::Scalar },
    OptionSpec { name: "custom_workspace", shape: OptionShape::Scalar },
    OptionSpec { name: "description_regex", shape: OptionShape::Scalar },
    OptionSpec { name: "display_name", shape: OptionShape::Scalar },
    OptionSpec { name: "email_notification", shape: OptionShape::Mapping },
    OptionSpec { name: "git", shape: OptionShape::Mapping },
    OptionSpec { name: "junit_patterns", shape: OptionShape::ScalarOrList },
    OptionSpec { name: "jsunit_patterns", shape: OptionShape::ScalarOrList },
    OptionSpec { name: "label_expression", shape: OptionShape::Scalar },
    OptionSpec { name: "notify_stash", shape: OptionShape::Mapping },
    OptionSpec { name: "notification", shape: OptionShape::Mapping },
    OptionSpec { name: "parameters", shape: OptionShape::List },
    OptionSpec { name: "scm_poll", shape: OptionShape::Scalar },
    OptionSpec { name: "slack", shape: OptionShape::Mapping },
    OptionSpec { name: "timeout", shape: OptionShape::Scalar },
    OptionSpec { name: "timeout_no_activity", shape: OptionShape::Scalar },
    OptionSpec { name: "timestamps", shape: OptionShape::Scalar },
    OptionSpec { name: "trigger_jobs", shape: OptionShape::Mapping },
    OptionSpec { name: "warnings", shape: OptionShape::Mapping },
];

pub fn find_option(name: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.name == name)
}

/// Validates `value` against `spec`'s expected shape.
pub fn check_shape(spec: &OptionSpec, value: &OptionValue) -> Result<(), OptionError> {
    let ok = match spec.shape {
        OptionShape::Scalar => matches!(value, OptionValue::Scalar(_)),
        OptionShape::List => matches!(value, OptionValue::List(_)),
        OptionShape::Mapping => matches!(value, OptionValue::Map(_)),
        OptionShape::ScalarOrList => {
            matches!(value, OptionValue::Scalar(_) | OptionValue::List(_))
        }
    };
    if ok {
        Ok(())
    } else {
        Err(OptionError::TypeMismatch {
            option: spec.name.to_string(),
            expected: shape_name(spec.shape),
            actual: value.type_name().to_string(),
        })
    }
}

fn shape_name(shape: OptionShape) -> &'static str {
    match shape {
        OptionShape::Scalar => "scalar",
        OptionShape::List => "list",
        OptionShape::Mapping => "mapping",
        OptionShape::ScalarOrList => "scalar or list",
    }
}

/// Parses boolean-ish option text the way the original `Boolean` helper
/// does: case-insensitive, with an explicit set of truthy/falsy spellings
/// rather than relying on YAML's own (locale-sensitive, footgun-prone)
/// boolean coercion.
pub fn parse_boolean(text: &str) -> Result<bool, OptionError> {
    const TRUE_VALUES: &[&str] = &["TRUE", "YES", "1"];
    const FALSE_VALUES: &[&str] = &["FALSE", "NO", "0"];
    let upper = text.trim().to_uppercase();
    if TRUE_VALUES.contains(&upper.as_str()) {
        Ok(true)
    } else if FALSE_VALUES.contains(&upper.as_str()) {
        Ok(false)
    } else {
        Err(OptionError::InvalidEnumValue {
            option: "<boolean>".to_string(),
            value: text.to_string(),
            allowed: &["TRUE", "YES", "1", "FALSE", "NO", "0"],
        })
    }
}

/// Strips a `cond1:cond2:...:option` conditional prefix from a raw YAML key,
/// returning the bare option name used to look the option up in [`OPTIONS`].
pub fn bare_option_name(key: &str) -> &str {
    key.rsplit_once(':').map(|(_, option)| option).unwrap_or(key)
}

/// Parses a top-level jobs-file document into a name->value map of
/// recognized, type-checked options, keyed by the *raw* key (including any
/// conditional prefix) so the caller can still recover the conditions.
///
/// Preserves document order: conditional-key resolution relies on seeing
/// entries in the order they were written, so later keys with equally
/// specific conditions can override earlier ones (see `Resolver::set`).
///
/// An empty or whitespace-only document parses to zero options rather than
/// an error, so a caller sees an empty job list instead of a parse failure.
pub fn parse_document(
    yaml_contents: &str,
) -> Result<IndexMap<String, OptionValue>, OptionError> {
    let trimmed = yaml_contents.trim();
    if trimmed.is_empty() {
        return Ok(IndexMap::new());
    }

    let raw: serde_yaml::Value = serde_yaml::from_str(trimmed)
        .map_err(|e| OptionError::TypeMismatch {
            option: "<document>".to_string(),
            expected: "mapping",
            actual: e.to_string(),
        })?;

    if raw.is_null() {
        return Ok(IndexMap::new());
    }

    let mapping = raw.as_mapping().ok_or_else(|| OptionError::TypeMismatch {
        option: "<document>".to_string(),
        expected: "mapping",
        actual: "non-mapping document".to_string(),
    })?;

    let mut out = IndexMap::new();
    for (key, value) in mapping {
        let raw_key = key.as_str().ok_or_else(|| OptionError::TypeMismatch {
            option: "<key>".to_string(),
            expected: "string",
            actual: "non-string key".to_string(),
        })?;
        let bare = bare_option_name(raw_key);
        let spec = find_option(bare).ok_or_else(|| OptionError::UnknownOption(bare.to_string()))?;
        let parsed = OptionValue::from_yaml(value);
        check_shape(spec, &parsed)?;
        out.insert(raw_key.to_string(), parsed);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_option_name_strips_conditions() {
        assert_eq!(bare_option_name("planet-earth:junit_patterns"), "junit_patterns");
        assert_eq!(bare_option_name("junit_patterns"), "junit_patterns");
    }

    #[test]
    fn comma_list_splits_and_trims() {
        let value = OptionValue::Scalar("a, b,c".to_string());
        assert_eq!(value.as_comma_list(), vec!["a", "b", "c"]);
    }

    #[test]
    fn boolean_parses_known_spellings() {
        assert!(parse_boolean("yes").unwrap());
        assert!(!parse_boolean("NO").unwrap());
        assert!(parse_boolean("1").unwrap());
    }

    #[test]
    fn boolean_rejects_unknown_spelling() {
        assert!(parse_boolean("maybe").is_err());
    }

    #[test]
    fn parse_document_rejects_unknown_option() {
        let err = parse_document("not_a_real_option: 1").unwrap_err();
        assert_eq!(err, OptionError::UnknownOption("not_a_real_option".to_string()));
    }

    #[test]
    fn parse_document_rejects_wrong_shape() {
        let err = parse_document("git: [a, b]").unwrap_err();
        assert!(matches!(err, OptionError::TypeMismatch { .. }));
    }

    #[test]
    fn parse_document_accepts_conditional_key() {
        let doc = parse_document("windows:build_shell_commands: make").unwrap();
        assert!(doc.contains_key("windows:build_shell_commands"));
    }

    #[test]
    fn from_yaml_stringifies_non_string_scalars() {
        let raw: serde_yaml::Value = serde_yaml::from_str("true").unwrap();
        assert_eq!(OptionValue::from_yaml(&raw).as_scalar().unwrap(), "True");
    }

    #[test]
    fn parse_document_preserves_key_order() {
        let doc = parse_document("timeout: \"10\"\ncron: \"* * * * *\"\n").unwrap();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["timeout", "cron"]);
    }

    #[test]
    fn empty_document_yields_no_options() {
        assert!(parse_document("").unwrap().is_empty());
        assert!(parse_document("   \n  \n").unwrap().is_empty());
        assert!(parse_document("null").unwrap().is_empty());
    }
}
