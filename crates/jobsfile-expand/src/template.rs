//! `{placeholder}` template substitution.
//!
//! Ported from the original's use of Python's `str.format`: every
//! `{placeholder}` span in a string is replaced with a value from a flat
//! name->value dictionary. An unresolved placeholder is an error rather
//! than being left in place or silently dropped, the same way `str.format`
//! raises `KeyError` on a missing field.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::ExpandError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("valid regex"));

/// Substitutes every `{name}` placeholder in `text` with `dict[name]`.
pub fn expand(text: &str, dict: &IndexMap<String, String>) -> Result<String, ExpandError> {
    let mut err = None;
    let result = PLACEHOLDER.replace_all(text, |caps: &regex::Captures| {
        let name = &caps[1];
        match dict.get(name) {
            Some(value) => value.clone(),
            None => {
                err.get_or_insert_with(|| ExpandError::MissingPlaceholder {
                    placeholder: name.to_string(),
                });
                String::new()
            }
        }
    });
    match err {
        Some(e) => Err(e),
        None => Ok(result.into_owned()),
    }
}

/// Builds the format dictionary used for a single matrix row: `branch` and
/// `name` (the repository's derived short name), overlaid with the row's
/// simple (canonical-alias) axis values.
pub fn format_dict(
    branch: &str,
    repository_name: &str,
    simple_row: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut dict = IndexMap::new();
    dict.insert("branch".to_string(), branch.to_string());
    dict.insert("name".to_string(), repository_name.to_string());
    for (k, v) in simple_row {
        dict.insert(k.clone(), v.clone());
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholders() {
        let mut dict = IndexMap::new();
        dict.insert("branch".to_string(), "master".to_string());
        assert_eq!(expand("build-{branch}", &dict).unwrap(), "build-master");
    }

    #[test]
    fn errors_on_unresolved_placeholder() {
        let dict = IndexMap::new();
        let err = expand("build-{branch}", &dict).unwrap_err();
        assert_eq!(
            err,
            ExpandError::MissingPlaceholder {
                placeholder: "branch".to_string()
            }
        );
    }

    #[test]
    fn format_dict_overlays_simple_row_on_branch_and_name() {
        let mut row = IndexMap::new();
        row.insert("platform".to_string(), "linux".to_string());
        let dict = format_dict("master", "my-repo", &row);
        assert_eq!(dict["branch"], "master");
        assert_eq!(dict["name"], "my-repo");
        assert_eq!(dict["platform"], "linux");
    }
}
