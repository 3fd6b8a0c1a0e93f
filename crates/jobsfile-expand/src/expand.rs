//! Ties together matrix enumeration, conditional-key resolution, and
//! template substitution into the full per-row expansion algorithm.

use indexmap::IndexMap;
use jobsfile_model::options::{self, OptionValue};
use jobsfile_model::repository::Repository;

use crate::condition::{ConditionalKey, MATCH_ANY};
use crate::conditional::Resolver;
use crate::error::ExpandError;
use crate::matrix::{Matrix, MatrixRow};
use crate::template;

/// One fully expanded, fully resolved row: the matrix values chosen for it
/// and the final option map after conditional flattening and template
/// substitution. Converting this into a typed `JobDescriptor` is a
/// separate, non-fallible-on-expansion step (`jobsfile_model::descriptor`).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJob {
    pub repository: Repository,
    pub matrix_row: IndexMap<String, String>,
    /// Names of the matrix axes that declared more than one option, passed
    /// through so job naming and the default node label can tell a
    /// distinguishing axis from a single-valued one.
    pub multi_valued_axes: Vec<String>,
    pub options: IndexMap<String, OptionValue>,
}

/// Expands a parsed jobs-file document (as produced by
/// `jobsfile_model::options::parse_document`) against `repository`,
/// returning one [`ResolvedJob`] per surviving matrix row.
pub fn expand_document(
    repository: &Repository,
    raw_options: &IndexMap<String, OptionValue>,
) -> Result<Vec<ResolvedJob>, ExpandError> {
    // An empty (or whitespace-only) document has nothing to build a job
    // from, so it yields the empty job list rather than one job with no
    // options (unlike a document that has options but no `matrix:` key,
    // which still yields a single job).
    if raw_options.is_empty() {
        return Ok(Vec::new());
    }

    let matrix = match raw_options.get("matrix") {
        Some(value) => build_matrix(value)?,
        None => Matrix::new(),
    };

    let ignore_unmatchable = raw_options
        .get("ignore_unmatchable")
        .and_then(OptionValue::as_scalar)
        .map(|s| options::parse_boolean(&s).unwrap_or(false))
        .unwrap_or(false);

    if !ignore_unmatchable {
        check_unmatchable(raw_options, &matrix)?;
    }

    let branch_patterns = raw_options.get("branch_patterns").map(OptionValue::as_comma_list);

    let repo_name = repository
        .name()
        .unwrap_or_else(|_| repository.url().to_string());

    let multi_valued_axes = matrix.multi_valued_axes();

    let mut jobs = Vec::new();
    for row in matrix.rows() {
        if let Some(patterns) = &branch_patterns {
            if !patterns.iter().any(|p| matches_branch(p, repository.branch())) {
                continue;
            }
        }
        let dict = template::format_dict(repository.branch(), &repo_name, &row.simple);

        // Template substitution runs over the whole document first, then
        // conditional-key resolution walks every map/list nested inside it,
        // not just the top level: a condition inside e.g. a `git:` or
        // `trigger_jobs:` sub-map is resolved the same way a top-level one is.
        let formatted = expand_map(raw_options, &dict)?;
        let mut options = resolve_conditionals(&formatted, &row, TOP_LEVEL_ONLY_KEYS)?;
        // `exclude` is resolved like any other (possibly conditional) option,
        // then consumed here rather than left in the row's option map: it
        // decides whether the row exists at all, it isn't a generator option.
        let excluded = options
            .shift_remove("exclude")
            .and_then(|v| v.as_scalar())
            .map(|s| s == "yes")
            .unwrap_or(false);
        if excluded {
            continue;
        }

        jobs.push(ResolvedJob {
            repository: repository.clone(),
            matrix_row: row.simple.clone(),
            multi_valued_axes: multi_valued_axes.clone(),
            options,
        });
    }

    Ok(jobs)
}

/// Start-anchored only, matching the original's `re.match` (not `re.fullmatch`):
/// `branch_patterns: [master]` matches branch `master-2`.
fn matches_branch(pattern: &str, branch: &str) -> bool {
    regex::Regex::new(&format!("^(?:{pattern})"))
        .map(|re| re.is_match(branch))
        .unwrap_or(false)
}

/// Keys only meaningful at the document's top level, skipped during
/// conditional resolution there: they're pipeline directives consumed
/// earlier (matrix expansion, branch filtering), not generator options.
const TOP_LEVEL_ONLY_KEYS: &[&str] = &["matrix", "branch_patterns", "ignore_unmatchable"];

/// Resolves conditional keys in `raw` for `row`, honoring specificity and
/// document-order tie-breaking (see [`Resolver::set`]), then recurses into
/// every surviving map/list value so nested conditional keys are resolved
/// too, matching the original's recursive `_IterDicts` walk.
fn resolve_conditionals(
    raw: &IndexMap<String, OptionValue>,
    row: &MatrixRow,
    skip_bare: &[&str],
) -> Result<IndexMap<String, OptionValue>, ExpandError> {
    let mut resolver = Resolver::new();
    for (raw_key, value) in raw {
        let bare = options::bare_option_name(raw_key);
        if skip_bare.contains(&bare) {
            continue;
        }
        let key = ConditionalKey::parse(raw_key)?;
        if !key.conditions.matches_row(row) {
            continue;
        }
        resolver.set(&key.option, key.conditions.clone(), value.clone())?;
    }

    let mut out = IndexMap::new();
    for (key, value) in resolver.into_options() {
        out.insert(key, resolve_conditionals_in_value(&value, row)?);
    }
    Ok(out)
}

fn resolve_conditionals_in_value(value: &OptionValue, row: &MatrixRow) -> Result<OptionValue, ExpandError> {
    match value {
        OptionValue::Map(map) => Ok(OptionValue::Map(resolve_conditionals(map, row, &[])?)),
        OptionValue::List(items) => {
            let resolved = items
                .iter()
                .map(|item| resolve_conditionals_in_value(item, row))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(OptionValue::List(resolved))
        }
        OptionValue::Scalar(_) => Ok(value.clone()),
    }
}

fn build_matrix(value: &OptionValue) -> Result<Matrix, ExpandError> {
    let map = value.as_map().cloned().unwrap_or_default();
    let mut raw = IndexMap::new();
    for (axis, values) in map {
        let options = values
            .as_list()
            .map(|items| items.iter().filter_map(OptionValue::as_scalar).collect())
            .unwrap_or_else(|| values.as_comma_list());
        raw.insert(axis, options);
    }
    Matrix::from_raw(raw)
}

/// Checks every conditional key anywhere in the document (including inside
/// nested maps/lists, as the original's recursive `_IterDicts` precheck
/// does) against the matrix's known axis values (or [`MATCH_ANY`] for axes
/// the matrix doesn't declare, e.g. conditions on `branch`), failing fast on
/// any condition that could never match a real row.
fn check_unmatchable(raw_options: &IndexMap<String, OptionValue>, matrix: &Matrix) -> Result<(), ExpandError> {
    let mut dicts = Vec::new();
    collect_dicts(raw_options, &mut dicts);

    for dict in dicts {
        for raw_key in dict.keys() {
            let key = ConditionalKey::parse(raw_key)?;
            for condition in &key.conditions.0 {
                let values = match matrix.known_values(&condition.axis) {
                    Some(values) => values,
                    None => vec![MATCH_ANY],
                };
                if !condition.matches(&values) {
                    return Err(ExpandError::UnmatchableCondition {
                        condition: format!("{}-{}", condition.axis, condition.pattern),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Collects every map nested anywhere inside `map` (including `map` itself),
/// walking through list elements too.
fn collect_dicts<'a>(map: &'a IndexMap<String, OptionValue>, out: &mut Vec<&'a IndexMap<String, OptionValue>>) {
    out.push(map);
    for value in map.values() {
        collect_dicts_in_value(value, out);
    }
}

fn collect_dicts_in_value<'a>(value: &'a OptionValue, out: &mut Vec<&'a IndexMap<String, OptionValue>>) {
    match value {
        OptionValue::Map(map) => collect_dicts(map, out),
        OptionValue::List(items) => {
            for item in items {
                collect_dicts_in_value(item, out);
            }
        }
        OptionValue::Scalar(_) => {}
    }
}

/// Template-substitutes every string in `raw` (keys and values, recursively
/// through nested maps/lists) against `dict`.
fn expand_map(
    raw: &IndexMap<String, OptionValue>,
    dict: &IndexMap<String, String>,
) -> Result<IndexMap<String, OptionValue>, ExpandError> {
    let mut out = IndexMap::new();
    for (k, v) in raw {
        let expanded_key = template::expand(k, dict)?;
        out.insert(expanded_key, expand_value(v, dict)?);
    }
    Ok(out)
}

fn expand_value(value: &OptionValue, dict: &IndexMap<String, String>) -> Result<OptionValue, ExpandError> {
    match value {
        OptionValue::Scalar(s) => Ok(OptionValue::Scalar(template::expand(s, dict)?)),
        OptionValue::List(items) => {
            let expanded = items
                .iter()
                .map(|item| expand_value(item, dict))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(OptionValue::List(expanded))
        }
        OptionValue::Map(map) => {
            let mut out = IndexMap::new();
            for (k, v) in map {
                let expanded_key = template::expand(k, dict)?;
                out.insert(expanded_key, expand_value(v, dict)?);
            }
            Ok(OptionValue::Map(out))
        }
    }
}
