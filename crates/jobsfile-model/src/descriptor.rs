//! The compiled job descriptor: a fixed record with one nullable field per
//! recognized option.
//!
//! The original implementation represents a parsed job as an object with
//! dynamically-set attributes, one per recognized option name, discovered
//! through `getattr`/`setattr`. Rust has no equivalent reflective facility
//! that's worth reaching for here, so `JobDescriptor` is instead a plain
//! struct with one `Option<T>` field per recognized option: invalid field
//! names are caught by the compiler, not discovered at runtime.

use indexmap::IndexMap;

use crate::error::OptionError;
use crate::options::{self, OptionValue};
use crate::repository::Repository;

/// `git`'s SCM-related toggles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GitOptions {
    pub recursive_submodules: Option<bool>,
    pub tags: Option<bool>,
    pub clean_checkout: Option<bool>,
    pub lfs: Option<bool>,
    pub target_dir: Option<String>,
}

/// One additional repository to check out alongside the job's primary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalRepository {
    pub repository: Repository,
    pub target_dir: Option<String>,
}

/// One threshold level's per-metric values, e.g. `coverage.healthy.{method,
/// line, conditional}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoverageThreshold {
    pub method: f64,
    pub line: f64,
    pub conditional: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageOptions {
    pub report_pattern: String,
    pub healthy: CoverageThreshold,
    pub unhealthy: CoverageThreshold,
    pub failing: CoverageThreshold,
}

/// `email_notification`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailNotificationOptions {
    pub recipients: Vec<String>,
    pub notify_every_build: Option<bool>,
    pub notify_individually: Option<bool>,
}

/// `notify_stash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyStashOptions {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// `notification`, a generic webhook-style build notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOptions {
    pub url: String,
    pub protocol: Option<String>,
    pub format: Option<String>,
}

/// `slack`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackOptions {
    pub team_domain: Option<String>,
    pub auth_token: Option<String>,
    pub room: Option<String>,
}

/// `warnings`, per-parser pattern sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WarningsOptions {
    pub console: Vec<String>,
    pub file_patterns: IndexMap<String, Vec<String>>,
}

/// One upstream/downstream trigger relation (`trigger_jobs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerJobsOptions {
    pub names: Vec<String>,
    /// `PARAM=VALUE` pairs passed to the triggered builds, predefined via
    /// the parameterized-trigger plugin.
    pub parameters: Vec<String>,
    /// One of `SUCCESS`, `UNSTABLE`, `FAILED`, `ALWAYS`. Defaults to `SUCCESS`.
    pub condition: String,
}

impl Default for TriggerJobsOptions {
    fn default() -> Self {
        TriggerJobsOptions {
            names: Vec::new(),
            parameters: Vec::new(),
            condition: "SUCCESS".to_string(),
        }
    }
}

/// The Jenkins parameter type a build parameter renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    Choice { choices: Vec<String> },
    String,
}

/// One Jenkins build parameter (`parameters`), keyed in the jobs-file by its
/// kind: `{choice: {name: ..., choices: [...]}}` or `{string: {name: ..., default: ...}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub kind: ParameterKind,
    pub name: String,
    pub default: Option<String>,
    pub description: Option<String>,
}

/// A single fully-expanded, fully-resolved job, ready for XML generation.
///
/// Produced once per matrix row by the expander; never mutated afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    pub repository: Repository,
    /// The row's axis values, canonical-alias -> chosen value, used for
    /// `{placeholder}` substitution and for deriving the job's display name.
    pub matrix_row: IndexMap<String, String>,
    /// Names of the matrix axes that declared more than one value. Job
    /// naming and the default `assignedNode` label only include axes named
    /// here: a single-valued axis never distinguishes one job from another.
    pub multi_valued_axes: Vec<String>,

    pub additional_repositories: Option<Vec<AdditionalRepository>>,
    pub auth_token: Option<String>,
    pub boosttest_patterns: Option<Vec<String>>,
    pub build_batch_commands: Option<Vec<String>>,
    pub build_shell_commands: Option<Vec<String>>,
    pub build_python_commands: Option<Vec<String>>,
    pub console_color: Option<String>,
    pub coverage: Option<CoverageOptions>,
    pub cron: Option<String>,
    pub custom_workspace: Option<String>,
    pub description_regex: Option<String>,
    pub display_name: Option<String>,
    pub email_notification: Option<EmailNotificationOptions>,
    pub git: Option<GitOptions>,
    pub junit_patterns: Option<Vec<String>>,
    pub jsunit_patterns: Option<Vec<String>>,
    pub label_expression: Option<String>,
    pub notify_stash: Option<NotifyStashOptions>,
    pub notification: Option<NotificationOptions>,
    pub parameters: Option<Vec<Parameter>>,
    pub scm_poll: Option<String>,
    pub slack: Option<SlackOptions>,
    pub timeout: Option<u32>,
    pub timeout_no_activity: Option<u32>,
    pub timestamps: Option<bool>,
    pub trigger_jobs: Option<TriggerJobsOptions>,
    pub warnings: Option<WarningsOptions>,
}

impl JobDescriptor {
    pub fn new(repository: Repository, matrix_row: IndexMap<String, String>) -> Self {
        JobDescriptor {
            repository,
            matrix_row,
            multi_valued_axes: Vec::new(),
            additional_repositories: None,
            auth_token: None,
            boosttest_patterns: None,
            build_batch_commands: None,
            build_shell_commands: None,
            build_python_commands: None,
            console_color: None,
            coverage: None,
            cron: None,
            custom_workspace: None,
            description_regex: None,
            display_name: None,
            email_notification: None,
            git: None,
            junit_patterns: None,
            jsunit_patterns: None,
            label_expression: None,
            notify_stash: None,
            notification: None,
            parameters: None,
            scm_poll: None,
            slack: None,
            timeout: None,
            timeout_no_activity: None,
            timestamps: None,
            trigger_jobs: None,
            warnings: None,
        }
    }

    /// The group name jobs from this descriptor's repository/branch share,
    /// used as a job-name prefix: `{repo-name}-{branch}`.
    pub fn job_group(&self) -> Result<String, crate::repository::RepositoryError> {
        Ok(format!("{}-{}", self.repository.name()?, self.repository.branch()))
    }

    /// Builds a `JobDescriptor` from a row's fully resolved, post-expansion
    /// option map (as produced by `jobsfile_expand::expand_document`),
    /// type-checking each recognized option's value on the way in.
    pub fn from_options(
        repository: Repository,
        matrix_row: IndexMap<String, String>,
        multi_valued_axes: Vec<String>,
        options: &IndexMap<String, OptionValue>,
    ) -> Result<Self, OptionError> {
        let mut job = JobDescriptor::new(repository, matrix_row);
        job.multi_valued_axes = multi_valued_axes;

        for (name, value) in options {
            match name.as_str() {
                "additional_repositories" => {
                    job.additional_repositories = Some(parse_additional_repositories(value)?);
                }
                "auth_token" => job.auth_token = Some(expect_scalar("auth_token", value)?),
                "boosttest_patterns" => job.boosttest_patterns = Some(value.as_comma_list()),
                "build_batch_commands" => job.build_batch_commands = Some(value.as_comma_list()),
                "build_shell_commands" => job.build_shell_commands = Some(value.as_comma_list()),
                "build_python_commands" => job.build_python_commands = Some(value.as_comma_list()),
                "console_color" => job.console_color = Some(expect_scalar("console_color", value)?),
                "coverage" => job.coverage = Some(parse_coverage(value)?),
                "cron" => job.cron = Some(expect_scalar("cron", value)?),
                "custom_workspace" => job.custom_workspace = Some(expect_scalar("custom_workspace", value)?),
                "description_regex" => job.description_regex = Some(expect_scalar("description_regex", value)?),
                "display_name" => job.display_name = Some(expect_scalar("display_name", value)?),
                "email_notification" => job.email_notification = Some(parse_email_notification(value)?),
                "git" => job.git = Some(parse_git(value)?),
                "junit_patterns" => job.junit_patterns = Some(value.as_comma_list()),
                "jsunit_patterns" => job.jsunit_patterns = Some(value.as_comma_list()),
                "label_expression" => job.label_expression = Some(expect_scalar("label_expression", value)?),
                "notify_stash" => job.notify_stash = Some(parse_notify_stash(value)?),
                "notification" => job.notification = Some(parse_notification(value)?),
                "parameters" => job.parameters = Some(parse_parameters(value)?),
                "scm_poll" => job.scm_poll = Some(expect_scalar("scm_poll", value)?),
                "slack" => job.slack = Some(parse_slack(value)?),
                "timeout" => job.timeout = Some(expect_u32("timeout", value)?),
                "timeout_no_activity" => job.timeout_no_activity = Some(expect_u32("timeout_no_activity", value)?),
                "timestamps" => job.timestamps = Some(options::parse_boolean(&expect_scalar("timestamps", value)?)?),
                "trigger_jobs" => job.trigger_jobs = Some(parse_trigger_jobs(value)?),
                "warnings" => job.warnings = Some(parse_warnings(value)?),
                other => return Err(OptionError::UnknownOption(other.to_string())),
            }
        }

        Ok(job)
    }
}

fn expect_scalar(option: &str, value: &OptionValue) -> Result<String, OptionError> {
    value.as_scalar().ok_or_else(|| OptionError::TypeMismatch {
        option: option.to_string(),
        expected: "scalar",
        actual: "non-scalar".to_string(),
    })
}

fn expect_u32(option: &str, value: &OptionValue) -> Result<u32, OptionError> {
    let scalar = expect_scalar(option, value)?;
    scalar.parse().map_err(|_| OptionError::TypeMismatch {
        option: option.to_string(),
        expected: "integer",
        actual: scalar,
    })
}

fn expect_f64(option: &str, map: &IndexMap<String, OptionValue>, field: &'static str) -> Result<f64, OptionError> {
    let value = map.get(field).ok_or(OptionError::MissingRequired { option: option.to_string(), field })?;
    let scalar = expect_scalar(field, value)?;
    scalar.parse().map_err(|_| OptionError::TypeMismatch {
        option: option.to_string(),
        expected: "number",
        actual: scalar,
    })
}

fn expect_map<'a>(option: &str, value: &'a OptionValue) -> Result<&'a IndexMap<String, OptionValue>, OptionError> {
    value.as_map().ok_or_else(|| OptionError::TypeMismatch {
        option: option.to_string(),
        expected: "mapping",
        actual: "non-mapping".to_string(),
    })
}

fn optional_bool(map: &IndexMap<String, OptionValue>, field: &str) -> Result<Option<bool>, OptionError> {
    match map.get(field) {
        None => Ok(None),
        Some(v) => Ok(Some(options::parse_boolean(&expect_scalar(field, v)?)?)),
    }
}

fn optional_string(map: &IndexMap<String, OptionValue>, field: &str) -> Result<Option<String>, OptionError> {
    match map.get(field) {
        None => Ok(None),
        Some(v) => Ok(Some(expect_scalar(field, v)?)),
    }
}

fn parse_additional_repositories(value: &OptionValue) -> Result<Vec<AdditionalRepository>, OptionError> {
    let items = value.as_list().ok_or_else(|| OptionError::TypeMismatch {
        option: "additional_repositories".to_string(),
        expected: "list",
        actual: "non-list".to_string(),
    })?;
    items
        .iter()
        .map(|item| {
            let map = expect_map("additional_repositories", item)?;
            let url = map
                .get("url")
                .ok_or(OptionError::MissingRequired { option: "additional_repositories".to_string(), field: "url" })
                .and_then(|v| expect_scalar("url", v))?;
            let branch = optional_string(map, "branch")?.unwrap_or_else(|| Repository::DEFAULT_BRANCH.to_string());
            let target_dir = optional_string(map, "target_dir")?;
            Ok(AdditionalRepository {
                repository: Repository::new(url, branch),
                target_dir,
            })
        })
        .collect()
}

fn parse_coverage_threshold(
    option: &str,
    map: &IndexMap<String, OptionValue>,
    key: &'static str,
    default: f64,
) -> Result<CoverageThreshold, OptionError> {
    let sub = map.get(key).and_then(OptionValue::as_map);
    let Some(sub) = sub else {
        return Ok(CoverageThreshold { method: default, line: default, conditional: default });
    };
    Ok(CoverageThreshold {
        method: expect_f64(option, sub, "method").unwrap_or(default),
        line: expect_f64(option, sub, "line").unwrap_or(default),
        conditional: expect_f64(option, sub, "conditional").unwrap_or(default),
    })
}

fn parse_coverage(value: &OptionValue) -> Result<CoverageOptions, OptionError> {
    let map = expect_map("coverage", value)?;
    let report_pattern = map
        .get("report_pattern")
        .ok_or(OptionError::MissingRequired { option: "coverage".to_string(), field: "report_pattern" })
        .and_then(|v| expect_scalar("report_pattern", v))?;
    Ok(CoverageOptions {
        report_pattern,
        healthy: parse_coverage_threshold("coverage", map, "healthy", 80.0)?,
        unhealthy: parse_coverage_threshold("coverage", map, "unhealthy", 0.0)?,
        failing: parse_coverage_threshold("coverage", map, "failing", 0.0)?,
    })
}

fn parse_email_notification(value: &OptionValue) -> Result<EmailNotificationOptions, OptionError> {
    let map = expect_map("email_notification", value)?;
    let recipients = map.get("recipients").map(OptionValue::as_comma_list).unwrap_or_default();
    Ok(EmailNotificationOptions {
        recipients,
        notify_every_build: optional_bool(map, "notify_every_build")?,
        notify_individually: optional_bool(map, "notify_individually")?,
    })
}

fn parse_git(value: &OptionValue) -> Result<GitOptions, OptionError> {
    let map = expect_map("git", value)?;
    Ok(GitOptions {
        recursive_submodules: optional_bool(map, "recursive_submodules")?,
        tags: optional_bool(map, "tags")?,
        clean_checkout: optional_bool(map, "clean_checkout")?,
        lfs: optional_bool(map, "lfs")?,
        target_dir: optional_string(map, "target_dir")?,
    })
}

fn parse_notify_stash(value: &OptionValue) -> Result<NotifyStashOptions, OptionError> {
    let map = expect_map("notify_stash", value)?;
    Ok(NotifyStashOptions {
        url: map
            .get("url")
            .ok_or(OptionError::MissingRequired { option: "notify_stash".to_string(), field: "url" })
            .and_then(|v| expect_scalar("url", v))?,
        username: map
            .get("username")
            .ok_or(OptionError::MissingRequired { option: "notify_stash".to_string(), field: "username" })
            .and_then(|v| expect_scalar("username", v))?,
        password: map
            .get("password")
            .ok_or(OptionError::MissingRequired { option: "notify_stash".to_string(), field: "password" })
            .and_then(|v| expect_scalar("password", v))?,
    })
}

fn parse_notification(value: &OptionValue) -> Result<NotificationOptions, OptionError> {
    let map = expect_map("notification", value)?;
    Ok(NotificationOptions {
        url: map
            .get("url")
            .ok_or(OptionError::MissingRequired { option: "notification".to_string(), field: "url" })
            .and_then(|v| expect_scalar("url", v))?,
        protocol: optional_string(map, "protocol")?,
        format: optional_string(map, "format")?,
    })
}

fn parse_slack(value: &OptionValue) -> Result<SlackOptions, OptionError> {
    let map = expect_map("slack", value)?;
    Ok(SlackOptions {
        team_domain: optional_string(map, "team_domain")?,
        auth_token: optional_string(map, "auth_token")?,
        room: optional_string(map, "room")?,
    })
}

fn parse_parameters(value: &OptionValue) -> Result<Vec<Parameter>, OptionError> {
    let items = value.as_list().ok_or_else(|| OptionError::TypeMismatch {
        option: "parameters".to_string(),
        expected: "list",
        actual: "non-list".to_string(),
    })?;
    items.iter().map(parse_parameter).collect()
}

/// Each parameter entry is a single-key mapping naming its Jenkins type,
/// e.g. `{choice: {name: mode, choices: [fast, slow]}}` or
/// `{string: {name: tag, default: latest}}`.
fn parse_parameter(item: &OptionValue) -> Result<Parameter, OptionError> {
    let outer = expect_map("parameters", item)?;
    let (kind_name, inner) = outer
        .iter()
        .next()
        .ok_or(OptionError::MissingRequired { option: "parameters".to_string(), field: "choice|string" })?;
    let inner = expect_map("parameters", inner)?;
    let name = inner
        .get("name")
        .ok_or(OptionError::MissingRequired { option: "parameters".to_string(), field: "name" })
        .and_then(|v| expect_scalar("name", v))?;
    let description = optional_string(inner, "description")?;

    match kind_name.as_str() {
        "choice" => {
            let choices = inner.get("choices").map(OptionValue::as_comma_list).unwrap_or_default();
            Ok(Parameter { kind: ParameterKind::Choice { choices }, name, default: None, description })
        }
        "string" => {
            let default = optional_string(inner, "default")?;
            Ok(Parameter { kind: ParameterKind::String, name, default, description })
        }
        other => Err(OptionError::InvalidEnumValue {
            option: "parameters".to_string(),
            value: other.to_string(),
            allowed: &["choice", "string"],
        }),
    }
}

fn parse_trigger_jobs(value: &OptionValue) -> Result<TriggerJobsOptions, OptionError> {
    let map = expect_map("trigger_jobs", value)?;
    let names = map.get("names").map(OptionValue::as_comma_list).unwrap_or_default();
    let parameters = map.get("parameters").map(OptionValue::as_comma_list).unwrap_or_default();
    let condition = match map.get("condition") {
        Some(value) => expect_scalar("trigger_jobs.condition", value)?,
        None => "SUCCESS".to_string(),
    };
    const VALID_CONDITIONS: &[&str] = &["SUCCESS", "UNSTABLE", "FAILED", "ALWAYS"];
    if !VALID_CONDITIONS.contains(&condition.as_str()) {
        return Err(OptionError::InvalidEnumValue {
            option: "trigger_jobs.condition".to_string(),
            value: condition,
            allowed: VALID_CONDITIONS,
        });
    }
    Ok(TriggerJobsOptions { names, parameters, condition })
}

fn parse_warnings(value: &OptionValue) -> Result<WarningsOptions, OptionError> {
    let map = expect_map("warnings", value)?;
    let console = map.get("console").map(OptionValue::as_comma_list).unwrap_or_default();
    let mut file_patterns = IndexMap::new();
    for (parser_name, patterns) in map {
        if parser_name == "console" {
            continue;
        }
        file_patterns.insert(parser_name.clone(), patterns.as_comma_list());
    }
    Ok(WarningsOptions { console, file_patterns })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_descriptor_has_no_options_set() {
        let repo = Repository::with_default_branch("https://example.com/org/repo.git");
        let job = JobDescriptor::new(repo, IndexMap::new());
        assert!(job.git.is_none());
        assert!(job.coverage.is_none());
    }

    #[test]
    fn job_group_combines_name_and_branch() {
        let repo = Repository::new("https://example.com/org/repo.git", "release-1.0");
        let job = JobDescriptor::new(repo, IndexMap::new());
        assert_eq!(job.job_group().unwrap(), "repo-release-1.0");
    }

    #[test]
    fn trigger_jobs_defaults_condition_to_success() {
        let mut map = IndexMap::new();
        map.insert("names".to_string(), OptionValue::Scalar("downstream".to_string()));
        let trigger = parse_trigger_jobs(&OptionValue::Map(map)).unwrap();
        assert_eq!(trigger.condition, "SUCCESS");
        assert!(trigger.parameters.is_empty());
        assert_eq!(trigger.names, vec!["downstream".to_string()]);
    }

    #[test]
    fn trigger_jobs_parses_parameters_and_condition() {
        let mut map = IndexMap::new();
        map.insert("names".to_string(), OptionValue::Scalar("downstream".to_string()));
        map.insert("condition".to_string(), OptionValue::Scalar("UNSTABLE".to_string()));
        map.insert(
            "parameters".to_string(),
            OptionValue::List(vec![OptionValue::Scalar("FOO=bar".to_string())]),
        );
        let trigger = parse_trigger_jobs(&OptionValue::Map(map)).unwrap();
        assert_eq!(trigger.condition, "UNSTABLE");
        assert_eq!(trigger.parameters, vec!["FOO=bar".to_string()]);
    }

    #[test]
    fn trigger_jobs_rejects_invalid_condition() {
        let mut map = IndexMap::new();
        map.insert("names".to_string(), OptionValue::Scalar("downstream".to_string()));
        map.insert("condition".to_string(), OptionValue::Scalar("MAYBE".to_string()));
        let err = parse_trigger_jobs(&OptionValue::Map(map)).unwrap_err();
        assert!(matches!(err, OptionError::InvalidEnumValue { .. }));
    }
}
