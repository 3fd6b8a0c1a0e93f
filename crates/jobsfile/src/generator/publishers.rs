//! Setters for the post-build publisher options: xunit-family test result
//! patterns, coverage, warnings, trigger jobs, and the various
//! notification integrations.
//!
//! `set_email_notification`'s Mailer block must be registered last among
//! publishers (enforced by call order in `generator::generate`, not by
//! anything in this module), since Jenkins treats the Mailer's "send email
//! on failure" step as a final summary step that should see every other
//! publisher's effect on the build result.

use jobsfile_model::descriptor::{CoverageThreshold, JobDescriptor, WarningsOptions};
use xmltree::Document;

use crate::error::GeneratorError;

fn set(doc: &mut Document, path: &str, value: impl Into<String>) -> Result<(), GeneratorError> {
    doc.set(path, value).map_err(|e| GeneratorError::from((path, e)))
}

/// Shared xunit scaffolding: every test-result publisher family (JUnit,
/// BoostTest, JSUnit) writes the same shape of `<types>` entry under the
/// one `xunit` publisher, differing only in the tool-specific type tag.
fn set_xunit(doc: &mut Document, tool_tag: &str, patterns: &[String]) -> Result<(), GeneratorError> {
    if patterns.is_empty() {
        return Ok(());
    }
    // Only the first path forces a new `tool_tag` sibling; every later path
    // below reuses it by its bare tag, the same way `set_email_notification`
    // reuses the `Mailer` element it creates with its first write.
    let entry = doc
        .get_or_create(&format!("publishers/xunit/types/{tool_tag}+"))
        .map_err(|e| GeneratorError::from(("publishers/xunit/types", e)))?;
    set_on(entry, "pattern", patterns.join(","))?;
    set_on(entry, "skipNoTestFiles", "false")?;
    set_on(entry, "failIfNotNew", "true")?;
    set_on(entry, "deleteOutputFiles", "true")?;
    set_on(entry, "stopProcessingIfError", "true")?;
    Ok(())
}

fn set_on(element: &mut xmltree::Element, path: &str, value: impl Into<String>) -> Result<(), GeneratorError> {
    element.set(path, value).map_err(|e| GeneratorError::from((path, e)))
}

pub fn set_junit_patterns(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(patterns) = &job.junit_patterns {
        set_xunit(doc, "JUnitType", patterns)?;
    }
    Ok(())
}

pub fn set_boosttest_patterns(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(patterns) = &job.boosttest_patterns {
        set_xunit(doc, "BoostTestJunitHudsonTestType", patterns)?;
    }
    Ok(())
}

pub fn set_jsunit_patterns(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(patterns) = &job.jsunit_patterns {
        set_xunit(doc, "JSUnitType", patterns)?;
    }
    Ok(())
}

fn format_metric_value(threshold: f64) -> String {
    // Jenkins's cobertura plugin stores coverage thresholds as integers
    // scaled by 100000 (i.e. a percentage with five fractional digits).
    ((threshold * 100_000.0).round() as i64).to_string()
}

fn write_threshold(doc: &mut Document, level_name: &str, threshold: &CoverageThreshold) -> Result<(), GeneratorError> {
    let base = "publishers/hudson.plugins.cobertura.CoberturaPublisher";
    set(doc, &format!("{base}/method{level_name}"), format_metric_value(threshold.method))?;
    set(doc, &format!("{base}/line{level_name}"), format_metric_value(threshold.line))?;
    set(doc, &format!("{base}/conditional{level_name}"), format_metric_value(threshold.conditional))?;
    Ok(())
}

pub fn set_coverage(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    let Some(coverage) = &job.coverage else {
        return Ok(());
    };
    set(
        doc,
        "publishers/hudson.plugins.cobertura.CoberturaPublisher/coberturaReportFile",
        coverage.report_pattern.clone(),
    )?;
    write_threshold(doc, "Healthy", &coverage.healthy)?;
    write_threshold(doc, "Unhealthy", &coverage.unhealthy)?;
    write_threshold(doc, "Failing", &coverage.failing)?;
    Ok(())
}

pub fn set_warnings(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    let Some(warnings) = &job.warnings else {
        return Ok(());
    };
    for parser in &warnings.console {
        let entry = doc
            .get_or_create("publishers/hudson.plugins.warnings.WarningsPublisher/consoleParsers/hudson.plugins.warnings.ConsoleParser+")
            .map_err(|e| GeneratorError::from(("publishers/.../consoleParsers", e)))?;
        set_on(entry, "parserName", parser.clone())?;
    }
    for (parser, patterns) in &warnings_file_entries(warnings) {
        let entry = doc
            .get_or_create("publishers/hudson.plugins.warnings.WarningsPublisher/parserConfigurations/hudson.plugins.warnings.ParserConfiguration+")
            .map_err(|e| GeneratorError::from(("publishers/.../parserConfigurations", e)))?;
        set_on(entry, "parserName", parser.clone())?;
        set_on(entry, "pattern", patterns.join(","))?;
    }
    Ok(())
}

fn warnings_file_entries(warnings: &WarningsOptions) -> Vec<(String, Vec<String>)> {
    warnings.file_patterns.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Triggers other jobs via the parameterized-trigger plugin. Predefined
/// `PARAM=VALUE` parameters are passed along verbatim; with none, the
/// config marks `configs` as an empty list and triggers with no parameters.
pub fn set_trigger_jobs(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    let Some(trigger) = &job.trigger_jobs else {
        return Ok(());
    };
    if trigger.names.is_empty() {
        return Ok(());
    }
    doc.set_attr(
        "publishers/hudson.plugins.parameterizedtrigger.BuildTrigger@plugin",
        "parameterized-trigger@2.33",
    )
    .map_err(|e| GeneratorError::from(("publishers/.../BuildTrigger@plugin", e)))?;

    let config_path = "publishers/hudson.plugins.parameterizedtrigger.BuildTrigger/configs/hudson.plugins.parameterizedtrigger.BuildTriggerConfig";
    if trigger.parameters.is_empty() {
        doc.set_attr(&format!("{config_path}/configs@class"), "empty-list")
            .map_err(|e| GeneratorError::from(("configs@class", e)))?;
    } else {
        set(
            doc,
            &format!("{config_path}/configs/hudson.plugins.parameterizedtrigger.PredefinedBuildParameters/properties"),
            trigger.parameters.join(" "),
        )?;
    }
    set(doc, &format!("{config_path}/projects"), trigger.names.join(", "))?;
    set(doc, &format!("{config_path}/condition"), trigger.condition.clone())?;
    set(doc, &format!("{config_path}/triggerWithNoParameters"), trigger.parameters.is_empty().to_string())?;
    set(doc, &format!("{config_path}/triggerFromChildProjects"), "false")?;
    Ok(())
}

pub fn set_notify_stash(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(stash) = &job.notify_stash {
        set(doc, "publishers/org.jenkinsci.plugins.stashNotifier.StashNotifier/stashServerBaseUrl", stash.url.clone())?;
        set(doc, "publishers/org.jenkinsci.plugins.stashNotifier.StashNotifier/stashUserName", stash.username.clone())?;
        set(doc, "publishers/org.jenkinsci.plugins.stashNotifier.StashNotifier/stashUserPassword", stash.password.clone())?;
    }
    Ok(())
}

pub fn set_notification(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(notification) = &job.notification {
        let entry = doc
            .get_or_create("properties/com.tikal.hudson.plugins.notification.HudsonNotificationProperty/endpoints/com.tikal.hudson.plugins.notification.Endpoint+")
            .map_err(|e| GeneratorError::from(("properties/.../endpoints", e)))?;
        set_on(entry, "url", notification.url.clone())?;
        set_on(entry, "protocol", notification.protocol.clone().unwrap_or_else(|| "HTTP".to_string()))?;
        set_on(entry, "format", notification.format.clone().unwrap_or_else(|| "JSON".to_string()))?;
    }
    Ok(())
}

pub fn set_slack(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(slack) = &job.slack {
        if let Some(team) = &slack.team_domain {
            set(doc, "properties/jenkins.plugins.slack.SlackNotifier_-SlackJobProperty/teamDomain", team.clone())?;
        }
        if let Some(token) = &slack.auth_token {
            set(doc, "properties/jenkins.plugins.slack.SlackNotifier_-SlackJobProperty/authToken", token.clone())?;
        }
        if let Some(room) = &slack.room {
            set(doc, "properties/jenkins.plugins.slack.SlackNotifier_-SlackJobProperty/room", room.clone())?;
        }
    }
    Ok(())
}

pub fn set_email_notification(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(email) = &job.email_notification {
        if email.recipients.is_empty() {
            return Ok(());
        }
        set(doc, "publishers/hudson.tasks.Mailer+/recipients", email.recipients.join(" "))?;
        set(
            doc,
            "publishers/hudson.tasks.Mailer/dontNotifyEveryUnstableBuild",
            (!email.notify_every_build.unwrap_or(false)).to_string(),
        )?;
        set(
            doc,
            "publishers/hudson.tasks.Mailer/sendToIndividuals",
            email.notify_individually.unwrap_or(false).to_string(),
        )?;
    }
    Ok(())
}
