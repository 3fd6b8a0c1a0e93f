//! Setters for the simple, scalar top-level job options.

use jobsfile_model::descriptor::{JobDescriptor, ParameterKind};
use xmltree::{Document, Element};

use crate::error::GeneratorError;

fn set(doc: &mut Document, path: &str, value: impl Into<String>) -> Result<(), GeneratorError> {
    doc.set(path, value).map_err(|e| GeneratorError::from((path, e)))
}

fn set_on(element: &mut Element, path: &str, value: impl Into<String>) -> Result<(), GeneratorError> {
    element.set(path, value).map_err(|e| GeneratorError::from((path, e)))
}

/// Each build parameter becomes its own Jenkins parameter-definition entry,
/// a choice or string parameter depending on which key the jobs-file used.
pub fn set_parameters(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    let Some(parameters) = &job.parameters else {
        return Ok(());
    };
    for parameter in parameters {
        let tag = match &parameter.kind {
            ParameterKind::Choice { .. } => "hudson.model.ChoiceParameterDefinition",
            ParameterKind::String => "hudson.model.StringParameterDefinition",
        };
        let path = format!("properties/hudson.model.ParametersDefinitionProperty/parameterDefinitions/{tag}+");
        let entry = doc
            .get_or_create(&path)
            .map_err(|e| GeneratorError::from(("properties/.../parameterDefinitions", e)))?;
        set_on(entry, "name", parameter.name.clone())?;
        if let Some(description) = &parameter.description {
            set_on(entry, "description", description.clone())?;
        }
        match &parameter.kind {
            ParameterKind::Choice { choices } => {
                entry
                    .set_attr("choices@class", "java.util.Arrays$ArrayList")
                    .map_err(|e| GeneratorError::from(("choices@class", e)))?;
                entry
                    .set_attr("choices/a@class", "string-array")
                    .map_err(|e| GeneratorError::from(("choices/a@class", e)))?;
                for choice in choices {
                    set_on(entry, "choices/a/string+", choice.clone())?;
                }
            }
            ParameterKind::String => {
                if let Some(default) = &parameter.default {
                    set_on(entry, "defaultValue", default.clone())?;
                }
            }
        }
    }
    Ok(())
}

pub fn set_auth_token(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(token) = &job.auth_token {
        set(doc, "authToken", token.clone())?;
    }
    Ok(())
}

/// Defaults to `xterm` when the job sets `console_color` without naming a
/// terminal type, matching the original's empty-string fallback.
pub fn set_console_color(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(value) = &job.console_color {
        doc.set_attr("buildWrappers/hudson.plugins.ansicolor.AnsiColorBuildWrapper@plugin", "ansicolor")
            .map_err(|e| GeneratorError::from(("buildWrappers/.../AnsiColorBuildWrapper@plugin", e)))?;
        let color_map = if value.is_empty() { "xterm" } else { value.as_str() };
        set(
            doc,
            "buildWrappers/hudson.plugins.ansicolor.AnsiColorBuildWrapper/colorMapName",
            color_map,
        )?;
    }
    Ok(())
}

pub fn set_display_name(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(display_name) = &job.display_name {
        set(doc, "displayName", display_name.clone())?;
    }
    Ok(())
}

pub fn set_cron(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(cron) = &job.cron {
        set(doc, "triggers/hudson.triggers.TimerTrigger/spec", cron.clone())?;
    }
    Ok(())
}

pub fn set_custom_workspace(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(workspace) = &job.custom_workspace {
        set(doc, "customWorkspace", workspace.clone())?;
    }
    Ok(())
}

pub fn set_description_regex(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(regex) = &job.description_regex {
        set(
            doc,
            "publishers/hudson.plugins.descriptionsetter.DescriptionSetterPublisher/regexp",
            regex.clone(),
        )?;
    }
    Ok(())
}

pub fn set_label_expression(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(label) = &job.label_expression {
        set(doc, "assignedNode", label.clone())?;
        set(doc, "canRoam", "false")?;
    }
    Ok(())
}

pub fn set_scm_poll(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(spec) = &job.scm_poll {
        set(doc, "triggers/hudson.triggers.SCMTrigger/spec", spec.clone())?;
    }
    Ok(())
}

pub fn set_timeout(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if let Some(timeout) = job.timeout {
        set(
            doc,
            "buildWrappers/hudson.plugins.build__timeout.BuildTimeoutWrapper/timeoutMinutes",
            timeout.to_string(),
        )?;
    }
    if let Some(timeout) = job.timeout_no_activity {
        set(
            doc,
            "buildWrappers/hudson.plugins.build__timeout.BuildTimeoutWrapper/timeoutNoActivityMinutes",
            timeout.to_string(),
        )?;
    }
    Ok(())
}

pub fn set_timestamps(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    if job.timestamps == Some(true) {
        doc.get_or_create("buildWrappers/hudson.plugins.timestamper.TimestamperBuildWrapper")
            .map_err(|e| GeneratorError::from(("buildWrappers/.../TimestamperBuildWrapper", e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use jobsfile_model::repository::Repository;

    fn job() -> JobDescriptor {
        let repo = Repository::with_default_branch("https://example.com/org/repo.git");
        JobDescriptor::new(repo, IndexMap::new())
    }

    #[test]
    fn console_color_defaults_to_xterm() {
        let mut job = job();
        job.console_color = Some(String::new());
        let mut doc = Document::new("project");
        set_console_color(&mut doc, &job).unwrap();
        assert!(doc.to_xml_string().contains("<colorMapName>xterm</colorMapName>"));
    }

    #[test]
    fn label_expression_disables_can_roam() {
        let mut job = job();
        job.label_expression = Some("linux && x86_64".to_string());
        let mut doc = Document::new("project");
        doc.set("canRoam", "true").unwrap();
        set_label_expression(&mut doc, &job).unwrap();
        assert!(doc.to_xml_string().contains("<canRoam>false</canRoam>"));
    }

    #[test]
    fn timeout_sets_minutes() {
        let mut job = job();
        job.timeout = Some(30);
        let mut doc = Document::new("project");
        set_timeout(&mut doc, &job).unwrap();
        assert!(doc.to_xml_string().contains("<timeoutMinutes>30</timeoutMinutes>"));
    }

    #[test]
    fn choice_parameter_writes_choices_list() {
        use jobsfile_model::descriptor::Parameter;
        let mut job = job();
        job.parameters = Some(vec![Parameter {
            kind: ParameterKind::Choice { choices: vec!["fast".to_string(), "slow".to_string()] },
            name: "mode".to_string(),
            default: None,
            description: None,
        }]);
        let mut doc = Document::new("project");
        set_parameters(&mut doc, &job).unwrap();
        let xml = doc.to_xml_string();
        assert!(xml.contains("ChoiceParameterDefinition"));
        assert!(xml.contains("<name>mode</name>"));
        assert!(xml.contains("fast"));
        assert!(xml.contains("slow"));
    }

    #[test]
    fn string_parameter_writes_default_value() {
        use jobsfile_model::descriptor::Parameter;
        let mut job = job();
        job.parameters = Some(vec![Parameter {
            kind: ParameterKind::String,
            name: "tag".to_string(),
            default: Some("latest".to_string()),
            description: None,
        }]);
        let mut doc = Document::new("project");
        set_parameters(&mut doc, &job).unwrap();
        assert!(doc.to_xml_string().contains("<defaultValue>latest</defaultValue>"));
    }
}
