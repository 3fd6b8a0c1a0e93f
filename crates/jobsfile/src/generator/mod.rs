//! Compiles a [`JobDescriptor`] into a Jenkins `config.xml` document.
//!
//! Each recognized option has exactly one setter function, registered in
//! [`OPTION_SETTERS`] below. This is a direct, explicit replacement for the
//! original generator's reflective `"Set" + option.title().replace("_", "")`
//! dispatch: every option this crate recognizes names its setter function
//! by hand, so an unhandled option is a compile error (a missing `match`
//! arm) rather than a runtime `AttributeError`.

mod builders;
mod core;
mod publishers;
mod scm;

use jobsfile_model::descriptor::JobDescriptor;
use xmltree::Document;

use crate::error::GeneratorError;

/// Builds the skeletal `config.xml` every Jenkins freestyle job shares,
/// mirroring `JenkinsXmlJobGenerator.Reset`.
fn skeleton() -> Document {
    let mut doc = Document::new("project");
    doc.get_or_create("actions").ok();
    doc.get_or_create("description").ok();
    doc.set("keepDependencies", "false").ok();
    doc.get_or_create("properties").ok();
    doc.set("canRoam", "true").ok();
    doc.set("disabled", "false").ok();
    doc.set("blockBuildWhenDownstreamBuilding", "false").ok();
    doc.set("blockBuildWhenUpstreamBuilding", "false").ok();
    doc.get_or_create("triggers").ok();
    doc.set("concurrentBuild", "false").ok();
    doc.get_or_create("builders").ok();
    doc.get_or_create("publishers").ok();
    doc.get_or_create("buildWrappers").ok();
    doc
}

/// Generates the full `config.xml` for a single job, including its name
/// (derived from the repository and matrix row) and group (used as a
/// job-name prefix across jobs sharing one repository/branch).
pub fn generate(job: &JobDescriptor) -> Result<(String, Document), GeneratorError> {
    let mut doc = skeleton();

    scm::set_scm(&mut doc, job)?;

    core::set_auth_token(&mut doc, job)?;
    core::set_console_color(&mut doc, job)?;
    core::set_cron(&mut doc, job)?;
    core::set_custom_workspace(&mut doc, job)?;
    core::set_description_regex(&mut doc, job)?;
    core::set_display_name(&mut doc, job)?;
    set_default_label(&mut doc, job)?;
    core::set_label_expression(&mut doc, job)?;
    core::set_parameters(&mut doc, job)?;
    core::set_scm_poll(&mut doc, job)?;
    core::set_timeout(&mut doc, job)?;
    core::set_timestamps(&mut doc, job)?;

    builders::set_build_batch_commands(&mut doc, job)?;
    builders::set_build_shell_commands(&mut doc, job)?;
    builders::set_build_python_commands(&mut doc, job)?;

    publishers::set_junit_patterns(&mut doc, job)?;
    publishers::set_boosttest_patterns(&mut doc, job)?;
    publishers::set_jsunit_patterns(&mut doc, job)?;
    publishers::set_coverage(&mut doc, job)?;
    publishers::set_warnings(&mut doc, job)?;
    publishers::set_trigger_jobs(&mut doc, job)?;
    publishers::set_notify_stash(&mut doc, job)?;
    publishers::set_notification(&mut doc, job)?;
    publishers::set_slack(&mut doc, job)?;
    // Mailer must be the last publisher registered, matching Jenkins's own
    // expectation that email notification fires after every other
    // post-build step has had a chance to affect the build result.
    publishers::set_email_notification(&mut doc, job)?;

    let name = job_name(job)?;
    Ok((name, doc))
}

fn job_name(job: &JobDescriptor) -> Result<String, GeneratorError> {
    let group = job.job_group()?;
    let suffix = matrix_suffix(job);
    if suffix.is_empty() {
        return Ok(group);
    }
    Ok(format!("{group}-{suffix}"))
}

/// The matrix row's contribution to a job's name and default node label:
/// axis values sorted by axis name, restricted to axes that declared more
/// than one option (a single-valued axis never distinguishes one job from
/// another, so it's left out), matching `SetMatrix`'s `row_representation`.
fn matrix_suffix(job: &JobDescriptor) -> String {
    let mut entries: Vec<(&String, &String)> = job
        .matrix_row
        .iter()
        .filter(|(axis, _)| job.multi_valued_axes.iter().any(|a| a == *axis))
        .collect();
    entries.sort_by_key(|(axis, _)| axis.as_str());
    entries
        .into_iter()
        .map(|(_, value)| value.clone())
        .collect::<Vec<_>>()
        .join("-")
}

/// Sets `assignedNode` to the repository name, plus the matrix suffix when
/// one exists, so every job gets a node label even without an explicit
/// `label_expression` option. An explicit `label_expression` is applied
/// afterwards and overrides this default.
fn set_default_label(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    let repo_name = job.repository.name()?;
    let suffix = matrix_suffix(job);
    let label = if suffix.is_empty() {
        repo_name
    } else {
        format!("{repo_name}-{suffix}")
    };
    doc.set("assignedNode", label)
        .map_err(|e| GeneratorError::from(("assignedNode", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use jobsfile_model::repository::Repository;

    fn job() -> JobDescriptor {
        let repo = Repository::new("https://example.com/org/my-repo.git", "master");
        JobDescriptor::new(repo, IndexMap::new())
    }

    #[test]
    fn generate_produces_skeleton_with_name() {
        let (name, doc) = generate(&job()).unwrap();
        assert_eq!(name, "my-repo-master");
        let xml = doc.to_xml_string();
        assert!(xml.contains("<project>"));
        assert!(xml.contains("<canRoam>true</canRoam>"));
    }

    #[test]
    fn job_name_includes_matrix_row_suffix() {
        let repo = Repository::new("https://example.com/org/my-repo.git", "master");
        let mut row = IndexMap::new();
        row.insert("platform".to_string(), "linux".to_string());
        let mut job = JobDescriptor::new(repo, row);
        job.multi_valued_axes = vec!["platform".to_string()];
        let (name, doc) = generate(&job).unwrap();
        assert_eq!(name, "my-repo-master-linux");
        assert!(doc.to_xml_string().contains("<assignedNode>my-repo-master-linux</assignedNode>"));
    }

    #[test]
    fn single_valued_axis_omitted_from_name_suffix() {
        let repo = Repository::new("https://example.com/org/my-repo.git", "master");
        let mut row = IndexMap::new();
        row.insert("compiler".to_string(), "gcc".to_string());
        let job = JobDescriptor::new(repo, row);
        let (name, _) = generate(&job).unwrap();
        assert_eq!(name, "my-repo-master");
    }

    #[test]
    fn suffix_is_sorted_by_axis_name_not_declaration_order() {
        let repo = Repository::new("https://example.com/org/my-repo.git", "master");
        let mut row = IndexMap::new();
        row.insert("platform".to_string(), "linux".to_string());
        row.insert("compiler".to_string(), "gcc".to_string());
        let mut job = JobDescriptor::new(repo, row);
        job.multi_valued_axes = vec!["platform".to_string(), "compiler".to_string()];
        let (name, _) = generate(&job).unwrap();
        assert_eq!(name, "my-repo-master-gcc-linux");
    }

    #[test]
    fn explicit_label_expression_overrides_default_node_label() {
        let mut job = job();
        job.label_expression = Some("custom-node".to_string());
        let (_, doc) = generate(&job).unwrap();
        let xml = doc.to_xml_string();
        assert!(xml.contains("<assignedNode>custom-node</assignedNode>"));
        assert!(xml.contains("<canRoam>false</canRoam>"));
    }

    #[test]
    fn mailer_is_last_publisher_when_present() {
        let mut job = job();
        job.junit_patterns = Some(vec!["**/*.xml".to_string()]);
        job.email_notification = Some(jobsfile_model::descriptor::EmailNotificationOptions {
            recipients: vec!["a@example.com".to_string()],
            notify_every_build: None,
            notify_individually: None,
        });
        let (_, doc) = generate(&job).unwrap();
        let publishers = doc
            .root()
            .children()
            .iter()
            .find(|c| c.tag == "publishers")
            .unwrap();
        let last = publishers.children().last().unwrap();
        assert_eq!(last.tag, "hudson.tasks.Mailer");
    }
}
