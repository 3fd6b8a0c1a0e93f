//! Git SCM block generation: a single `GitSCM` block for the job's
//! primary repository, or a `MultiSCM` wrapping it plus every
//! `additional_repositories` entry.

use jobsfile_model::descriptor::JobDescriptor;
use xmltree::{Document, Element};

use crate::error::GeneratorError;

fn set(element: &mut Element, path: &str, value: impl Into<String>) -> Result<(), GeneratorError> {
    element.set(path, value).map_err(|e| GeneratorError::from((path, e)))
}

fn set_git_remote(element: &mut Element, url: &str, branch: &str) -> Result<(), GeneratorError> {
    set(element, "userRemoteConfigs/hudson.plugins.git.UserRemoteConfig/url", url)?;
    set(element, "branches/hudson.plugins.git.BranchSpec/name", format!("*/{branch}"))?;
    Ok(())
}

/// Sets the job's SCM block and, when `git` options were given, the
/// repository-level checkout toggles they control.
pub fn set_scm(doc: &mut Document, job: &JobDescriptor) -> Result<(), GeneratorError> {
    let has_additional = job
        .additional_repositories
        .as_ref()
        .map(|repos| !repos.is_empty())
        .unwrap_or(false);

    if !has_additional {
        doc.set_attr("scm@class", "hudson.plugins.git.GitSCM")
            .map_err(|e| GeneratorError::from(("scm@class", e)))?;
        let scm = doc
            .get_or_create("scm")
            .map_err(|e| GeneratorError::from(("scm", e)))?;
        set_git_remote(scm, job.repository.url(), job.repository.branch())?;
    } else {
        doc.set_attr("scm@class", "org.jenkinsci.plugins.multiplescms.MultiSCM")
            .map_err(|e| GeneratorError::from(("scm@class", e)))?;

        let primary = doc
            .get_or_create("scm/scms/hudson.plugins.git.GitSCM+")
            .map_err(|e| GeneratorError::from(("scm/scms/hudson.plugins.git.GitSCM+", e)))?;
        set_git_remote(primary, job.repository.url(), job.repository.branch())?;

        for additional in job.additional_repositories.as_ref().unwrap() {
            let entry = doc
                .get_or_create("scm/scms/hudson.plugins.git.GitSCM+")
                .map_err(|e| GeneratorError::from(("scm/scms/hudson.plugins.git.GitSCM+", e)))?;
            set_git_remote(entry, additional.repository.url(), additional.repository.branch())?;
            if let Some(target_dir) = &additional.target_dir {
                set(entry, "relativeTargetDir", target_dir.clone())?;
            }
        }
    }

    if let Some(git) = &job.git {
        if let Some(recursive) = git.recursive_submodules {
            doc.set(
                "scm/extensions/hudson.plugins.git.extensions.impl.SubmoduleOption/recursiveSubmodules",
                recursive.to_string(),
            )
            .map_err(|e| GeneratorError::from(("scm/extensions/.../recursiveSubmodules", e)))?;
        }
        // `tags: true` disables Jenkins's default shallow "no tags" fetch
        // behavior, so it is written inverted as `noTags`.
        if let Some(tags) = git.tags {
            doc.set(
                "scm/extensions/hudson.plugins.git.extensions.impl.CloneOption/noTags",
                (!tags).to_string(),
            )
            .map_err(|e| GeneratorError::from(("scm/extensions/.../noTags", e)))?;
        }
        if git.clean_checkout == Some(true) {
            doc.get_or_create("scm/extensions/hudson.plugins.git.extensions.impl.CleanCheckout")
                .map_err(|e| GeneratorError::from(("scm/extensions/.../CleanCheckout", e)))?;
        }
        if git.lfs == Some(true) {
            doc.get_or_create("scm/extensions/hudson.plugins.git.extensions.impl.GitLFSPull")
                .map_err(|e| GeneratorError::from(("scm/extensions/.../GitLFSPull", e)))?;
        }
        if let Some(target_dir) = &git.target_dir {
            doc.set(
                "scm/extensions/hudson.plugins.git.extensions.impl.RelativeTargetDirectory/relativeTargetDir",
                target_dir.clone(),
            )
            .map_err(|e| GeneratorError::from(("scm/extensions/.../relativeTargetDir", e)))?;
        }
    }

    Ok(())
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
    fn single_repository_uses_git_scm() {
        let mut doc = Document::new("project");
        set_scm(&mut doc, &job()).unwrap();
        let xml = doc.to_xml_string();
        assert!(xml.contains("hudson.plugins.git.GitSCM"));
        assert!(!xml.contains("MultiSCM"));
    }

    #[test]
    fn additional_repositories_use_multiscm_with_both_urls() {
        use jobsfile_model::descriptor::AdditionalRepository;
        let mut job = job();
        job.additional_repositories = Some(vec![AdditionalRepository {
            repository: Repository::new("https://example.com/org/other.git", "master"),
            target_dir: Some("vendor/other".to_string()),
        }]);
        let mut doc = Document::new("project");
        set_scm(&mut doc, &job).unwrap();
        let xml = doc.to_xml_string();
        assert!(xml.contains("MultiSCM"));
        assert!(xml.contains("my-repo.git"));
        assert!(xml.contains("other.git"));
        assert!(xml.contains("vendor/other"));

        let scms = doc
            .root()
            .children()
            .iter()
            .find(|c| c.tag == "scm")
            .unwrap()
            .children()
            .iter()
            .find(|c| c.tag == "scms")
            .unwrap();
        assert_eq!(scms.children().len(), 2);
    }

    #[test]
    fn tags_true_writes_no_tags_false() {
        use jobsfile_model::descriptor::GitOptions;
        let mut job = job();
        job.git = Some(GitOptions {
            tags: Some(true),
            ..Default::default()
        });
        let mut doc = Document::new("project");
        set_scm(&mut doc, &job).unwrap();
        assert!(doc.to_xml_string().contains("<noTags>false</noTags>"));
    }
}
