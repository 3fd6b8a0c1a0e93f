//! Wires the three pipeline stages together: parsing, expansion, typed
//! descriptor conversion, and XML generation. Reconciliation against a live
//! server is a separate, optional final step ([`reconcile`]).

use jobsfile_model::descriptor::JobDescriptor;
use jobsfile_model::options;
use jobsfile_model::repository::Repository;
use tracing::instrument;
use xmltree::Document;

use crate::error::PipelineError;
use crate::jenkins_client::{Client, CompiledJob, ReconcileReport};

/// One compiled job: its generated name and `config.xml` document.
#[derive(Debug, Clone)]
pub struct CompiledJobSet {
    pub group: String,
    pub jobs: Vec<(String, Document)>,
}

impl CompiledJobSet {
    /// Flattens this set into the plain `(name, xml)` pairs the Jenkins
    /// client reconciles against.
    pub fn as_compiled_jobs(&self) -> Vec<CompiledJob> {
        self.jobs
            .iter()
            .map(|(name, doc)| CompiledJob {
                name: name.clone(),
                xml: doc.to_xml_string(),
            })
            .collect()
    }
}

/// Compiles a jobs-file YAML document into the full set of Jenkins jobs for
/// `repository`: parses recognized options, expands the matrix and
/// conditional keys, converts each resolved row into a [`JobDescriptor`],
/// and generates its `config.xml`.
#[instrument(skip(yaml_contents))]
pub fn compile(repository: Repository, yaml_contents: &str) -> Result<CompiledJobSet, PipelineError> {
    let raw_options = options::parse_document(yaml_contents)?;
    let resolved = jobsfile_expand::expand_document(&repository, &raw_options)?;

    let group = repository.name().map(|name| format!("{name}-{}", repository.branch()))?;

    let mut jobs = Vec::with_capacity(resolved.len());
    for row in resolved {
        let descriptor =
            JobDescriptor::from_options(row.repository, row.matrix_row, row.multi_valued_axes, &row.options)?;
        let (name, doc) = crate::generator::generate(&descriptor)?;
        jobs.push((name, doc));
    }

    Ok(CompiledJobSet { group, jobs })
}

/// Reconciles a compiled job set against a live Jenkins server, creating,
/// updating, and deleting jobs so the server matches `compiled` exactly
/// within `compiled.group`'s namespace.
#[instrument(skip(client, compiled))]
pub async fn reconcile(client: &Client, compiled: &CompiledJobSet) -> Result<ReconcileReport, PipelineError> {
    let desired = compiled.as_compiled_jobs();
    client
        .reconcile(&compiled.group, &desired)
        .await
        .map_err(PipelineError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_produces_one_job_per_matrix_row() {
        let repo = Repository::new("https://example.com/org/my-repo.git", "master");
        let yaml = "matrix:\n  platform: [linux, windows]\nbuild_shell_commands: make\n";
        let compiled = compile(repo, yaml).unwrap();
        assert_eq!(compiled.group, "my-repo-master");
        assert_eq!(compiled.jobs.len(), 2);
        let names: Vec<&str> = compiled.jobs.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"my-repo-master-linux"));
        assert!(names.contains(&"my-repo-master-windows"));
    }

    #[test]
    fn compile_of_empty_document_yields_no_jobs() {
        let repo = Repository::new("https://example.com/org/my-repo.git", "master");
        let compiled = compile(repo, "   \n  \n").unwrap();
        assert!(compiled.jobs.is_empty());
    }

    #[test]
    fn compile_rejects_unknown_option() {
        let repo = Repository::new("https://example.com/org/my-repo.git", "master");
        let err = compile(repo, "not_a_real_option: 1").unwrap_err();
        assert!(matches!(err, PipelineError::Compile(_)));
    }
}
