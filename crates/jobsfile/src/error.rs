//! Error types specific to this crate: XML generation and Jenkins
//! reconciliation. Option-parsing and expansion errors live in
//! `jobsfile-model`/`jobsfile-expand` and are re-exported from `lib.rs`.

use thiserror::Error;

/// Errors from turning a `JobDescriptor` into Jenkins `config.xml`.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to set {path:?}: {source}")]
    Tree {
        path: String,
        #[source]
        source: xmltree::TreeError,
    },

    #[error("option {0:?} has no registered generator")]
    NoGenerator(String),

    #[error("invalid repository: {0}")]
    Repository(#[from] jobsfile_model::repository::RepositoryError),
}

impl From<(&str, xmltree::TreeError)> for GeneratorError {
    fn from((path, source): (&str, xmltree::TreeError)) -> Self {
        GeneratorError::Tree {
            path: path.to_string(),
            source,
        }
    }
}

/// Errors from reconciling compiled jobs against a live Jenkins server.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("jenkins request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("jenkins returned unexpected status {status} for {operation}")]
    UnexpectedStatus { status: u16, operation: String },

    #[error("could not determine branch for job {job:?} from jenkins scm config")]
    BranchNotFound { job: String },

    #[error("exhausted {attempts} retries for {operation}: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        operation: String,
        last_error: String,
    },
}

/// The top-level error covering the whole compile-then-reconcile pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Compile(#[from] jobsfile_model::error::OptionError),

    #[error(transparent)]
    Expand(#[from] jobsfile_expand::ExpandError),

    #[error(transparent)]
    Repository(#[from] jobsfile_model::repository::RepositoryError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("failed to parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
