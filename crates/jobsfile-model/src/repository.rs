//! The repository a jobs-file belongs to: a URL and a branch.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*/([^./]+)(\.git/?)?$").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("repository url {0:?} has no derivable name")]
    UnderivableName(String),
}

/// A source repository: its clone URL and the branch a job compiles for.
///
/// `name` is not stored; it is derived from `url` on demand, the same way
/// the original Python implementation computes it as a property rather
/// than a stored field, so a `Repository` can never drift out of sync with
/// its own URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    url: String,
    branch: String,
}

impl Repository {
    pub const DEFAULT_BRANCH: &'static str = "master";

    pub fn new(url: impl Into<String>, branch: impl Into<String>) -> Self {
        Repository {
            url: url.into(),
            branch: branch.into(),
        }
    }

    /// Constructs a `Repository` on the default branch.
    pub fn with_default_branch(url: impl Into<String>) -> Self {
        Repository::new(url, Self::DEFAULT_BRANCH)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The repository's short name, derived from the last path segment of
    /// `url` with an optional `.git` suffix stripped.
    pub fn name(&self) -> Result<String, RepositoryError> {
        NAME_PATTERN
            .captures(&self.url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| RepositoryError::UnderivableName(self.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_strips_git_suffix() {
        let repo = Repository::with_default_branch("git@example.com:org/my-repo.git");
        assert_eq!(repo.name().unwrap(), "my-repo");
    }

    #[test]
    fn name_handles_no_suffix() {
        let repo = Repository::with_default_branch("https://example.com/org/my-repo");
        assert_eq!(repo.name().unwrap(), "my-repo");
    }

    #[test]
    fn name_handles_trailing_slash_after_git() {
        let repo = Repository::with_default_branch("https://example.com/org/my-repo.git/");
        assert_eq!(repo.name().unwrap(), "my-repo");
    }

    #[test]
    fn default_branch_is_master() {
        let repo = Repository::with_default_branch("https://example.com/org/repo.git");
        assert_eq!(repo.branch(), "master");
    }
}
