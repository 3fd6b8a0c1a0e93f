//! Reconciles a compiled set of jobs against a live Jenkins server: lists
//! existing jobs with a repository's prefix, diffs them against the
//! compiled set, and creates/reconfigures/deletes as needed.
//!
//! Retries are deliberately narrow: only on HTTP 403 (Jenkins's CSRF-crumb
//! race, which a retry often resolves on its own) and 502 (a transient
//! reverse-proxy hiccup in front of Jenkins). Any other status is treated
//! as a real failure and is not retried.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::instrument;

use crate::error::ReconcileError;

const RETRYABLE_STATUSES: &[StatusCode] = &[StatusCode::FORBIDDEN, StatusCode::BAD_GATEWAY];

/// The outcome of reconciling one repository/branch's jobs against Jenkins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

/// A single compiled job ready to be pushed to Jenkins.
#[derive(Debug, Clone)]
pub struct CompiledJob {
    pub name: String,
    pub xml: String,
}

/// An async client for Jenkins's job-management REST surface.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    username: Option<String>,
    token: Option<String>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        Client {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            username: None,
            token: None,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.username, &self.token) {
            (Some(user), Some(token)) => builder.basic_auth(user, Some(token)),
            _ => builder,
        }
    }

    /// Lists every job name on the server whose name starts with `prefix`
    /// (a job group, e.g. `my-repo-master`).
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, prefix: &str) -> Result<Vec<String>, ReconcileError> {
        let url = format!("{}/api/json?tree=jobs[name]", self.base_url);
        let response = self.authed(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(ReconcileError::UnexpectedStatus {
                status: response.status().as_u16(),
                operation: "list_jobs".to_string(),
            });
        }
        #[derive(serde::Deserialize)]
        struct JobsResponse {
            jobs: Vec<JobEntry>,
        }
        #[derive(serde::Deserialize)]
        struct JobEntry {
            name: String,
        }
        let body: JobsResponse = response.json().await?;
        Ok(body
            .jobs
            .into_iter()
            .map(|j| j.name)
            .filter(|name| name.starts_with(prefix))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_job_config(&self, name: &str) -> Result<String, ReconcileError> {
        let url = format!("{}/job/{}/config.xml", self.base_url, name);
        let response = self.authed(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(ReconcileError::UnexpectedStatus {
                status: response.status().as_u16(),
                operation: format!("get_job_config({name})"),
            });
        }
        Ok(response.text().await?)
    }

    #[instrument(skip(self, xml))]
    async fn create_job(&self, name: &str, xml: &str) -> Result<(), ReconcileError> {
        let url = format!("{}/createItem?name={}", self.base_url, name);
        self.post_xml(&url, xml, "create_job").await
    }

    #[instrument(skip(self, xml))]
    async fn reconfigure_job(&self, name: &str, xml: &str) -> Result<(), ReconcileError> {
        let url = format!("{}/job/{}/config.xml", self.base_url, name);
        self.post_xml(&url, xml, "reconfigure_job").await
    }

    #[instrument(skip(self))]
    async fn delete_job(&self, name: &str) -> Result<(), ReconcileError> {
        let url = format!("{}/job/{}/doDelete", self.base_url, name);
        self.with_retry(format!("delete_job({name})"), || async {
            let response = self.authed(self.http.post(&url)).send().await?;
            check_status(response, "delete_job")
        })
        .await
    }

    async fn post_xml(&self, url: &str, xml: &str, operation: &str) -> Result<(), ReconcileError> {
        let xml = xml.to_string();
        let operation = operation.to_string();
        self.with_retry(operation.clone(), || {
            let xml = xml.clone();
            let operation = operation.clone();
            async move {
                let response = self
                    .authed(self.http.post(url).header("Content-Type", "application/xml"))
                    .body(xml)
                    .send()
                    .await?;
                check_status(response, &operation)
            }
        })
        .await
    }

    /// Retries `f` on a 403 or 502 response, up to `self.retry_attempts`
    /// times, sleeping `self.retry_delay` between attempts. Any other
    /// error is returned immediately without retrying.
    async fn with_retry<F, Fut>(&self, operation: String, f: F) -> Result<(), ReconcileError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<(), ReconcileError>>,
    {
        let mut last_error = None;
        for attempt in 0..self.retry_attempts {
            match f().await {
                Ok(()) => return Ok(()),
                Err(ReconcileError::UnexpectedStatus { status, .. }) if is_retryable(status) => {
                    last_error = Some(format!("http {status}"));
                    if attempt + 1 < self.retry_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(ReconcileError::RetriesExhausted {
            attempts: self.retry_attempts,
            operation,
            last_error: last_error.unwrap_or_default(),
        })
    }

    /// Reconciles `desired` (every job that should exist for one
    /// repository/branch) against the server: creates missing jobs,
    /// reconfigures existing ones whose XML differs, and deletes jobs with
    /// `prefix` that are no longer in `desired`.
    ///
    /// Non-transactional: if reconciliation fails partway through, jobs
    /// already created/updated/deleted are not rolled back.
    #[instrument(skip(self, desired))]
    pub async fn reconcile(&self, prefix: &str, desired: &[CompiledJob]) -> Result<ReconcileReport, ReconcileError> {
        let existing = self.list_jobs(prefix).await?;
        let desired_names: Vec<&str> = desired.iter().map(|j| j.name.as_str()).collect();

        let mut report = ReconcileReport::default();

        for job in desired {
            if existing.iter().any(|name| name == &job.name) {
                let current = self.get_job_config(&job.name).await?;
                if current.trim() != job.xml.trim() {
                    self.reconfigure_job(&job.name, &job.xml).await?;
                    report.updated.push(job.name.clone());
                }
            } else {
                self.create_job(&job.name, &job.xml).await?;
                report.created.push(job.name.clone());
            }
        }

        for name in &existing {
            if !desired_names.contains(&name.as_str()) {
                self.delete_job(name).await?;
                report.deleted.push(name.clone());
            }
        }

        report.created.sort();
        report.updated.sort();
        report.deleted.sort();
        Ok(report)
    }
}

fn is_retryable(status: u16) -> bool {
    RETRYABLE_STATUSES.iter().any(|s| s.as_u16() == status)
}

fn check_status(response: reqwest::Response, operation: &str) -> Result<(), ReconcileError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(ReconcileError::UnexpectedStatus {
            status: response.status().as_u16(),
            operation: operation.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_jobs_filters_by_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jobs": [{"name": "my-repo-master-linux"}, {"name": "other-repo-master"}]
            })))
            .mount(&server)
            .await;

        let client = Client::new(server.uri());
        let jobs = client.list_jobs("my-repo-master").await.unwrap();
        assert_eq!(jobs, vec!["my-repo-master-linux".to_string()]);
    }

    #[tokio::test]
    async fn create_job_posts_to_create_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("^/createItem"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::new(server.uri());
        client.create_job("my-job", "<project/>").await.unwrap();
    }

    #[tokio::test]
    async fn retries_on_forbidden_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("^/createItem"))
            .respond_with(ResponseTemplate::new(403))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex("^/createItem"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::new(server.uri()).with_retry(3, Duration::from_millis(1));
        client.create_job("my-job", "<project/>").await.unwrap();
    }

    #[tokio::test]
    async fn does_not_retry_on_non_retryable_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("^/createItem"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(server.uri()).with_retry(3, Duration::from_millis(1));
        let err = client.create_job("my-job", "<project/>").await.unwrap_err();
        assert!(matches!(err, ReconcileError::UnexpectedStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn reconcile_creates_updates_and_deletes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jobs": [
                    {"name": "my-repo-master-keep"},
                    {"name": "my-repo-master-stale"},
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/job/my-repo-master-keep/config.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<project>old</project>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex("^/job/my-repo-master-keep/config.xml"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex("^/createItem"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex("^/job/my-repo-master-stale/doDelete"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::new(server.uri());
        let desired = vec![
            CompiledJob { name: "my-repo-master-keep".to_string(), xml: "<project>new</project>".to_string() },
            CompiledJob { name: "my-repo-master-new".to_string(), xml: "<project/>".to_string() },
        ];
        let report = client.reconcile("my-repo-master", &desired).await.unwrap();
        assert_eq!(report.created, vec!["my-repo-master-new".to_string()]);
        assert_eq!(report.updated, vec!["my-repo-master-keep".to_string()]);
        assert_eq!(report.deleted, vec!["my-repo-master-stale".to_string()]);
    }
}
