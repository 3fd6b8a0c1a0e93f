//! Runtime configuration: where the Jenkins server lives, how to
//! authenticate against it, and how aggressively to retry transient
//! failures while reconciling.

use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--jenkins-url is required (or set JENKINS_URL)")]
    MissingJenkinsUrl,

    #[error("JENKINS_TOKEN is set but JENKINS_USER is not (Jenkins requires both for token auth)")]
    MissingJenkinsUser,
}

/// Jenkins connection settings, assembled from CLI flags with environment
/// variables as fallback (`JENKINS_URL`, `JENKINS_USER`, `JENKINS_TOKEN`).
#[derive(Debug, Clone)]
pub struct Config {
    pub jenkins_url: String,
    pub credentials: Option<(String, String)>,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Config {
    pub fn from_env_and_flags(
        jenkins_url: Option<String>,
        jenkins_user: Option<String>,
        jenkins_token: Option<String>,
    ) -> Result<Self, ConfigError> {
        let jenkins_url = jenkins_url
            .or_else(|| env::var("JENKINS_URL").ok())
            .ok_or(ConfigError::MissingJenkinsUrl)?
            .trim_end_matches('/')
            .to_string();

        let user = jenkins_user.or_else(|| env::var("JENKINS_USER").ok());
        let token = jenkins_token.or_else(|| env::var("JENKINS_TOKEN").ok());
        let credentials = match (user, token) {
            (Some(user), Some(token)) => Some((user, token)),
            (None, None) => None,
            (None, Some(_)) => return Err(ConfigError::MissingJenkinsUser),
            (Some(_), None) => None,
        };

        Ok(Config {
            jenkins_url,
            credentials,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn build_client(&self) -> crate::jenkins_client::Client {
        let mut client = crate::jenkins_client::Client::new(&self.jenkins_url)
            .with_retry(self.retry_attempts, self.retry_delay);
        if let Some((user, token)) = &self.credentials {
            client = client.with_credentials(user.clone(), token.clone());
        }
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_an_error() {
        // Safety: tests run single-threaded within this module's scope and
        // no other test in this file touches these variables.
        unsafe {
            env::remove_var("JENKINS_URL");
        }
        let err = Config::from_env_and_flags(None, None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingJenkinsUrl));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = Config::from_env_and_flags(Some("https://ci.example.com/".to_string()), None, None).unwrap();
        assert_eq!(config.jenkins_url, "https://ci.example.com");
    }

    #[test]
    fn token_without_user_is_rejected() {
        let err = Config::from_env_and_flags(
            Some("https://ci.example.com".to_string()),
            None,
            Some("tok".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingJenkinsUser));
    }
}
