//! Runner configuration
//!
//! One `RunnerConfig` is built at process start (from flags and environment)
//! and shared read-only by every run. The runner itself only interprets the
//! namespace, the timeout and the poll interval; output and notification
//! settings drive the reporting steps. Object store and git credentials are
//! only validated and carried along for the components that inject them into
//! testruns.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tm_common::{Error, DEFAULT_TESTRUN_NAMESPACE};

use crate::watch::DEFAULT_POLL_INTERVAL;

/// Default maximum wait time for a testrun
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Environment variable carrying the serialized git secrets
pub const GIT_SECRETS_ENV: &str = "GIT_SECRETS";

/// Process-wide runner configuration, immutable after construction
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Namespace testruns are created in
    pub namespace: String,
    /// Maximum wait time per testrun
    pub timeout: Duration,
    /// Interval between two status polls
    pub poll_interval: Duration,
    /// File the JSON summaries are written to
    pub output_file: Option<PathBuf>,
    /// Object store the engine uploads artifacts to
    ///
    /// Validated at startup, otherwise passed through untouched.
    pub object_store: Option<ObjectStoreConfig>,
    /// Credentials for private test location repositories
    ///
    /// Parsed and passed through untouched; the runner does not read them.
    pub git_secrets: Vec<GitSecret>,
    /// Concourse directory that receives `notify.cfg` on failure
    pub concourse_on_error_dir: Option<PathBuf>,
    /// Recipients of failure notifications
    pub notify_recipients: Vec<String>,
    /// Base URL of the Argo UI, used to log workflow links
    pub argo_ui_url: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_TESTRUN_NAMESPACE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            output_file: None,
            object_store: None,
            git_secrets: Vec::new(),
            concourse_on_error_dir: None,
            notify_recipients: Vec::new(),
            argo_ui_url: None,
        }
    }
}

impl RunnerConfig {
    /// Check the values the runner depends on
    pub fn validate(&self) -> Result<(), Error> {
        if self.namespace.is_empty() {
            return Err(Error::validation_for("config", "namespace must not be empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::validation_for("config", "poll interval must be positive"));
        }
        if let Some(store) = &self.object_store {
            store.validate()?;
        }
        Ok(())
    }
}

/// S3 compatible object store settings
#[derive(Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStoreConfig {
    /// Endpoint host (and port)
    pub endpoint: String,
    /// Access key id
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Use TLS
    #[serde(default)]
    pub ssl: bool,
}

impl ObjectStoreConfig {
    /// Returns `None` when no endpoint is set
    pub fn from_parts(
        endpoint: Option<String>,
        access_key: Option<String>,
        secret_key: Option<String>,
        bucket_name: Option<String>,
        ssl: bool,
    ) -> Option<Self> {
        let endpoint = endpoint.filter(|e| !e.is_empty())?;
        Some(Self {
            endpoint,
            access_key: access_key.unwrap_or_default(),
            secret_key: secret_key.unwrap_or_default(),
            bucket_name: bucket_name.unwrap_or_default(),
            ssl,
        })
    }

    /// All fields besides `ssl` are required once an endpoint is set
    pub fn validate(&self) -> Result<(), Error> {
        let missing: Vec<&str> = [
            ("access key", &self.access_key),
            ("secret key", &self.secret_key),
            ("bucket", &self.bucket_name),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::validation_for(
                "s3",
                format!("missing {} for endpoint {}", missing.join(", "), self.endpoint),
            ))
        }
    }
}

// Keep credentials out of logs
impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("ssl", &self.ssl)
            .finish()
    }
}

/// Credentials for one git host
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitSecret {
    /// Host or URL prefix the credentials apply to
    pub url: String,
    /// Technical user used for cloning
    pub technical_user: TechnicalUser,
}

/// Technical user of a git host
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalUser {
    /// Login name
    pub username: String,
    /// Password, if basic auth is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// API token, if token auth is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl fmt::Debug for GitSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitSecret")
            .field("url", &self.url)
            .field("username", &self.technical_user.username)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for TechnicalUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TechnicalUser")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct GitSecrets {
    #[serde(default)]
    secrets: Vec<GitSecret>,
}

/// Parse the YAML document passed via [`GIT_SECRETS_ENV`]
///
/// Blank input means no secrets.
pub fn parse_git_secrets(raw: &str) -> Result<Vec<GitSecret>, Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: GitSecrets = serde_yaml::from_str(raw).map_err(|e| {
        Error::validation_for(GIT_SECRETS_ENV, format!("unable to read git secrets: {}", e))
    })?;
    Ok(parsed.secrets)
}
