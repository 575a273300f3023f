use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Which object store implementation backs trace uploads.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local directory tree, one sub-directory per bucket.
    #[default]
    Filesystem,
    /// S3-compatible endpoint (requires the `object-storage` feature).
    S3,
}

/// App-level object store configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Bucket every upload is written to. Default: "traces".
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Root directory for the filesystem backend. Default: "./data/objects".
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Custom S3 endpoint (MinIO, R2, GCS interop). `None` uses the AWS region endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Maximum accepted upload size in bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Deadline applied to every object store round trip. Default: 30s.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Interval of the orphaned-object scan. `0` disables the scan. Default: 0.
    #[serde(default)]
    pub orphan_scan_interval_secs: u64,
}

fn default_bucket() -> String {
    "traces".into()
}
fn default_base_path() -> PathBuf {
    PathBuf::from("./data/objects")
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl StorageConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: default_bucket(),
            base_path: default_base_path(),
            endpoint: None,
            region: default_region(),
            access_key: None,
            secret_key: None,
            max_upload_size: default_max_upload_size(),
            request_timeout_secs: default_request_timeout_secs(),
            orphan_scan_interval_secs: 0,
        }
    }
}

/// App-level notification channel configuration.
///
/// Leaving `url` unset disables notifications entirely; the service still starts.
#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Broker URL, e.g. "redis://localhost:6379".
    #[serde(default)]
    pub url: Option<String>,
    /// Broker username. Only used together with `password`.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Queue upload events are published to. Default: "trace-survey-uploaded".
    #[serde(default = "default_queue_name")]
    pub queue_name: String,
    /// Connection pool size. Default: 5.
    #[serde(default = "default_pool_size")]
    pub pool_size: u8,
    /// Upper bound on a single publish. Default: 10s.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
    /// Upper bound on draining in-flight publishes at shutdown. Default: 10s.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Value of the `source` field on every envelope. Default: "api-server".
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_queue_name() -> String {
    "trace-survey-uploaded".into()
}
fn default_pool_size() -> u8 {
    5
}
fn default_write_timeout_secs() -> u64 {
    10
}
fn default_shutdown_timeout_secs() -> u64 {
    10
}
fn default_source() -> String {
    "api-server".into()
}

/// Error returned when the broker credentials are half-configured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("broker authentication requires both username and password")]
pub struct IncompleteCredentials;

impl NotificationConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Broker URL with credentials spliced in, or `None` when notifications are disabled.
    pub fn broker_url(&self) -> Result<Option<String>, IncompleteCredentials> {
        let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(None);
        };

        let username = self.username.as_deref().filter(|u| !u.is_empty());
        let password = self.password.as_deref().filter(|p| !p.is_empty());

        match (username, password) {
            (None, None) => Ok(Some(url.to_string())),
            (Some(user), Some(pass)) => match url.split_once("://") {
                Some((scheme, rest)) => Ok(Some(format!("{scheme}://{user}:{pass}@{rest}"))),
                None => Ok(Some(format!("{user}:{pass}@{url}"))),
            },
            _ => Err(IncompleteCredentials),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            queue_name: default_queue_name(),
            pool_size: default_pool_size(),
            write_timeout_secs: default_write_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            source: default_source(),
        }
    }
}
