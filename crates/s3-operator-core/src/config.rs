//! Operator configuration
//!
//! The binary fills an [`OperatorConfig`] from flags, environment variables
//! and an optional `.env` file; the library crates only ever see the
//! validated struct.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Annotation that opts a secret into management
pub const DEFAULT_ANNOTATION_KEY: &str = "s3-resource-operator.io/enabled";

/// Region used for the signing scope when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default backend implementation
pub const DEFAULT_BACKEND: &str = "versitygw";

/// Complete runtime configuration of the operator
#[derive(Clone)]
pub struct OperatorConfig {
    /// S3 endpoint URL of the managed storage system
    pub endpoint_url: String,
    /// Root (administrative) access key
    pub root_access_key: String,
    /// Root (administrative) secret key
    pub root_secret_key: String,
    /// Backend implementation name (versitygw, minio, garage)
    pub backend_name: String,
    /// Annotation key that marks a secret as managed
    pub annotation_key: String,
    /// Skip secrets whose endpoint differs from `endpoint_url`
    pub enforce_endpoint: bool,
    /// Region used for request signing
    pub region: String,
    /// Upper bound for a single backend request
    pub request_timeout: Duration,
    /// Interval between full resync passes
    pub resync_interval: Duration,
    /// Lifetime of a single watch session
    pub watch_timeout: Duration,
    /// Port for the metrics and health endpoints
    pub metrics_port: u16,
    /// Explicit kubeconfig path (kubectl default resolution otherwise)
    pub kubeconfig: Option<PathBuf>,
    /// kubectl binary used by the change source
    pub kubectl: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            root_access_key: String::new(),
            root_secret_key: String::new(),
            backend_name: DEFAULT_BACKEND.to_string(),
            annotation_key: DEFAULT_ANNOTATION_KEY.to_string(),
            enforce_endpoint: true,
            region: DEFAULT_REGION.to_string(),
            request_timeout: Duration::from_secs(30),
            resync_interval: Duration::from_secs(300),
            watch_timeout: Duration::from_secs(300),
            metrics_port: 8000,
            kubeconfig: None,
            kubectl: "kubectl".to_string(),
        }
    }
}

impl OperatorConfig {
    /// Check that every required value is present and usable.
    ///
    /// All missing values are reported together so a misconfigured
    /// deployment can be fixed in one round.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("S3_ENDPOINT_URL", &self.endpoint_url),
            ("ROOT_ACCESS_KEY", &self.root_access_key),
            ("ROOT_SECRET_KEY", &self.root_secret_key),
            ("BACKEND_NAME", &self.backend_name),
            ("ANNOTATION_KEY", &self.annotation_key),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(Error::missing_config(missing));
        }

        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://")
        {
            return Err(Error::invalid_config(format!(
                "S3 endpoint URL must start with http:// or https://, got {}",
                self.endpoint_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::invalid_config("request timeout must be greater than zero"));
        }

        if self.resync_interval.is_zero() {
            return Err(Error::invalid_config("resync interval must be greater than zero"));
        }

        Ok(())
    }
}

impl fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("root_access_key", &self.root_access_key)
            .field("root_secret_key", &"<redacted>")
            .field("backend_name", &self.backend_name)
            .field("annotation_key", &self.annotation_key)
            .field("enforce_endpoint", &self.enforce_endpoint)
            .field("region", &self.region)
            .field("request_timeout", &self.request_timeout)
            .field("resync_interval", &self.resync_interval)
            .field("watch_timeout", &self.watch_timeout)
            .field("metrics_port", &self.metrics_port)
            .field("kubeconfig", &self.kubeconfig)
            .field("kubectl", &self.kubectl)
            .finish()
    }
}
