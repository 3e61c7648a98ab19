//! Backend selection and connection settings

use crate::error::BackendError;
use s3_operator_core::OperatorConfig;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Available backend implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    VersityGw,
    Minio,
    Garage,
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "versitygw" => Ok(Self::VersityGw),
            "minio" => Ok(Self::Minio),
            "garage" => Ok(Self::Garage),
            _ => Err(BackendError::unknown_backend(s)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::VersityGw => write!(f, "versitygw"),
            BackendKind::Minio => write!(f, "minio"),
            BackendKind::Garage => write!(f, "garage"),
        }
    }
}

/// Connection settings shared by every backend
#[derive(Clone)]
pub struct BackendConfig {
    /// Endpoint URL, also the identity compared against record endpoints
    pub endpoint_url: String,
    /// Administrative access key
    pub access_key: String,
    /// Administrative secret key
    pub secret_key: String,
    /// Region for request signing
    pub region: String,
    /// Upper bound for one request
    pub request_timeout: Duration,
}

impl BackendConfig {
    pub fn new(
        endpoint_url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: s3_operator_core::DEFAULT_REGION.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl From<&OperatorConfig> for BackendConfig {
    fn from(config: &OperatorConfig) -> Self {
        Self::new(
            config.endpoint_url.clone(),
            config.root_access_key.clone(),
            config.root_secret_key.clone(),
        )
        .with_region(config.region.clone())
        .with_request_timeout(config.request_timeout)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse_is_case_insensitive() {
        assert_eq!("versitygw".parse::<BackendKind>().unwrap(), BackendKind::VersityGw);
        assert_eq!("VersityGW".parse::<BackendKind>().unwrap(), BackendKind::VersityGw);
        assert_eq!("MINIO".parse::<BackendKind>().unwrap(), BackendKind::Minio);
        assert_eq!("garage".parse::<BackendKind>().unwrap(), BackendKind::Garage);
    }

    #[test]
    fn test_backend_kind_parse_rejects_unknown() {
        let err = "ceph".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, BackendError::UnknownBackend { ref name } if name == "ceph"));
    }

    #[test]
    fn test_from_operator_config() {
        let operator = OperatorConfig {
            endpoint_url: "http://gw:7070".to_string(),
            root_access_key: "root".to_string(),
            root_secret_key: "root-secret".to_string(),
            region: "eu-central-1".to_string(),
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        };

        let config = BackendConfig::from(&operator);
        assert_eq!(config.endpoint_url, "http://gw:7070");
        assert_eq!(config.access_key, "root");
        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let config = BackendConfig::new("http://gw:7070", "root", "root-secret");
        assert!(!format!("{:?}", config).contains("root-secret"));
    }
}
