//! Signed HTTP client for the VersityGW admin endpoints

use super::signing::RequestSigner;
use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use chrono::Utc;
use reqwest::{Method, Url};
use tracing::debug;

/// Sends signed requests to admin paths below the gateway endpoint
#[derive(Debug, Clone)]
pub struct AdminClient {
    base_url: String,
    client: reqwest::Client,
    signer: RequestSigner,
}

impl AdminClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = config.endpoint_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| {
            BackendError::invalid_config(format!("endpoint URL {:?}: {}", config.endpoint_url, e))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("s3-operator/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::invalid_config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            signer: RequestSigner::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                config.region.clone(),
            ),
        })
    }

    /// Build the request URL. Values are percent-encoded; an empty value
    /// produces a bare key (`?acl`).
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        urlencoding::encode(k).into_owned()
                    } else {
                        format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
                    }
                })
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        Url::parse(&url).map_err(|e| BackendError::invalid_config(format!("request URL {}: {}", url, e)))
    }

    /// Send a signed request and return the response body.
    ///
    /// Any status outside 2xx is an error carrying the status and body.
    pub async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<String> {
        let url = self.url(path, query)?;
        let payload = body.unwrap_or_default();
        let signed = self
            .signer
            .sign(method.as_str(), &url, payload.as_bytes(), Utc::now())
            .map_err(|e| BackendError::protocol(operation, format!("failed to sign request: {e}")))?;

        debug!("{} {} ({})", method, url.path(), operation);

        let mut request = self
            .client
            .request(method, url)
            .header("authorization", signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256);
        if !payload.is_empty() {
            request = request.header("content-type", "application/xml").body(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        if !status.is_success() {
            return Err(BackendError::Status {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}
