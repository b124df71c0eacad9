use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::debug;

use super::errors::FetchError;
use crate::config::ApiConfig;

/// Performs a JSON GET against the signal API.
///
/// Kept behind a trait so fetchers can be driven by an in-memory transport.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `path` (relative to the API base), attaching `bearer` when present,
    /// and decode the body as JSON.
    async fn get_json(&self, path: &str, bearer: Option<&str>) -> Result<Value, FetchError>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NetworkFailure {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, FetchError> {
        Self::new(api.base_url.clone(), api.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, path: &str, bearer: Option<&str>) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        debug!(event = "core.transport.request_started", url = %url);

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::NetworkFailure {
                message: format!("request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkFailure {
                message: format!("failed to read response body: {}", e),
            })?;

        serde_json::from_str(&body).map_err(|e| FetchError::malformed(format!("invalid JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let transport =
            ReqwestTransport::new("  https://signals.example.com/ ", Duration::from_secs(5))
                .unwrap();
        assert_eq!(transport.base_url(), "https://signals.example.com");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        // Port 9 (discard) is not expected to accept HTTP on loopback.
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = transport.get_json("/api/crypto/sentiment", None).await.unwrap_err();
        assert!(
            matches!(err, FetchError::NetworkFailure { .. }),
            "unexpected error: {:?}",
            err
        );
    }
}
