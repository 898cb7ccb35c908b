//! HTTP layer: status mapping, bounded retry, versioned routing.
//!
//! This is the only place that interprets status codes; `client.rs` never
//! looks at a response below the typed level.

use std::time::Duration;

use rand::Rng;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use casebridge_remote::RemoteError;

use crate::config::HttpClientConfig;

/// Protocol version pinned for every result submission.
///
/// Later versions drop the per-record ids from the submission response that
/// the pipeline needs to key attachments and correlation on.
pub const RESULTS_API_VERSION: &str = "5.0-preview.5";

pub(crate) const DEFAULT_API_VERSION: &str = "7.0";
pub(crate) const ATTACHMENTS_API_VERSION: &str = "7.0-preview.1";

pub(crate) struct HttpBackend {
    client: reqwest::Client,
    org_url: String,
    token: String,
    max_retries: u32,
}

impl HttpBackend {
    pub(crate) fn new(config: &HttpClientConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(net_err)?;
        Ok(Self {
            client,
            org_url: config.org_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Build a request URL for a resource route under the organization,
    /// pinned to an explicit protocol version.
    pub(crate) fn versioned_url(&self, route: &str, api_version: &str) -> String {
        format!("{}/{route}?api-version={api_version}", self.org_url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        self.send(Method::GET, url, Option::<&()>::None).await
    }

    pub(crate) async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.send(Method::POST, url, Some(body)).await
    }

    pub(crate) async fn patch_json<B, T>(&self, url: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, url, Some(body)).await
    }

    /// Make a request, retrying transient failures a bounded number of times
    /// with jittered exponential backoff.
    async fn send<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T, RemoteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let mut retries = 0;

        loop {
            match self.send_once(method.clone(), url, body).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = backoff_for(&e, retries);
                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once<B, T>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .request(method, url)
            .basic_auth("", Some(&self.token));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(net_err)?;
        let status = response.status();

        match status {
            s if s.is_success() => {
                let text = response.text().await.map_err(net_err)?;
                Ok(serde_json::from_str(&text)?)
            }

            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Unauthorized {
                message: "invalid or expired token".to_string(),
            }),

            StatusCode::NOT_FOUND => {
                debug!(url, "resource not found (404)");
                Err(RemoteError::NotFound {
                    what: url.to_string(),
                })
            }

            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(RemoteError::RateLimited { retry_after })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(RemoteError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

fn backoff_for(error: &RemoteError, retries: u32) -> Duration {
    if let RemoteError::RateLimited {
        retry_after: Some(retry_after),
    } = error
    {
        return (*retry_after).min(Duration::from_secs(30));
    }
    let base = Duration::from_secs(1 << retries).min(Duration::from_secs(30));
    let jittered_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64);
    Duration::from_millis(jittered_ms.max(10))
}

fn net_err(e: reqwest::Error) -> RemoteError {
    RemoteError::Network {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_url_pins_version_and_route() {
        let backend = HttpBackend::new(&HttpClientConfig::new(
            "https://dev.azure.com/acme/",
            "secret",
        ))
        .unwrap();
        let url = backend.versioned_url("Acme%20Web/_apis/test/Runs/7/results", RESULTS_API_VERSION);
        assert_eq!(
            url,
            "https://dev.azure.com/acme/Acme%20Web/_apis/test/Runs/7/results?api-version=5.0-preview.5"
        );
    }

    #[test]
    fn backoff_is_bounded() {
        let err = RemoteError::Network {
            message: "reset".to_string(),
        };
        for retries in 1..=6 {
            assert!(backoff_for(&err, retries) <= Duration::from_secs(30));
        }
    }

    #[test]
    fn rate_limit_backoff_honors_retry_after() {
        let err = RemoteError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(backoff_for(&err, 1), Duration::from_secs(2));
    }
}
