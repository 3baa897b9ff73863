//! Low-level HTTP transport shared by every node endpoint in [`crate::daemon`].
//!
//! Plain JSON POST/GET, not a JSON-RPC 2.0 envelope — the node exposes
//! simple REST-ish paths (`/info`, `/getrawblocks`, …), not a single
//! `/json_rpc` dispatch method. Retries use a fixed backoff multiplier
//! (no jitter), driven by `RpcConfig{retries, retry_delay}` and
//! `RpcError::is_transient()`.

use crate::error::RpcError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Configuration for a [`HttpClient`].
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Base URL, e.g. `http://localhost:19081`.
    pub url: String,
    /// Per-request timeout (default 10s).
    pub timeout: Duration,
    /// Number of retries after the first attempt.
    pub retries: u32,
    /// Delay before the first retry; doubles on each subsequent attempt.
    pub retry_delay: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:17767".to_string(),
            timeout: Duration::from_secs(ember_types::constants::REQUEST_TIMEOUT_SECS),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Thin wrapper over `reqwest` with the wallet's User-Agent, JSON
/// content type, retry/backoff, and error-taxonomy mapping.
pub struct HttpClient {
    client: reqwest::Client,
    config: RpcConfig,
}

impl HttpClient {
    pub fn new(config: RpcConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ember-wallet/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("building the HTTP client cannot fail with a static config");
        Self { client, config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Replace the base URL in place (used by `swap_node`).
    pub fn set_url(&mut self, url: String) {
        self.config.url = url;
    }

    /// POST a JSON body to `path` under the configured base URL, retrying
    /// transient failures with backoff, and decode the JSON response.
    pub async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        method: &str,
        body: &Req,
    ) -> Result<Resp, RpcError> {
        let url = format!("{}{}", self.config.url, path);
        let attempts = self.config.retries + 1;
        let mut last_err = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay * 2u32.saturating_pow(attempt - 1);
                log::warn!("retrying {method} after {delay:?} (attempt {attempt})");
                tokio::time::sleep(delay).await;
            }

            match self.try_post(&url, method, body).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let retry = e.is_transient() && attempt + 1 < attempts;
                    log::debug!("{method} attempt {attempt} failed: {e}");
                    if !retry {
                        return Err(e);
                    }
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(RpcError::Other(format!("{method}: exhausted retries"))))
    }

    async fn try_post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        body: &Req,
    ) -> Result<Resp, RpcError> {
        let started = std::time::Instant::now();
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    RpcError::Timeout {
                        method: method.to_string(),
                    }
                } else {
                    RpcError::Connection {
                        url: url.to_string(),
                        source,
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(RpcError::AuthFailed {
                url: url.to_string(),
            });
        }
        if status.as_u16() == 503 {
            return Err(RpcError::Busy {
                method: method.to_string(),
            });
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RpcError::HttpStatus {
                method: method.to_string(),
                status: status.as_u16(),
                body: body_text.chars().take(500).collect(),
            });
        }

        let raw: Value = response.json().await.map_err(|source| RpcError::Connection {
            url: url.to_string(),
            source,
        })?;

        log::debug!("{method} completed in {:?}", started.elapsed());

        serde_json::from_value(raw).map_err(|source| RpcError::Json {
            method: method.to_string(),
            source,
        })
    }

    /// GET a JSON response from `path`, same retry/error handling as
    /// [`post_json`](Self::post_json).
    pub async fn get_json<Resp: DeserializeOwned>(
        &self,
        path: &str,
        method: &str,
    ) -> Result<Resp, RpcError> {
        let url = format!("{}{}", self.config.url, path);
        let attempts = self.config.retries + 1;
        let mut last_err = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }
            match self.try_get(&url, method).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let retry = e.is_transient() && attempt + 1 < attempts;
                    if !retry {
                        return Err(e);
                    }
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(RpcError::Other(format!("{method}: exhausted retries"))))
    }

    async fn try_get<Resp: DeserializeOwned>(&self, url: &str, method: &str) -> Result<Resp, RpcError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| RpcError::Connection {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RpcError::HttpStatus {
                method: method.to_string(),
                status: status.as_u16(),
                body: body_text.chars().take(500).collect(),
            });
        }

        let raw: Value = response.json().await.map_err(|source| RpcError::Connection {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_value(raw).map_err(|source| RpcError::Json {
            method: method.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_spec_timeout() {
        let config = RpcConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn set_url_replaces_base() {
        let mut client = HttpClient::new(RpcConfig::default());
        client.set_url("http://example.com:1111".to_string());
        assert_eq!(client.url(), "http://example.com:1111");
    }
}
