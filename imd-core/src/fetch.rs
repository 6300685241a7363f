//! Resilient page fetching.
//!
//! The station pages are served from hosts whose TLS set-up is not always
//! valid, and which drop connections under load. [`Fetcher`] wraps a
//! [`Transport`] with:
//! - a bounded number of attempts (`max_retries + 1`)
//! - exponential backoff between attempts (`backoff_factor * 2^attempt` seconds)
//! - a same-attempt retry without certificate verification when the
//!   verified request fails on the certificate

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::{ImdError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;

/// Retry and request settings for the fetch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub max_retries: u32,
    /// Seconds; the wait before attempt `n + 1` is `backoff_factor * 2^n`.
    pub backoff_factor: f64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchOptions {
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Wait after the failed 0-indexed `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(attempt.min(30) as i32);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

/// Why a single GET failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("certificate verification failed: {0}")]
    Certificate(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's own message embeds the URL, so only its sources are classified.
        let cause = source_chain(&err);
        let chain = error_chain(&err);
        if looks_like_certificate_failure(&cause) {
            TransportError::Certificate(chain)
        } else if err.is_timeout() {
            TransportError::Timeout(chain)
        } else if err.is_connect() {
            TransportError::Connect(chain)
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Other(chain)
        }
    }
}

/// Display of an error and all of its sources, `: `-separated.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let sources = source_chain(err);
    if sources.is_empty() {
        err.to_string()
    } else {
        format!("{err}: {sources}")
    }
}

/// Display of the sources below `err`, without `err` itself.
fn source_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

fn looks_like_certificate_failure(cause: &str) -> bool {
    let lower = cause.to_lowercase();
    ["certificate", "unknownissuer", "tls handshake", "invalid peer"]
        .iter()
        .any(|marker| lower.contains(marker))
}

/// One HTTP GET, with or without certificate verification.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(
        &self,
        url: &str,
        verify_certificates: bool,
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

/// [`Transport`] over `reqwest`; non-2xx responses are errors.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    verified: Client,
    unverified: Client,
}

impl ReqwestTransport {
    pub fn new(options: &FetchOptions) -> std::result::Result<Self, TransportError> {
        Ok(Self {
            verified: build_client(options, false)?,
            unverified: build_client(options, true)?,
        })
    }
}

fn build_client(
    options: &FetchOptions,
    accept_invalid_certs: bool,
) -> std::result::Result<Client, TransportError> {
    Client::builder()
        .user_agent(options.user_agent.as_str())
        .timeout(options.timeout())
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| TransportError::Other(error_chain(&e)))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        verify_certificates: bool,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let http = if verify_certificates {
            &self.verified
        } else {
            &self.unverified
        };

        let res = http.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = res.bytes().await?;
        Ok(body.to_vec())
    }
}

/// Retrying front of a [`Transport`].
#[derive(Debug)]
pub struct Fetcher<T> {
    transport: T,
    options: FetchOptions,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, options: FetchOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch `url`, failing with [`ImdError::Network`] once every attempt failed.
    #[instrument(skip(self), fields(max_retries = self.options.max_retries))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let attempts = self.options.attempts();
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match self.attempt(url, attempt).await {
                Ok(body) => return Ok(body),
                Err(err) => last_error = err.to_string(),
            }

            if attempt + 1 < attempts {
                let delay = self.options.backoff_delay(attempt);
                debug!(
                    attempt = attempt + 1,
                    delay_secs = delay.as_secs_f64(),
                    "waiting before retry"
                );
                tokio::time::sleep(delay).await;
            }
        }

        warn!(attempts, error = %last_error, "all attempts failed");
        Err(ImdError::Network {
            url: url.to_string(),
            attempts,
            last_error,
        })
    }

    async fn attempt(
        &self,
        url: &str,
        attempt: u32,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let number = attempt + 1;
        let total = self.options.attempts();

        match self.transport.get(url, true).await {
            Ok(body) => {
                debug!(attempt = number, bytes = body.len(), "fetched");
                Ok(body)
            }
            Err(TransportError::Certificate(reason)) => {
                warn!(
                    attempt = number,
                    total,
                    %reason,
                    "certificate verification failed, retrying without verification"
                );
                match self.transport.get(url, false).await {
                    Ok(body) => {
                        debug!(
                            attempt = number,
                            bytes = body.len(),
                            "fetched without verification"
                        );
                        Ok(body)
                    }
                    Err(err) => {
                        warn!(attempt = number, total, error = %err, "unverified retry failed");
                        Err(err)
                    }
                }
            }
            Err(err) => {
                warn!(attempt = number, total, error = %err, "request failed");
                Err(err)
            }
        }
    }
}
