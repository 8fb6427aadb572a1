//! HTTP client for FDSN web services.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Configuration for the download client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum concurrent requests issued by one download call.
    pub concurrency: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for failed requests.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 4, // Data centers throttle aggressive clients
            timeout: Duration::from_secs(60),
            max_retries: 10,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            user_agent: format!("seiswave/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Errors that can occur during requests.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status after all retries.
    #[error("Server error: {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },

    /// Server rejected the request (4xx other than 404).
    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// First line of the service's error message.
        message: String,
    },
}

/// HTTP client with connection pooling and retry logic.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    config: ClientConfig,
}

impl DownloadClient {
    /// Creates a new download client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            // Connection timeout (separate from request timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs a GET request with query parameters, returning the body.
    ///
    /// Returns `Ok(None)` when the service reports no data (204 or 404).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the
    /// service rejects it.
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Bytes>, FetchError> {
        let mut attempts = 0;

        loop {
            match self.client.get(url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
                        tracing::debug!(url, "no data");
                        return Ok(None);
                    }

                    // Retry on server errors (5xx) and rate limiting (429)
                    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if attempts < self.config.max_retries {
                            attempts += 1;
                            let delay = self.calculate_backoff_delay(attempts);
                            tracing::warn!(url, status = status.as_u16(), attempts, ?delay, "retrying");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(FetchError::ServerError {
                            status: status.as_u16(),
                        });
                    }

                    if status.is_client_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(FetchError::Rejected {
                            status: status.as_u16(),
                            message: first_message_line(&body),
                        });
                    }

                    return Ok(Some(response.bytes().await?));
                }
                Err(e) if Self::is_retryable_error(&e) && attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = self.calculate_backoff_delay(attempts);
                    tracing::warn!(url, error = %e, attempts, ?delay, "retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Calculates the backoff delay with exponential backoff and jitter.
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff: base_delay * 2^attempt
        let exp_delay = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(10));

        let capped_delay = exp_delay.min(self.config.max_delay_ms);

        // Deterministic jitter (±25%) keyed on the attempt number
        let jitter_range = capped_delay / 4;
        let jitter = if jitter_range > 0 {
            let jitter_offset = (u64::from(attempt) * 17) % (jitter_range * 2);
            jitter_offset as i64 - jitter_range as i64
        } else {
            0
        };

        let final_delay = (capped_delay as i64 + jitter).max(100) as u64;
        Duration::from_millis(final_delay)
    }

    /// Determines if an error is retryable.
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        // Don't retry builder errors (configuration issues)
        if error.is_builder() {
            return false;
        }

        error.is_timeout() || error.is_connect() || error.is_request()
    }
}

/// Extracts the first meaningful line of an FDSN error document.
fn first_message_line(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("Error 4"))
        .unwrap_or("no message")
        .chars()
        .take(200)
        .collect()
}
