//! Google Drive API client
//!
//! Provides an authenticated HTTP client for the Drive v3 REST API. Handles
//! the bearer header, endpoint construction, the request timeout and the
//! retry of transient failures.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use drivesync_drive::client::DriveClient;
//! use drivesync_drive::files;
//! use drivesync_core::ports::ListFilter;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token-here");
//! let page = files::list_page(&client, ListFilter::untrashed(), None, 100).await?;
//! println!("Got {} items", page.items.len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use drivesync_core::config::RemoteConfig;
use drivesync_core::domain::RemoteId;
use drivesync_core::ports::STAGING_SUFFIX;

use crate::retry::{parse_retry_after, RetryPolicy};
use crate::DriveError;

/// Base URL for the Google APIs host
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Path prefix of the Drive v3 metadata endpoints
pub const FILES_PATH: &str = "/drive/v3/files";

/// Path prefix of the Drive v3 content upload endpoints
pub const UPLOAD_PATH: &str = "/upload/drive/v3/files";

/// HTTP client for Google Drive API calls
///
/// Wraps `reqwest::Client` with authentication headers, base URL
/// construction and a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// OAuth2 access token
    access_token: String,
    /// Backoff for transient failures
    retry: RetryPolicy,
}

impl DriveClient {
    /// Creates a new DriveClient with the given access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Creates a new DriveClient with a custom base URL (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Creates a client from the `remote` configuration section
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built
    pub fn from_config(
        access_token: impl Into<String>,
        config: &RemoteConfig,
    ) -> Result<Self, DriveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            retry: RetryPolicy::new(config.retries),
        })
    }

    /// Replaces the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to the base URL (e.g., "/drive/v3/files")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Sends the request produced by `build`, retrying transient failures
    ///
    /// `build` is called once per attempt so request bodies can be
    /// recreated. Unsuccessful statuses are turned into [`DriveError`]s.
    pub async fn execute<F>(&self, operation: &str, build: F) -> Result<Response, DriveError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let err = match build().send().await {
                Ok(response) if response.status().is_success() => {
                    if attempt > 0 {
                        info!(operation, attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Ok(response) => error_from_response(response).await,
                Err(e) => DriveError::NetworkError(e),
            };

            if attempt >= self.retry.max_retries || !err.is_transient() {
                return Err(err);
            }

            let delay = err
                .retry_after()
                .unwrap_or_else(|| self.retry.delay_for(attempt));
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient error, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Downloads the content of `id` into `destination`
    ///
    /// The body is streamed into a sibling temporary file which replaces
    /// the destination only once complete.
    pub async fn download_file(&self, id: &RemoteId, destination: &Path) -> Result<u64, DriveError> {
        let path = format!("{FILES_PATH}/{}", id.as_str());
        debug!(%id, destination = %destination.display(), "Downloading file");

        let response = self
            .execute("download", || {
                self.request(Method::GET, &path).query(&[("alt", "media")])
            })
            .await?;

        let partial = partial_path(destination);
        let written = match stream_to_file(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, destination).await?;

        debug!(%id, bytes = written, "Download complete");
        Ok(written)
    }
}

async fn stream_to_file(response: Response, target: &Path) -> Result<u64, DriveError> {
    let mut file = tokio::fs::File::create(target).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut p = destination.as_os_str().to_owned();
    p.push(STAGING_SUFFIX);
    PathBuf::from(p)
}

async fn error_from_response(response: Response) -> DriveError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let body = response.text().await.unwrap_or_default();
    DriveError::from_status(status, &body, retry_after)
}
