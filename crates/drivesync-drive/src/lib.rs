//! DriveSync Drive - Google Drive v3 REST adapter
//!
//! Provides an async client for:
//! - Paginated file listing with ownership and sharing metadata
//! - Folder creation, multipart upload and media update
//! - Streaming download and trashing
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client with timeout and retry handling
//! - [`files`] - Files resource: listing, metadata, folders, trash
//! - [`upload`] - File content uploads (new files and updates)
//! - [`retry`] - Backoff policy and `Retry-After` parsing
//! - [`provider`] - [`IRemoteStore`](drivesync_core::ports::IRemoteStore) implementation

pub mod client;
pub mod files;
pub mod provider;
pub mod retry;
pub mod upload;

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub use client::DriveClient;
pub use provider::DriveRemoteStore;

/// Errors that can occur when communicating with the Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Server-suggested wait, if any
        retry_after: Option<Duration>,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Any other unsuccessful status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading or writing a local file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    /// Classifies an unsuccessful response by status and error body
    pub fn from_status(status: StatusCode, body: &str, retry_after: Option<Duration>) -> Self {
        let message = error_message(body);
        match status.as_u16() {
            401 => Self::Unauthorized(message),
            // Drive reports per-user quota exhaustion as 403.
            403 if body.to_ascii_lowercase().contains("ratelimitexceeded") => {
                Self::TooManyRequests { retry_after }
            }
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            429 => Self::TooManyRequests { retry_after },
            500..=599 => Self::ServerError {
                status: status.as_u16(),
                message,
            },
            code => Self::Http {
                status: code,
                message,
            },
        }
    }

    /// Returns true if repeating the request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TooManyRequests { .. } | Self::ServerError { .. } => true,
            Self::NetworkError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Wait suggested by the server, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::TooManyRequests { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Extracts `error.message` from a Drive error body, or returns it unchanged
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
