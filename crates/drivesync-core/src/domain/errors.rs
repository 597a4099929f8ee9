//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly validation failures when constructing domain values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid relative path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid remote ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// Timestamp that could not be parsed as RFC 3339
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
