//! Error types for conflict handling

use thiserror::Error;

/// Errors that can occur while configuring conflict resolution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// The configured strategy label is not one of the known strategies
    #[error("invalid conflict strategy '{label}'; valid: {valid}")]
    InvalidStrategy { label: String, valid: String },
}
