//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for identifiers. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Identifier of an item in the remote drive
///
/// Drive ids are opaque url-safe strings. The alias `root` is also accepted
/// and addresses the user's top-level folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Alias the remote store resolves to the top-level folder.
    pub const ROOT_ALIAS: &'static str = "root";

    /// Create a new RemoteId
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains characters outside the
    /// url-safe alphabet
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidRemoteId(
                "Remote ID cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidRemoteId(format!(
                "Remote ID contains invalid characters: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// The `root` alias.
    #[must_use]
    pub fn root_alias() -> Self {
        Self(Self::ROOT_ALIAS.to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemoteId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

/// Validate a `/`-separated path relative to the sync root.
///
/// # Errors
/// Returns error for empty, absolute, or dot-segment paths
pub fn validate_relative_path(path: &str) -> Result<(), DomainError> {
    if path.is_empty() {
        return Err(DomainError::InvalidPath("path cannot be empty".to_string()));
    }
    if path.starts_with('/') {
        return Err(DomainError::InvalidPath(format!(
            "path must be relative: {path}"
        )));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(DomainError::InvalidPath(format!(
            "path has an empty or dot segment: {path}"
        )));
    }
    Ok(())
}
