//! Domain entities and business logic
//!
//! This module contains the core domain types for DriveSync:
//! - Newtypes for type-safe identifiers
//! - Remote item metadata
//! - Manifest entries
//! - Timestamps and the change-detection tolerance
//! - Domain-specific error types

pub mod errors;
pub mod manifest_entry;
pub mod newtypes;
pub mod remote_item;
pub mod timestamp;

// Re-export commonly used types
pub use errors::DomainError;
pub use manifest_entry::ManifestEntry;
pub use newtypes::*;
pub use remote_item::{RemoteItem, FOLDER_MIME_TYPE, NATIVE_MIME_PREFIX};
pub use timestamp::{is_after, Timestamp};
