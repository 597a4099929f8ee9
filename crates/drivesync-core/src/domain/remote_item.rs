//! Remote drive items
//!
//! A [`RemoteItem`] is the metadata of one file or folder in the remote
//! drive. The listing is flat: hierarchy is expressed only through parent
//! ids, and the full path is attached later by the path resolver.

use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;
use super::timestamp::Timestamp;

/// Mime type the drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Prefix shared by the drive's native document types (and folders).
pub const NATIVE_MIME_PREFIX: &str = "application/vnd.google-apps";

/// Metadata of a single remote file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Opaque, stable identifier
    pub id: RemoteId,
    /// Display name (one path segment)
    pub name: String,
    /// Parent folder ids; empty only for the top-level folder
    pub parents: Vec<RemoteId>,
    /// Content type reported by the drive
    pub mime_type: String,
    /// The authenticated user is among the owners
    pub owned_by_me: bool,
    /// The item carries a shared-with-me marker
    pub shared_with_me: bool,
    /// Last content modification, if reported
    pub modified: Option<Timestamp>,
    /// Creation time, if reported
    pub created: Option<Timestamp>,
    /// Slash-separated path below the drive root, once resolved
    pub path: Option<String>,
}

impl RemoteItem {
    /// Returns true if this item is a folder
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// Returns true for drive-native formats that have no byte content to sync
    pub fn is_native_document(&self) -> bool {
        self.mime_type.starts_with(NATIVE_MIME_PREFIX)
    }

    /// Returns true for the implicit top-level folder (a folder with no parents)
    pub fn is_root(&self) -> bool {
        self.is_folder() && self.parents.is_empty()
    }

    /// First parent id, the one used for path resolution
    pub fn first_parent(&self) -> Option<&RemoteId> {
        self.parents.first()
    }

    /// Modification time, falling back to creation time
    pub fn effective_modified(&self) -> Option<Timestamp> {
        self.modified.or(self.created)
    }

    /// Returns true if the item belongs to the user rather than only being
    /// shared with them.
    ///
    /// Shared items the user added to their drive have parents; with
    /// `sync_shared_in_drive` those count as well.
    pub fn belongs_to_user(&self, sync_shared_in_drive: bool) -> bool {
        if sync_shared_in_drive && !self.parents.is_empty() {
            return true;
        }
        self.owned_by_me && !self.shared_with_me
    }

    /// Resolved path, or the bare name if resolution has not run
    pub fn path_or_name(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}
