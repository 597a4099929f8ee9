//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for interacting with the remote
//! hierarchical file store. The shipped implementation targets the Google
//! Drive v3 REST API, but the trait only assumes a flat, paginated listing
//! of items linked through parent ids.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - Listing is exposed one page at a time; the sync engine drives the loop.
//! - Mutating calls return the item as the server sees it afterwards so the
//!   caller can record fresh timestamps without another round-trip.

use std::path::Path;

use crate::domain::{RemoteId, RemoteItem};

/// Restriction applied to a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    /// Include items that are in the trash
    pub include_trashed: bool,
}

impl ListFilter {
    /// Everything that is not in the trash
    pub fn untrashed() -> Self {
        Self {
            include_trashed: false,
        }
    }
}

impl Default for ListFilter {
    fn default() -> Self {
        Self::untrashed()
    }
}

/// One page of a remote listing
#[derive(Debug, Clone, Default)]
pub struct RemotePage {
    /// Items on this page, files and folders mixed
    pub items: Vec<RemoteItem>,
    /// Continuation token; `None` or empty on the last page
    pub next_page_token: Option<String>,
}

impl RemotePage {
    /// Returns the continuation token if another page follows
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Port trait for remote store operations
///
/// ## Implementation Notes
///
/// - Implementations handle authentication, timeouts and retries of
///   transient failures internally.
/// - `get_item` returns `Ok(None)` when the id does not exist; other
///   failures are errors.
/// - `create_file` with `parent = None` places the file at the top level.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Fetches one page of the listing
    ///
    /// # Arguments
    /// * `filter` - Which items to include
    /// * `page_token` - Continuation token from the previous page (None for the first)
    async fn list_page(
        &self,
        filter: ListFilter,
        page_token: Option<&str>,
    ) -> anyhow::Result<RemotePage>;

    /// Retrieves a single item by id (or the `root` alias)
    async fn get_item(&self, id: &RemoteId) -> anyhow::Result<Option<RemoteItem>>;

    /// Creates a folder named `name` inside `parent`
    async fn create_folder(&self, name: &str, parent: &RemoteId) -> anyhow::Result<RemoteItem>;

    /// Uploads `source` as a new file named `name`
    async fn create_file(
        &self,
        name: &str,
        parent: Option<&RemoteId>,
        source: &Path,
    ) -> anyhow::Result<RemoteItem>;

    /// Replaces the content of an existing file
    ///
    /// # Arguments
    /// * `id` - The file to update
    /// * `source` - Local file whose bytes become the new content
    /// * `content_type` - Content type sent with the upload
    async fn update_file(
        &self,
        id: &RemoteId,
        source: &Path,
        content_type: &str,
    ) -> anyhow::Result<RemoteItem>;

    /// Downloads the content of `id` to `destination`, replacing it
    async fn download(&self, id: &RemoteId, destination: &Path) -> anyhow::Result<()>;

    /// Moves an item to the trash
    async fn trash(&self, id: &RemoteId) -> anyhow::Result<()>;
}
