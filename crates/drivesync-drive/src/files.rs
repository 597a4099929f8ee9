//! Drive v3 `files` resource
//!
//! Listing, single-item metadata, folder creation and trashing. Every
//! request asks only for the fields a [`RemoteItem`] needs:
//!
//! - `owners(me)` tells whether the user owns the item
//! - `sharedWithMeTime` is present on items shared with the user
//! - `parents` links the flat listing into a tree
//!
//! See: <https://developers.google.com/drive/api/reference/rest/v3/files>

use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use drivesync_core::domain::{RemoteId, RemoteItem, Timestamp, FOLDER_MIME_TYPE};
use drivesync_core::ports::{ListFilter, RemotePage};

use crate::client::{DriveClient, FILES_PATH};
use crate::DriveError;

/// Fields requested for a single file
pub const FILE_FIELDS: &str =
    "id,name,owners(me),parents,mimeType,sharedWithMeTime,modifiedTime,createdTime";

/// Largest page the API serves
pub const MAX_PAGE_SIZE: u32 = 1000;

// ============================================================================
// Drive API response types (JSON deserialization)
// ============================================================================

/// A file resource as returned with [`FILE_FIELDS`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    parents: Vec<String>,
    mime_type: String,
    #[serde(default)]
    owners: Vec<Owner>,
    shared_with_me_time: Option<String>,
    modified_time: Option<Timestamp>,
    created_time: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    #[serde(default)]
    me: bool,
}

/// Response of `files.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

impl TryFrom<DriveFile> for RemoteItem {
    type Error = DriveError;

    fn try_from(file: DriveFile) -> Result<Self, Self::Error> {
        let invalid = |e: drivesync_core::domain::DomainError| DriveError::InvalidResponse(e.to_string());
        let parents = file
            .parents
            .into_iter()
            .map(RemoteId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        Ok(RemoteItem {
            id: RemoteId::new(file.id).map_err(invalid)?,
            name: file.name,
            parents,
            mime_type: file.mime_type,
            owned_by_me: file.owners.iter().any(|o| o.me),
            shared_with_me: file.shared_with_me_time.is_some(),
            modified: file.modified_time,
            created: file.created_time,
            path: None,
        })
    }
}

/// Parses a single file resource from a response body
pub(crate) async fn parse_file(response: reqwest::Response) -> Result<RemoteItem, DriveError> {
    let file: DriveFile = response
        .json()
        .await
        .map_err(|e| DriveError::InvalidResponse(e.to_string()))?;
    RemoteItem::try_from(file)
}

fn list_query(filter: ListFilter) -> &'static str {
    if filter.include_trashed {
        ""
    } else {
        "trashed = false"
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Fetches one page of the user's files
///
/// # Arguments
/// * `client` - The authenticated DriveClient
/// * `filter` - Whether trashed items are included
/// * `page_token` - Continuation token of the previous page
/// * `page_size` - Requested page size, clamped to the API maximum
pub async fn list_page(
    client: &DriveClient,
    filter: ListFilter,
    page_token: Option<&str>,
    page_size: u32,
) -> Result<RemotePage, DriveError> {
    let fields = format!("nextPageToken,files({FILE_FIELDS})");
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
    let q = list_query(filter);

    let response = client
        .execute("list", || {
            let mut request = client.request(Method::GET, FILES_PATH).query(&[
                ("fields", fields.as_str()),
                ("pageSize", page_size.as_str()),
                ("spaces", "drive"),
            ]);
            if !q.is_empty() {
                request = request.query(&[("q", q)]);
            }
            if let Some(token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }
            request
        })
        .await?;

    let list: FileList = response
        .json()
        .await
        .map_err(|e| DriveError::InvalidResponse(e.to_string()))?;

    let items = list
        .files
        .into_iter()
        .map(RemoteItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        items = items.len(),
        has_next = list.next_page_token.is_some(),
        "Listed page"
    );

    Ok(RemotePage {
        items,
        next_page_token: list.next_page_token,
    })
}

/// Fetches metadata of one item; `Ok(None)` if it does not exist
pub async fn get(client: &DriveClient, id: &RemoteId) -> Result<Option<RemoteItem>, DriveError> {
    let path = format!("{FILES_PATH}/{}", id.as_str());
    let result = client
        .execute("get", || {
            client
                .request(Method::GET, &path)
                .query(&[("fields", FILE_FIELDS)])
        })
        .await;

    match result {
        Ok(response) => parse_file(response).await.map(Some),
        Err(DriveError::NotFound(_)) => {
            debug!(%id, "Item not found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Creates a folder named `name` inside `parent`
pub async fn create_folder(
    client: &DriveClient,
    name: &str,
    parent: &RemoteId,
) -> Result<RemoteItem, DriveError> {
    let body = serde_json::json!({
        "name": name,
        "mimeType": FOLDER_MIME_TYPE,
        "parents": [parent.as_str()],
    });
    let response = client
        .execute("create_folder", || {
            client
                .request(Method::POST, FILES_PATH)
                .query(&[("fields", FILE_FIELDS)])
                .json(&body)
        })
        .await?;

    let folder = parse_file(response).await?;
    debug!(id = %folder.id, name, "Folder created");
    Ok(folder)
}

/// Moves an item to the trash
pub async fn trash(client: &DriveClient, id: &RemoteId) -> Result<(), DriveError> {
    let path = format!("{FILES_PATH}/{}", id.as_str());
    let body = serde_json::json!({ "trashed": true });
    client
        .execute("trash", || {
            client
                .request(Method::PATCH, &path)
                .query(&[("fields", "id")])
                .json(&body)
        })
        .await?;
    debug!(%id, "Item trashed");
    Ok(())
}
