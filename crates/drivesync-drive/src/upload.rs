//! Upload operations for the Drive API
//!
//! Provides functions for sending file content:
//! - [`create_file`] - Multipart upload of metadata and content in one request
//! - [`update_file`] - Media upload replacing the content of an existing file
//!
//! The whole file is read into memory before sending, which keeps retries
//! simple; the request body is rebuilt from it on each attempt.
//!
//! See: <https://developers.google.com/drive/api/guides/manage-uploads>

use std::path::Path;

use reqwest::Method;
use tracing::debug;

use drivesync_core::domain::{RemoteId, RemoteItem};

use crate::client::{DriveClient, UPLOAD_PATH};
use crate::files::{parse_file, FILE_FIELDS};
use crate::DriveError;

/// Separator between the parts of a multipart upload body
const BOUNDARY: &str = "drivesync-multipart-boundary";

/// Content type of uploads whose extension is not recognised
const OCTET_STREAM: &str = "application/octet-stream";

/// Extension to MIME type for common document, image and archive formats
const MIME_BY_EXTENSION: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
];

/// MIME type of a file named `name`, from its extension
pub fn mime_type_for(name: &str) -> &'static str {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return OCTET_STREAM;
    };
    let ext = ext.to_ascii_lowercase();
    MIME_BY_EXTENSION
        .iter()
        .find(|(known, _)| *known == ext)
        .map_or(OCTET_STREAM, |&(_, mime)| mime)
}

/// Builds a `multipart/related` body: JSON metadata followed by the content
fn multipart_body(metadata: &serde_json::Value, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{BOUNDARY}\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Uploads `source` as a new file named `name`
///
/// Uses `POST /upload/drive/v3/files?uploadType=multipart`. Without a
/// parent the file lands in the top-level folder. The metadata carries the
/// MIME type guessed from `name` when the extension is known.
///
/// # Errors
/// Returns an error if the file cannot be read, the upload fails or the
/// response cannot be parsed
pub async fn create_file(
    client: &DriveClient,
    name: &str,
    parent: Option<&RemoteId>,
    source: &Path,
) -> Result<RemoteItem, DriveError> {
    let content = tokio::fs::read(source).await?;
    let mime_type = mime_type_for(name);
    let mut metadata = serde_json::json!({ "name": name });
    if mime_type != OCTET_STREAM {
        metadata["mimeType"] = serde_json::json!(mime_type);
    }
    if let Some(parent) = parent {
        metadata["parents"] = serde_json::json!([parent.as_str()]);
    }
    let body = multipart_body(&metadata, mime_type, &content);
    debug!(name, mime_type, bytes = content.len(), "Uploading new file");

    let response = client
        .execute("create_file", || {
            client
                .request(Method::POST, UPLOAD_PATH)
                .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
                .header(
                    reqwest::header::CONTENT_TYPE,
                    format!("multipart/related; boundary={BOUNDARY}"),
                )
                .body(body.clone())
        })
        .await?;

    let item = parse_file(response).await?;
    debug!(id = %item.id, name, "Upload completed");
    Ok(item)
}

/// Replaces the content of `id` with the bytes of `source`
///
/// Uses `PATCH /upload/drive/v3/files/{id}?uploadType=media` with the given
/// content type.
pub async fn update_file(
    client: &DriveClient,
    id: &RemoteId,
    source: &Path,
    content_type: &str,
) -> Result<RemoteItem, DriveError> {
    let content = tokio::fs::read(source).await?;
    let path = format!("{UPLOAD_PATH}/{}", id.as_str());
    debug!(%id, content_type, bytes = content.len(), "Updating file content");

    let response = client
        .execute("update_file", || {
            client
                .request(Method::PATCH, &path)
                .query(&[("uploadType", "media"), ("fields", FILE_FIELDS)])
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(content.clone())
        })
        .await?;

    parse_file(response).await
}
