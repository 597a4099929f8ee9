//! Shared test helpers for Drive API integration tests
//!
//! Provides wiremock-based mock server setup and JSON builders for Drive
//! file resources.

use std::time::Duration;

use wiremock::MockServer;

use drivesync_drive::retry::RetryPolicy;
use drivesync_drive::{DriveClient, DriveRemoteStore};

/// Starts a mock server and returns a client pointing at it
///
/// Retries back off for milliseconds so retry tests stay fast.
pub async fn setup_drive_mock() -> (MockServer, DriveClient) {
    let server = MockServer::start().await;
    let client = DriveClient::with_base_url("test-access-token", server.uri()).with_retry_policy(
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(5),
        },
    );
    (server, client)
}

/// Same as [`setup_drive_mock`] but wrapped in the port implementation
pub async fn setup_store() -> (MockServer, DriveRemoteStore) {
    let (server, client) = setup_drive_mock().await;
    (server, DriveRemoteStore::new(client))
}

/// A file resource as the API returns it
pub fn file_json(id: &str, name: &str, parent: &str, modified: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "parents": [parent],
        "mimeType": "text/plain",
        "owners": [{"me": true}],
        "modifiedTime": modified,
        "createdTime": "2024-01-01T00:00:00.000Z"
    })
}

/// A folder resource as the API returns it
pub fn folder_json(id: &str, name: &str, parent: Option<&str>) -> serde_json::Value {
    let mut folder = serde_json::json!({
        "id": id,
        "name": name,
        "mimeType": "application/vnd.google-apps.folder",
        "owners": [{"me": true}],
        "modifiedTime": "2024-01-01T00:00:00.000Z"
    });
    if let Some(parent) = parent {
        folder["parents"] = serde_json::json!([parent]);
    }
    folder
}
