//! Integration tests for the files resource: listing, metadata, folders, trash

use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

use drivesync_core::domain::RemoteId;
use drivesync_core::ports::{IRemoteStore, ListFilter};

use crate::common;

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_page_requests_untrashed_files() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", "trashed = false"))
        .and(query_param("pageSize", "1000"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                common::folder_json("dir1", "docs", Some("root0")),
                common::file_json("file1", "a.txt", "dir1", "2024-03-01T10:00:00.000Z")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = store
        .list_page(ListFilter::untrashed(), None)
        .await
        .expect("listing failed");

    assert_eq!(page.items.len(), 2);
    assert!(page.items[0].is_folder());
    assert_eq!(page.items[1].name, "a.txt");
    assert_eq!(page.items[1].parents, vec![RemoteId::new("dir1".into()).unwrap()]);
    assert!(page.continuation().is_none());
}

#[tokio::test]
async fn test_list_page_follows_token() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("file2", "b.txt", "root0", "2024-01-02T00:00:00Z")],
            "nextPageToken": ""
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("file1", "a.txt", "root0", "2024-01-01T00:00:00Z")],
            "nextPageToken": "tok-2"
        })))
        .mount(&server)
        .await;

    let first = store.list_page(ListFilter::untrashed(), None).await.unwrap();
    assert_eq!(first.continuation(), Some("tok-2"));

    let second = store
        .list_page(ListFilter::untrashed(), first.continuation())
        .await
        .unwrap();
    assert_eq!(second.items[0].name, "b.txt");
    // An empty token also ends the listing.
    assert!(second.continuation().is_none());
}

#[tokio::test]
async fn test_list_page_reports_sharing() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{
                "id": "shared1",
                "name": "theirs.txt",
                "mimeType": "text/plain",
                "owners": [{"me": false}],
                "sharedWithMeTime": "2024-02-02T00:00:00Z",
                "modifiedTime": "2024-02-01T00:00:00Z"
            }]
        })))
        .mount(&server)
        .await;

    let page = store.list_page(ListFilter::untrashed(), None).await.unwrap();
    let item = &page.items[0];
    assert!(!item.owned_by_me);
    assert!(item.shared_with_me);
    assert!(!item.belongs_to_user(true));
}

// ============================================================================
// Metadata
// ============================================================================

#[tokio::test]
async fn test_get_item_resolves_root_alias() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/root"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::folder_json("0ARootId", "My Drive", None)),
        )
        .mount(&server)
        .await;

    let root = store
        .get_item(&RemoteId::root_alias())
        .await
        .unwrap()
        .expect("root should exist");
    assert_eq!(root.id.as_str(), "0ARootId");
    assert!(root.is_root());
}

#[tokio::test]
async fn test_get_item_missing_is_none() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "File not found: gone."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let item = store
        .get_item(&RemoteId::new("gone".into()).unwrap())
        .await
        .unwrap();
    assert!(item.is_none());
}

#[tokio::test]
async fn test_get_item_unauthorized_is_error() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .mount(&server)
        .await;

    let err = store
        .get_item(&RemoteId::new("file1".into()).unwrap())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Invalid Credentials"));
}

// ============================================================================
// Folders and trash
// ============================================================================

#[tokio::test]
async fn test_create_folder_sends_metadata() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .and(body_json(serde_json::json!({
            "name": "photos",
            "mimeType": "application/vnd.google-apps.folder",
            "parents": ["dir1"]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::folder_json("dir2", "photos", Some("dir1"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let folder = store
        .create_folder("photos", &RemoteId::new("dir1".into()).unwrap())
        .await
        .unwrap();
    assert_eq!(folder.id.as_str(), "dir2");
    assert!(folder.is_folder());
}

#[tokio::test]
async fn test_trash_patches_trashed_flag() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("PATCH"))
        .and(path("/drive/v3/files/file1"))
        .and(body_json(serde_json::json!({ "trashed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "file1"})))
        .expect(1)
        .mount(&server)
        .await;

    store
        .trash(&RemoteId::new("file1".into()).unwrap())
        .await
        .unwrap();
}
