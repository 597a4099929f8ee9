//! Integration tests for content transfers (upload/download)
//!
//! Verifies end-to-end behavior of file upload and download operations
//! against a wiremock-based Drive API mock server.

use tempfile::TempDir;
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, Request, ResponseTemplate};

use drivesync_core::domain::RemoteId;
use drivesync_core::ports::IRemoteStore;

use crate::common;

fn id(s: &str) -> RemoteId {
    RemoteId::new(s.to_string()).unwrap()
}

// ============================================================================
// Download tests
// ============================================================================

#[tokio::test]
async fn test_download_writes_content() {
    let (server, store) = common::setup_store().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("a.txt");

    let content: Vec<u8> = (0..1_048_576).map(|i| (i % 256) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file1"))
        .and(query_param("alt", "media"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.clone())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    store.download(&id("file1"), &destination).await.unwrap();

    assert_eq!(std::fs::read(&destination).unwrap(), content);
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);
}

#[tokio::test]
async fn test_download_replaces_existing_file() {
    let (server, store) = common::setup_store().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("a.txt");
    std::fs::write(&destination, "old content that is longer").unwrap();

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .mount(&server)
        .await;

    store.download(&id("file1"), &destination).await.unwrap();
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), "new");
}

#[tokio::test]
async fn test_download_error_leaves_destination_untouched() {
    let (server, store) = common::setup_store().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("a.txt");
    std::fs::write(&destination, "keep me").unwrap();

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "File not found"}
        })))
        .mount(&server)
        .await;

    assert!(store.download(&id("missing"), &destination).await.is_err());
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), "keep me");
}

// ============================================================================
// Upload tests
// ============================================================================

#[tokio::test]
async fn test_create_file_uses_multipart_upload() {
    let (server, store) = common::setup_store().await;
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("report.txt");
    std::fs::write(&source, "quarterly numbers").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(header(
            "content-type",
            "multipart/related; boundary=drivesync-multipart-boundary",
        ))
        .and(body_string_contains(r#""parents":["dir1"]"#))
        .and(body_string_contains(r#""mimeType":"text/plain""#))
        .and(body_string_contains("Content-Type: text/plain\r\n\r\nquarterly numbers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "new1",
            "report.txt",
            "dir1",
            "2024-06-01T00:00:00.000Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let created = store
        .create_file("report.txt", Some(&id("dir1")), &source)
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "new1");
    assert!(created.modified.is_some());
}

#[tokio::test]
async fn test_create_file_without_parent_omits_parents() {
    let (server, store) = common::setup_store().await;
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("top.txt");
    std::fs::write(&source, "top").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(body_string_contains(r#""name":"top.txt""#))
        .and(body_string_contains(r#""mimeType":"text/plain""#))
        .and(|req: &Request| !String::from_utf8_lossy(&req.body).contains("parents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "new2",
            "top.txt",
            "root0",
            "2024-06-01T00:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    store.create_file("top.txt", None, &source).await.unwrap();
}

#[tokio::test]
async fn test_create_file_of_unknown_type_sends_octet_stream() {
    let (server, store) = common::setup_store().await;
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("blob.bin");
    std::fs::write(&source, "raw").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(body_string_contains(r#"{"name":"blob.bin"}"#))
        .and(body_string_contains("Content-Type: application/octet-stream\r\n\r\nraw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "new3",
            "blob.bin",
            "root0",
            "2024-06-01T00:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    store.create_file("blob.bin", None, &source).await.unwrap();
}

#[tokio::test]
async fn test_update_file_sends_media_with_content_type() {
    let (server, store) = common::setup_store().await;
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("a.txt");
    std::fs::write(&source, "new content").unwrap();

    Mock::given(method("PATCH"))
        .and(path("/upload/drive/v3/files/file1"))
        .and(query_param("uploadType", "media"))
        .and(header("content-type", "application/json"))
        .and(body_string("new content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "file1",
            "a.txt",
            "root0",
            "2024-06-01T12:00:00.000Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let updated = store
        .update_file(&id("file1"), &source, "application/json")
        .await
        .unwrap();
    assert_eq!(updated.id.as_str(), "file1");
}
