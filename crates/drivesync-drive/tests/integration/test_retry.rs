//! Integration tests for transient failure handling

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use drivesync_core::domain::RemoteId;
use drivesync_drive::{files, DriveError};

use crate::common;

fn id(s: &str) -> RemoteId {
    RemoteId::new(s.to_string()).unwrap()
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "file1",
            "a.txt",
            "root0",
            "2024-01-01T00:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let item = files::get(&client, &id("file1")).await.unwrap();
    assert_eq!(item.unwrap().name, "a.txt");
}

#[tokio::test]
async fn test_rate_limit_honours_retry_after() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("PATCH"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "file1"})))
        .expect(1)
        .mount(&server)
        .await;

    files::trash(&client, &id("file1")).await.unwrap();
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = files::get(&client, &id("file1")).await.unwrap_err();
    assert!(matches!(err, DriveError::ServerError { status: 500, .. }));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "The user does not have sufficient permissions."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = files::get(&client, &id("file1")).await.unwrap_err();
    assert!(matches!(err, DriveError::Forbidden(_)));
}
