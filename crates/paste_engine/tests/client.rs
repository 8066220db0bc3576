use std::path::Path;

use paste_engine::{
    ClientSettings, DownloadRequest, FailureKind, ReqwestServerApi, ServerApi,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestServerApi {
    ReqwestServerApi::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("api")
}

fn request() -> DownloadRequest {
    DownloadRequest {
        urls: vec!["https://example.com/v".to_string()],
        format: "mp4".to_string(),
        quality: "1080p".to_string(),
        path: String::new(),
        download_ids: vec!["download_0_17".to_string()],
    }
}

#[tokio::test]
async fn validate_path_posts_json_and_decodes_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate_path"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "path": "/srv/media" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": false,
            "message": "Path does not exist or is not a directory"
        })))
        .mount(&server)
        .await;

    let verdict = api_for(&server)
        .validate_path("/srv/media")
        .await
        .expect("verdict");
    assert!(!verdict.valid);
    assert_eq!(
        verdict.message.as_deref(),
        Some("Path does not exist or is not a directory")
    );
}

#[tokio::test]
async fn submit_sends_contract_fields_and_job_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .and(body_json(json!({
            "urls": ["https://example.com/v"],
            "format": "mp4",
            "quality": "1080p",
            "path": "",
            "download_ids": ["download_0_17"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "results": [{
                "url": "https://example.com/v",
                "title": "V",
                "path": "/tmp/just_paste_x/V.mp4",
                "size": "1.00 MB"
            }],
            "errors": [],
            "download_type": "single",
            "download_url": "/download_file?path=%2Ftmp%2Fjust_paste_x%2FV.mp4"
        })))
        .mount(&server)
        .await;

    let response = api_for(&server)
        .submit_download(&request())
        .await
        .expect("response");
    assert!(response.success);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.download_type.as_deref(), Some("single"));
    assert_eq!(
        response.download_url.as_deref(),
        Some("/download_file?path=%2Ftmp%2Fjust_paste_x%2FV.mp4")
    );
}

#[tokio::test]
async fn submit_decodes_error_bodies_of_failed_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "Missing required parameters" })),
        )
        .mount(&server)
        .await;

    let response = api_for(&server)
        .submit_download(&request())
        .await
        .expect("decoded body");
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Missing required parameters"));
}

#[tokio::test]
async fn submit_without_json_body_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .submit_download(&request())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
}

#[tokio::test]
async fn history_decodes_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 3,
                "url": "https://example.com/v",
                "title": "V",
                "file_format": "mp4",
                "quality": "720p",
                "file_size": "1.00 MB",
                "download_path": "/srv/media/V.mp4",
                "timestamp": "2024-03-09T14:05:00.123456Z",
                "status": "completed"
            },
            { "id": 4, "file_format": "mp3", "title": null, "timestamp": "garbage" }
        ])))
        .mount(&server)
        .await;

    let records = api_for(&server).history().await.expect("history");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 3);
    assert_eq!(
        records[0].timestamp_utc().map(|ts| ts.to_rfc3339()),
        Some("2024-03-09T14:05:00.123456+00:00".to_string())
    );
    assert_eq!(records[1].title, None);
    assert_eq!(records[1].timestamp_utc(), None);
}

#[tokio::test]
async fn history_failure_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = api_for(&server).history().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn delete_and_clear_accept_any_http_answer() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete_history/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Record not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clear_history"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "History cleared" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.delete_history(9).await.expect("delivered");
    api.clear_history().await.expect("delivered");
}

#[tokio::test]
async fn transport_failure_is_network_error() {
    let api = ReqwestServerApi::new(ClientSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        ..ClientSettings::default()
    })
    .expect("api");

    let err = api.history().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}

#[tokio::test]
async fn base_url_keeps_its_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/paste/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let api = ReqwestServerApi::new(ClientSettings {
        base_url: format!("{}/paste", server.uri()),
        ..ClientSettings::default()
    })
    .expect("api");
    assert!(api.history().await.expect("history").is_empty());
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestServerApi::new(ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn artifact_is_streamed_into_save_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_file"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=ignored.mp4")
                .set_body_bytes(b"media-bytes".to_vec()),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let save_dir = dir.path().join("downloads");
    let saved = api_for(&server)
        .fetch_artifact("/download_file?path=%2Ftmp%2Fjust_paste_x%2FSong.mp3", &save_dir)
        .await
        .expect("saved");

    assert_eq!(saved, save_dir.join("Song.mp3"));
    assert_eq!(std::fs::read(&saved).expect("read"), b"media-bytes");
    assert_only_file(&save_dir, "Song.mp3");
}

#[tokio::test]
async fn missing_artifact_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_file"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "File not found" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let err = api_for(&server)
        .fetch_artifact("/download_file?path=%2Fnope", dir.path())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

fn assert_only_file(dir: &Path, name: &str) {
    let names: Vec<_> = std::fs::read_dir(dir)
        .expect("dir")
        .map(|entry| entry.expect("entry").file_name().into_string().expect("utf8"))
        .collect();
    assert_eq!(names, vec![name.to_string()]);
}
