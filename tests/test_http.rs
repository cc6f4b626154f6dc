//! Integration tests for the HTTP control surface, driven through the real
//! router via `tower::ServiceExt::oneshot` rather than a live listener.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use swerex_runtime::facade::RuntimeFacade;
use swerex_runtime::http::{build_router, AppState};
use swerex_runtime::session::Observation;
use tower::ServiceExt;

fn app() -> axum::Router {
    build_router(AppState::new(RuntimeFacade::new(), String::new()))
}

fn app_with_key(key: &str) -> axum::Router {
    build_router(AppState::new(RuntimeFacade::new(), key.to_string()))
}

fn json_request(method: &str, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn multipart_body(boundary: &str, file_bytes: &[u8], target_path: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"file\"\r\n\r\n");
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"target_path\"\r\n\r\n");
    body.extend_from_slice(target_path.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

// ---------------------------------------------------------------------------
// Basic endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_is_alive_returns_ok_true() {
    let response = app()
        .oneshot(Request::builder().uri("/is_alive").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["ok"], true);
}

#[tokio::test]
async fn test_create_run_close_session_round_trip() {
    let app = app();

    let create_body = serde_json::json!({"session": "main"}).to_string();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/create_session", create_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let run_body = serde_json::json!({"session": "main", "command": "echo hi"}).to_string();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/run_in_session", run_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: Observation = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.output, "hi\n");

    let close_body = serde_json::json!({"session": "main"}).to_string();
    let response = app
        .oneshot(json_request("POST", "/close_session", close_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_execute_runs_a_one_shot_shell_command() {
    let body = serde_json::json!({"command": "echo one-shot", "shell": true}).to_string();
    let response = app()
        .oneshot(json_request("POST", "/execute", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: swerex_runtime::executor::OneShotResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.stdout, "one-shot\n");
}

// ---------------------------------------------------------------------------
// Error envelope contract: every application error, including request
// validation failures, crosses the boundary as a 511 {error_kind, message}
// JSON body (spec.md §4.6/§9).
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_run_in_unknown_session_returns_511_envelope() {
    let run_body = serde_json::json!({"session": "ghost", "command": "echo hi"}).to_string();
    let response = app()
        .oneshot(json_request("POST", "/run_in_session", run_body))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 511);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["error_kind"], "SessionDoesNotExistError");
}

#[tokio::test]
async fn test_execute_with_malformed_command_shape_returns_511_envelope() {
    // `shell` is false (the default) but `command` is a string, not an array.
    let body = serde_json::json!({"command": "echo hi"}).to_string();
    let response = app()
        .oneshot(json_request("POST", "/execute", body))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 511);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["error_kind"], "InvalidRequestError");
}

#[tokio::test]
async fn test_upload_missing_target_path_returns_511_envelope() {
    let boundary = "swerex-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"file\"\r\n\r\n");
    body.extend_from_slice(b"payload");
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 511);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["error_kind"], "InvalidRequestError");
}

#[tokio::test]
async fn test_read_missing_file_surfaces_file_op_error_envelope() {
    let read_body = serde_json::json!({"path": "/nonexistent/path/for/swerex/tests"}).to_string();
    let response = app()
        .oneshot(json_request("POST", "/read_file", read_body))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 511);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["error_kind"], "FileOpError");
}

// ---------------------------------------------------------------------------
// Upload/read round trip (spec.md §8 scenario 8)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upload_then_read_file_round_trips_byte_identical_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target_path = dir.path().join("uploaded.bin");
    let target_path_str = target_path.to_str().unwrap().to_string();

    let payload = vec![0x5au8; 1024];
    let boundary = "swerex-test-boundary";
    let body = multipart_body(boundary, &payload, &target_path_str);

    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let read_body = serde_json::json!({"path": target_path_str}).to_string();
    let response = app()
        .oneshot(json_request("POST", "/read_file", read_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes_on_disk = std::fs::read(&target_path).expect("read uploaded file from disk");
    assert_eq!(bytes_on_disk, payload);
}

// ---------------------------------------------------------------------------
// `X-API-Key` auth middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rejects_missing_key_when_configured() {
    let app = app_with_key("secret");
    let response = app
        .oneshot(Request::builder().uri("/is_alive").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accepts_matching_key() {
    let app = app_with_key("secret");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/is_alive")
                .header("X-API-Key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_allows_all_requests_when_key_is_empty() {
    let app = app_with_key("");
    let response = app
        .oneshot(Request::builder().uri("/is_alive").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
