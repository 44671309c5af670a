use axum::body::Body;
use axum::http::{Request, StatusCode};
use intake_pipeline::{Orchestrator, PipelineConfig, TtsEngine};
use intake_server::{app, AppState};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn test_state(workdir: &Path) -> AppState {
    let mut config = PipelineConfig::default();
    // Never reached in these tests: every request is rejected before dispatch.
    config.api.base_url = "http://127.0.0.1:9/v1".to_string();
    config.tts.engine = TtsEngine::Disabled;
    config.storage.temp_dir = workdir.join("temp");
    config.storage.audio_dir = workdir.join("outputs/audio");
    config.storage.json_dir = workdir.join("outputs/json");

    AppState {
        temp_dir: config.storage.temp_dir.clone(),
        json_dir: config.storage.json_dir.clone(),
        audio_dir: config.storage.audio_dir.clone(),
        orchestrator: Arc::new(Orchestrator::new(config)),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_request(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "X-INTAKE-TEST-BOUNDARY";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/process")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(test_state(temp.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unsupported_upload_is_rejected_before_any_remote_call() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(test_state(temp.path()));

    let response = app
        .oneshot(multipart_request("notes.txt", b"plain text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(
        json["error"].as_str().unwrap().contains("unsupported media"),
        "got: {}",
        json["error"]
    );
}

#[tokio::test]
async fn empty_multipart_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(test_state(temp.path()));

    let boundary = "X-INTAKE-TEST-BOUNDARY";
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/process")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(format!("--{boundary}--\r\n")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "no file provided");
}

#[tokio::test]
async fn reports_listing_is_empty_then_shows_persisted_reports() {
    let temp = tempfile::tempdir().unwrap();
    let state = test_state(temp.path());
    let json_dir = state.json_dir.clone();
    let app = app(state);

    // Before the directory even exists.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/reports")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reports"].as_array().unwrap().len(), 0);

    // Persist one report by hand.
    std::fs::create_dir_all(&json_dir).unwrap();
    std::fs::write(
        json_dir.join("booking_result.json"),
        r#"{"pipeline_type": "audio", "final_output": {"error": "Speech-to-text failed"}}"#,
    )
    .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/reports")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let reports = json["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["name"], "booking_result.json");

    // And fetch it back.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/booking_result.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["pipeline_type"], "audio");
}

#[tokio::test]
async fn report_fetch_rejects_traversal_and_unknown_names() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(test_state(temp.path()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/reports/..%2Fsecrets.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/never_ran_result.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
