use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use httpmock::Method::{GET, PUT};
use httpmock::MockServer;
use marksync_daemon::build_router;
use marksync_github::GithubClient;
use marksync_renderer::SectionPatcher;
use marksync_sync::{sign, PipelineOptions, WebhookPipeline};
use serde_json::json;
use tower::ServiceExt;

const SECRET: &str = "router-secret";
const README: &str = "# Widgets\n<!-- AUTO_SECTION_START -->\n<!-- AUTO_SECTION_END -->\n";

fn app(server: &MockServer) -> Router {
    let client = GithubClient::new(
        &server.base_url(),
        &server.url("/graphql"),
        "token",
        Duration::from_secs(5),
    );
    let pipeline = WebhookPipeline::new(
        client,
        SECRET,
        PipelineOptions::default(),
        SectionPatcher::new().expect("patcher"),
    );
    build_router(Arc::new(pipeline))
}

fn pull_request_body(action: &str) -> Vec<u8> {
    json!({
        "action": action,
        "repository": {"name": "widgets", "owner": {"login": "octo"}},
        "pull_request": {"head": {"ref": "feature", "sha": "head-sha"}}
    })
    .to_string()
    .into_bytes()
}

fn webhook_request(event: &str, signature: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("x-github-event", event)
        .header("x-github-delivery", "delivery-1")
        .header("x-hub-signature-256", signature)
        .body(Body::from(body))
        .expect("request")
}

fn signed(event: &str, body: Vec<u8>) -> Request<Body> {
    let signature = sign(SECRET.as_bytes(), &body);
    webhook_request(event, &signature, body)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
}

fn mock_head_commit<'a>(server: &'a MockServer, message: &str) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/commits/head-sha");
        then.status(200).json_body(json!({
            "sha": "head-sha",
            "commit": {"message": message, "author": {"date": "2025-03-03T12:34:56Z"}}
        }));
    })
}

#[tokio::test]
async fn healthz_reports_ok() {
    let server = MockServer::start_async().await;
    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .expect("request");
    assert_eq!(send(app(&server), request).await, (StatusCode::OK, "ok".to_string()));
}

#[tokio::test]
async fn invalid_signature_is_401_and_touches_nothing() {
    let server = MockServer::start_async().await;
    let head = mock_head_commit(&server, "Add feature");

    let request = webhook_request("pull_request", "sha256=deadbeef", pull_request_body("opened"));
    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid signature");
    head.assert_calls(0);
}

#[tokio::test]
async fn missing_signature_header_is_401() {
    let server = MockServer::start_async().await;
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("x-github-event", "pull_request")
        .body(Body::from(pull_request_body("opened")))
        .expect("request");
    assert_eq!(send(app(&server), request).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unhandled_action_is_ignored() {
    let server = MockServer::start_async().await;
    let (status, body) = send(app(&server), signed("pull_request", pull_request_body("closed"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Ignored");
}

#[tokio::test]
async fn self_triggered_delivery_is_ignored_without_content_calls() {
    let server = MockServer::start_async().await;
    let head = mock_head_commit(&server, "ci: auto-update README (2025-03-03 12:34:56)");
    let contents = server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/contents/README.md");
        then.status(500);
    });

    let (status, body) =
        send(app(&server), signed("pull_request", pull_request_body("synchronize"))).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "Ignored"));
    head.assert_calls(1);
    contents.assert_calls(0);
}

#[tokio::test]
async fn opened_pull_request_is_updated_through_github() {
    let server = MockServer::start_async().await;
    mock_head_commit(&server, "Add feature");
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/octo/widgets/commits")
            .query_param("sha", "feature");
        then.status(200).json_body(json!([
            {"sha": "s", "commit": {"message": "ci: auto-update README (old)", "author": {"date": "2025-03-03T13:00:00Z"}}},
            {"sha": "u", "commit": {"message": "New feature added", "author": {"date": "2025-03-03T12:34:56Z"}}}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/octo/widgets/contents/README.md")
            .query_param("ref", "feature");
        then.status(200).json_body(json!({
            "sha": "readme-sha",
            "encoding": "base64",
            "content": STANDARD.encode(README)
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/contents/README.md.bak");
        then.status(404).json_body(json!({"message": "Not Found"}));
    });
    let backup = server.mock(|when, then| {
        when.method(PUT)
            .path("/repos/octo/widgets/contents/README.md.bak")
            .json_body_includes(
                json!({
                    "content": STANDARD.encode(README),
                    "message": "ci: auto-update README backup (2025-03-03 12:34:56)"
                })
                .to_string(),
            );
        then.status(201).json_body(json!({"content": {"sha": "bak-sha"}}));
    });
    let expected = "# Widgets\n<!-- AUTO_SECTION_START -->\n- Last updated: 2025-03-03 12:34:56\n- Commit message: New feature added\n- Deployment status: success\n<!-- AUTO_SECTION_END -->\n";
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/repos/octo/widgets/contents/README.md")
            .json_body_includes(
                json!({
                    "content": STANDARD.encode(expected),
                    "sha": "readme-sha",
                    "branch": "feature",
                    "message": "ci: auto-update README (2025-03-03 12:34:56)"
                })
                .to_string(),
            );
        then.status(200).json_body(json!({"content": {"sha": "new-sha"}}));
    });

    let (status, body) =
        send(app(&server), signed("pull_request", pull_request_body("opened"))).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "Updated"));
    backup.assert_calls(1);
    update.assert_calls(1);
}

#[tokio::test]
async fn missing_marker_reports_configuration_error_only() {
    let server = MockServer::start_async().await;
    mock_head_commit(&server, "Add feature");
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/commits");
        then.status(200).json_body(json!([
            {"sha": "u", "commit": {"message": "Add feature", "author": {"date": "2025-03-03T12:34:56Z"}}}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/contents/README.md");
        then.status(200).json_body(json!({
            "sha": "readme-sha",
            "encoding": "base64",
            "content": STANDARD.encode("# No markers\n")
        }));
    });
    let writes = server.mock(|when, then| {
        when.method(PUT);
        then.status(200);
    });

    let (status, body) =
        send(app(&server), signed("pull_request", pull_request_body("opened"))).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "Error: configuration"));
    writes.assert_calls(0);
}
