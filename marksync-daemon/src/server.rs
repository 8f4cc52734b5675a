//! HTTP surface: `POST /webhook` and `GET /healthz`.
//!
//! Response bodies never carry error details; those go to the log.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use marksync_core::types::UpdateOutcome;
use marksync_github::RepositoryHost;
use marksync_sync::WebhookPipeline;

pub const WEBHOOK_ENDPOINT: &str = "/webhook";
pub const HEALTH_ENDPOINT: &str = "/healthz";

pub const EVENT_HEADER: &str = "x-github-event";
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Status code and plain-text body for one outcome.
pub fn outcome_response(outcome: &UpdateOutcome) -> (StatusCode, String) {
    match outcome {
        UpdateOutcome::Error { .. } if outcome.is_authentication_failure() => {
            (StatusCode::UNAUTHORIZED, "Invalid signature".to_string())
        }
        UpdateOutcome::Ignored { .. } => (StatusCode::OK, "Ignored".to_string()),
        UpdateOutcome::Unchanged => (StatusCode::OK, "Unchanged".to_string()),
        UpdateOutcome::Updated { .. } => (StatusCode::OK, "Updated".to_string()),
        UpdateOutcome::Error { kind, .. } => (StatusCode::OK, format!("Error: {kind}")),
    }
}

pub fn build_router<H>(pipeline: Arc<WebhookPipeline<H>>) -> Router
where
    H: RepositoryHost + 'static,
{
    Router::new()
        .route(HEALTH_ENDPOINT, get(handle_health))
        .route(WEBHOOK_ENDPOINT, post(handle_webhook::<H>))
        .with_state(pipeline)
}

async fn handle_health() -> &'static str {
    "ok"
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn handle_webhook<H>(
    State(pipeline): State<Arc<WebhookPipeline<H>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    H: RepositoryHost + 'static,
{
    let event = header_value(&headers, EVENT_HEADER);
    let signature = header_value(&headers, SIGNATURE_HEADER);
    let delivery = header_value(&headers, DELIVERY_HEADER);
    let started = Instant::now();

    let event_for_run = event.clone();
    let joined = tokio::task::spawn_blocking(move || {
        pipeline.handle(&event_for_run, &signature, &body)
    })
    .await;

    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(event = %event, delivery = %delivery, "pipeline task join failure: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    tracing::info!(
        event = %event,
        delivery = %delivery,
        outcome = outcome.label(),
        duration_ms = started.elapsed().as_millis() as u64,
        "delivery handled",
    );
    outcome_response(&outcome).into_response()
}
