//! Webhook payload decoding.
//!
//! Only the handful of fields the pipeline reads are modelled; everything
//! else in the delivery is ignored. Absent fields decode to empty strings so
//! that non-pull-request events still reach the gate.

use serde::Deserialize;

use marksync_core::types::{BranchName, WebhookEvent};

use crate::error::SyncError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Delivery {
    action: String,
    repository: RepositoryField,
    pull_request: PullRequestField,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RepositoryField {
    name: String,
    owner: OwnerField,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwnerField {
    login: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PullRequestField {
    head: HeadField,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HeadField {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: String,
}

/// Decode one delivery. Fails only when the body is not a JSON object.
pub fn parse_event(
    event_type: &str,
    signature_header: &str,
    payload: &[u8],
) -> Result<WebhookEvent, SyncError> {
    let delivery: Delivery = serde_json::from_slice(payload)
        .map_err(|e| SyncError::Payload(format!("body is not a JSON object: {e}")))?;

    Ok(WebhookEvent {
        event_type: event_type.to_string(),
        action: delivery.action,
        repository_owner: delivery.repository.owner.login,
        repository_name: delivery.repository.name,
        head_ref: BranchName(delivery.pull_request.head.git_ref),
        head_commit_sha: delivery.pull_request.head.sha,
        raw_payload: payload.to_vec(),
        signature_header: signature_header.to_string(),
    })
}

/// Fields a pull-request run cannot do without; checked after the gate.
pub fn require_fields(event: &WebhookEvent) -> Result<(), SyncError> {
    let missing: Vec<&str> = [
        ("repository.owner.login", event.repository_owner.as_str()),
        ("repository.name", event.repository_name.as_str()),
        ("pull_request.head.ref", event.head_ref.0.as_str()),
        ("pull_request.head.sha", event.head_commit_sha.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SyncError::Payload(format!(
            "missing field(s): {}",
            missing.join(", ")
        )))
    }
}
