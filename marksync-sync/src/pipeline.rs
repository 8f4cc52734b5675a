//! Webhook pipeline.
//!
//! ```text
//! verify signature → decode → gate → required fields → anti-loop guard
//!   → resolve activity → fetch document → patch → backup + conditional write
//! ```
//!
//! Every run ends in exactly one [`UpdateOutcome`]. Errors are converted at
//! the end of the run, never raised to the caller.

use marksync_core::types::{
    ActivityStrategy, MarkerName, SystemCommitPolicy, UpdateOutcome, WebhookEvent,
};
use marksync_core::Settings;
use marksync_github::RepositoryHost;
use marksync_renderer::{PatchOutcome, SectionContext, SectionPatcher, SectionRenderer};

use crate::activity::ActivityResolver;
use crate::error::SyncError;
use crate::event::{parse_event, require_fields};
use crate::gate::{self, GateDecision, PULL_REQUEST_EVENT};
use crate::guard::{check_head_commit, GuardDecision};
use crate::signature::verify_signature;
use crate::writer::{persist_remote, CommitMessages};

/// What every webhook run patches, and how activity is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub document_path: String,
    pub markers: Vec<MarkerName>,
    pub status: String,
    pub strategy: ActivityStrategy,
    pub lookback: u32,
    pub policy: SystemCommitPolicy,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            document_path: settings.document_path.clone(),
            markers: settings.markers.clone(),
            status: settings.status.clone(),
            strategy: settings.strategy,
            lookback: settings.lookback,
            policy: settings.commit_policy(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Signature-verified, change-triggered document updater.
pub struct WebhookPipeline<H> {
    host: H,
    secret: String,
    options: PipelineOptions,
    patcher: SectionPatcher,
}

impl<H: RepositoryHost> WebhookPipeline<H> {
    pub fn new(
        host: H,
        secret: impl Into<String>,
        options: PipelineOptions,
        patcher: SectionPatcher,
    ) -> Self {
        Self {
            host,
            secret: secret.into(),
            options,
            patcher,
        }
    }

    /// Build from effective settings. A missing secret is fatal.
    pub fn from_settings(host: H, settings: &Settings) -> Result<Self, SyncError> {
        let secret = settings.require_secret()?.to_string();
        let renderer = SectionRenderer::with_override(settings.section_template.as_deref())?;
        Ok(Self::new(
            host,
            secret,
            PipelineOptions::from_settings(settings),
            SectionPatcher::with_renderer(renderer),
        ))
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Handle one raw delivery. The signature is checked before the body is
    /// decoded.
    pub fn handle(&self, event_type: &str, signature_header: &str, payload: &[u8]) -> UpdateOutcome {
        if !verify_signature(self.secret.as_bytes(), payload, signature_header) {
            tracing::warn!("rejected '{event_type}' delivery: invalid signature");
            return SyncError::Authentication.into_outcome();
        }

        let event = match parse_event(event_type, signature_header, payload) {
            Ok(event) => event,
            Err(_) if event_type != PULL_REQUEST_EVENT => {
                return UpdateOutcome::ignored(format!("event '{event_type}' is not handled"));
            }
            Err(e) => return self.finish(event_type, Err(e)),
        };
        self.finish(event_type, self.process(&event))
    }

    /// Handle an already-decoded event, verifying its embedded signature.
    pub fn run(&self, event: &WebhookEvent) -> UpdateOutcome {
        if !verify_signature(
            self.secret.as_bytes(),
            &event.raw_payload,
            &event.signature_header,
        ) {
            tracing::warn!("rejected '{}' delivery: invalid signature", event.event_type);
            return SyncError::Authentication.into_outcome();
        }
        self.finish(&event.event_type, self.process(event))
    }

    fn finish(&self, event_type: &str, result: Result<UpdateOutcome, SyncError>) -> UpdateOutcome {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("'{event_type}' run failed ({}): {e}", e.kind());
                e.into_outcome()
            }
        };
        match &outcome {
            UpdateOutcome::Ignored { reason } => tracing::debug!("ignored: {reason}"),
            UpdateOutcome::Error { .. } => {}
            other => tracing::info!("'{event_type}' run finished: {}", other.label()),
        }
        outcome
    }

    fn process(&self, event: &WebhookEvent) -> Result<UpdateOutcome, SyncError> {
        if let GateDecision::Ignore { reason } = gate::evaluate(&event.event_type, &event.action) {
            return Ok(UpdateOutcome::Ignored { reason });
        }
        require_fields(event)?;

        let repo = event.repo();
        let branch = &event.head_ref;
        let policy = &self.options.policy;

        if let GuardDecision::SelfTriggered { message } =
            check_head_commit(&self.host, &repo, &event.head_commit_sha, policy)
        {
            tracing::info!("skipping self-triggered run on {repo}@{branch}: {message}");
            return Ok(UpdateOutcome::ignored(format!(
                "head commit is a system commit: {message}"
            )));
        }

        let fact = ActivityResolver::new(
            &self.host,
            self.options.strategy,
            self.options.lookback,
            policy,
        )
        .resolve(&repo, branch)?;

        let path = &self.options.document_path;
        let file = self
            .host
            .fetch_file(&repo, path, branch)?
            .ok_or_else(|| SyncError::DocumentNotFound {
                path: path.clone(),
                location: format!("{repo}@{branch}"),
            })?;

        let ctx = SectionContext::new(&fact, self.options.status.as_str());
        let updated = match self
            .patcher
            .patch(&file.content, &file.path, &self.options.markers, &ctx)?
        {
            PatchOutcome::Unchanged => return Ok(UpdateOutcome::Unchanged),
            PatchOutcome::Changed { content } => content,
        };

        let messages = CommitMessages {
            backup: policy.backup_message(&fact),
            update: policy.update_message(&fact),
        };
        persist_remote(&self.host, &repo, branch, &file, &updated, &messages)?;
        Ok(UpdateOutcome::Updated {
            commit_message: messages.update,
        })
    }
}
