//! Domain types shared by the marksync crates.
//!
//! Everything here is plain data: no I/O, no network. Values that cross the
//! settings boundary are serializable via serde + serde_yaml.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Rendering format for embedded timestamps (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Commit-message prefix that identifies this tool's own commits when no
/// policy is configured.
pub const DEFAULT_SYSTEM_PREFIX: &str = "ci: auto-update README";

/// Status token rendered into the deployment-status line by default.
pub const DEFAULT_STATUS: &str = "success";

/// Marker used when the operator does not name any.
pub const DEFAULT_MARKER: &str = "AUTO_SECTION";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a marker-delimited section, e.g. `AUTO_SECTION`.
///
/// The literal tokens in the document are `<!-- NAME_START -->` and
/// `<!-- NAME_END -->`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerName(pub String);

impl MarkerName {
    pub fn start_token(&self) -> String {
        format!("<!-- {}_START -->", self.0)
    }

    pub fn end_token(&self) -> String {
        format!("<!-- {}_END -->", self.0)
    }
}

impl fmt::Display for MarkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for MarkerName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MarkerName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A branch name without the `refs/heads/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchName(pub String);

impl BranchName {
    /// Fully qualified ref, as the GraphQL API expects it.
    pub fn qualified(&self) -> String {
        if self.0.starts_with("refs/") {
            self.0.clone()
        } else {
            format!("refs/heads/{}", self.0)
        }
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BranchName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BranchName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// `owner/name` coordinates of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(format!("expected '<owner>/<repo>', got '{s}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How the latest activity is queried upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStrategy {
    /// Single `commits/{branch}` call.
    Latest,
    /// One page of the REST commit list, filtered.
    #[default]
    Rest,
    /// One page of GraphQL commit history, filtered.
    Graphql,
}

impl fmt::Display for ActivityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityStrategy::Latest => write!(f, "latest"),
            ActivityStrategy::Rest => write!(f, "rest"),
            ActivityStrategy::Graphql => write!(f, "graphql"),
        }
    }
}

impl FromStr for ActivityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "rest" => Ok(Self::Rest),
            "graphql" => Ok(Self::Graphql),
            other => Err(format!(
                "unknown activity strategy '{other}'; expected: latest, rest, graphql"
            )),
        }
    }
}

/// Error categories a pipeline run can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bad or missing signature.
    Authentication,
    /// Missing marker, missing credential, invalid settings.
    Configuration,
    /// Transport or API failure talking to the host.
    Upstream,
    /// Revision token mismatch at write time.
    Conflict,
    /// Payload passed the gate but lacks the fields a run needs.
    InvalidPayload,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Authentication => "authentication",
            FailureKind::Configuration => "configuration",
            FailureKind::Upstream => "upstream",
            FailureKind::Conflict => "conflict",
            FailureKind::InvalidPayload => "invalid_payload",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one pipeline run. Never queued or retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Ignored { reason: String },
    Unchanged,
    Updated { commit_message: String },
    Error { kind: FailureKind, reason: String },
}

impl UpdateOutcome {
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }

    /// Short label used in logs and response bodies.
    pub fn label(&self) -> &'static str {
        match self {
            UpdateOutcome::Ignored { .. } => "ignored",
            UpdateOutcome::Unchanged => "unchanged",
            UpdateOutcome::Updated { .. } => "updated",
            UpdateOutcome::Error { .. } => "error",
        }
    }

    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::Error {
                kind: FailureKind::Authentication,
                ..
            }
        )
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Latest qualifying upstream activity, ready to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFact {
    /// Whole-second precision, no timezone.
    pub timestamp: NaiveDateTime,
    /// First line of the commit message, when the fact came from a commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActivityFact {
    /// Build a fact, truncating sub-second precision and keeping only the
    /// first message line.
    pub fn new(timestamp: NaiveDateTime, message: Option<&str>) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self {
            timestamp,
            message: message.map(|m| first_line(m).to_string()),
        }
    }

    /// Fact for a manual run with no upstream lookup.
    pub fn now_local() -> Self {
        Self::new(Local::now().naive_local(), None)
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// One inbound webhook delivery. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub event_type: String,
    pub action: String,
    pub repository_owner: String,
    pub repository_name: String,
    pub head_ref: BranchName,
    pub head_commit_sha: String,
    pub raw_payload: Vec<u8>,
    pub signature_header: String,
}

impl WebhookEvent {
    pub fn repo(&self) -> RepoRef {
        RepoRef::new(&self.repository_owner, &self.repository_name)
    }
}

/// Reserved commit-message prefixes that mark this tool's own commits.
///
/// The first prefix is the one written into new commits; the rest are
/// recognised so that commits from older prefix choices stay filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCommitPolicy {
    prefixes: Vec<String>,
}

impl SystemCommitPolicy {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.trim().is_empty())
            .collect();
        if prefixes.is_empty() {
            return Self::default();
        }
        Self { prefixes }
    }

    pub fn primary_prefix(&self) -> &str {
        &self.prefixes[0]
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether the first line of `message` starts with a reserved prefix.
    pub fn is_system_commit(&self, message: &str) -> bool {
        let line = first_line(message);
        self.prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }

    /// Message for the commit that writes the patched document.
    pub fn update_message(&self, fact: &ActivityFact) -> String {
        format!("{} ({})", self.primary_prefix(), fact.formatted_timestamp())
    }

    /// Message for the commit that stores the pre-patch backup.
    pub fn backup_message(&self, fact: &ActivityFact) -> String {
        format!(
            "{} backup ({})",
            self.primary_prefix(),
            fact.formatted_timestamp()
        )
    }
}

impl Default for SystemCommitPolicy {
    fn default() -> Self {
        Self {
            prefixes: vec![DEFAULT_SYSTEM_PREFIX.to_string()],
        }
    }
}

/// First line of a possibly multi-line commit message.
pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
