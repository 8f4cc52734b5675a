//! Settings loading: YAML file first, environment second.
//!
//! # Storage layout
//!
//! ```text
//! ~/.marksync/
//!   config.yaml   (optional; every key has a default)
//! ```
//!
//! # API pattern
//!
//! Loaders come in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Environment lookups are injected as a closure so tests never touch the
//! process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{
    ActivityStrategy, MarkerName, SystemCommitPolicy, DEFAULT_MARKER, DEFAULT_STATUS,
    DEFAULT_SYSTEM_PREFIX,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_DOCUMENT: &str = "README.md";
pub const DEFAULT_LOOKBACK: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const REDACTED: &str = "***";

/// Effective runtime settings. Constructed once and passed into each
/// component; nothing reads the environment after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    pub port: u16,
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql_url: Option<String>,
    /// Tracked document, relative to the repository root.
    pub document_path: String,
    pub markers: Vec<MarkerName>,
    pub status: String,
    pub strategy: ActivityStrategy,
    pub lookback: u32,
    pub request_timeout_secs: u64,
    pub reserved_prefixes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_template: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            github_token: None,
            port: DEFAULT_PORT,
            api_base: DEFAULT_API_BASE.to_string(),
            graphql_url: None,
            document_path: DEFAULT_DOCUMENT.to_string(),
            markers: vec![MarkerName::from(DEFAULT_MARKER)],
            status: DEFAULT_STATUS.to_string(),
            strategy: ActivityStrategy::default(),
            lookback: DEFAULT_LOOKBACK,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            reserved_prefixes: vec![DEFAULT_SYSTEM_PREFIX.to_string()],
            section_template: None,
        }
    }
}

impl Settings {
    /// Apply environment overrides on top of file values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("WEBHOOK_SECRET") {
            self.webhook_secret = Some(secret);
        }
        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.github_token = Some(token);
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(base) = lookup("MARKSYNC_API_BASE") {
            self.api_base = base;
        }
        if let Some(url) = lookup("MARKSYNC_GRAPHQL_URL") {
            self.graphql_url = Some(url);
        }
        if let Some(document) = lookup("MARKSYNC_DOCUMENT") {
            self.document_path = document;
        }
        if let Some(markers) = lookup("MARKSYNC_MARKERS") {
            self.markers = parse_marker_list(&markers);
        }
        if let Some(status) = lookup("MARKSYNC_STATUS") {
            self.status = status;
        }
        if let Some(strategy) = lookup("MARKSYNC_STRATEGY") {
            self.strategy = strategy.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "MARKSYNC_STRATEGY",
                value: strategy.clone(),
                reason,
            })?;
        }
        if let Some(secs) = lookup("MARKSYNC_TIMEOUT_SECS") {
            self.request_timeout_secs =
                secs.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: "MARKSYNC_TIMEOUT_SECS",
                        value: secs.clone(),
                        reason: e.to_string(),
                    })?;
        }
        Ok(())
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markers.is_empty() || self.markers.iter().any(|m| m.0.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "markers",
                value: format!("{:?}", self.markers),
                reason: "at least one non-empty marker name is required".to_string(),
            });
        }
        if self.lookback == 0 {
            return Err(ConfigError::InvalidValue {
                key: "lookback",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Shared secret for signature verification; absence is fatal.
    pub fn require_secret(&self) -> Result<&str, ConfigError> {
        non_blank(self.webhook_secret.as_deref()).ok_or(ConfigError::MissingSecret)
    }

    /// Hosting-API credential; absence is fatal.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        non_blank(self.github_token.as_deref()).ok_or(ConfigError::MissingCredential)
    }

    pub fn graphql_endpoint(&self) -> String {
        match &self.graphql_url {
            Some(url) => url.clone(),
            None => format!("{}/graphql", self.api_base.trim_end_matches('/')),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn commit_policy(&self) -> SystemCommitPolicy {
        SystemCommitPolicy::new(self.reserved_prefixes.iter().cloned())
    }

    /// Copy safe to print: secret and token replaced by a placeholder.
    pub fn redacted(&self) -> Settings {
        let mut copy = self.clone();
        if copy.webhook_secret.is_some() {
            copy.webhook_secret = Some(REDACTED.to_string());
        }
        if copy.github_token.is_some() {
            copy.github_token = Some(REDACTED.to_string());
        }
        copy
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.marksync/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".marksync").join("config.yaml")
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Parse a settings file. A missing file yields defaults.
pub fn load_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load settings from `explicit` (must exist) or `<home>/.marksync/config.yaml`
/// (optional), then apply overrides from `lookup`.
pub fn load_at<F>(home: &Path, explicit: Option<&Path>, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            load_file(path)?
        }
        None => load_file(&config_path_at(home))?,
    };
    settings.apply_env(lookup)?;
    settings.validate()?;
    Ok(settings)
}

/// `load_at` convenience wrapper reading the process environment.
///
/// A `.env` file in the working directory is merged into the environment
/// first; variables already set win.
pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_at(&home, explicit, |key| std::env::var(key).ok())
}

fn parse_marker_list(raw: &str) -> Vec<MarkerName> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(MarkerName::from)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
