//! Error types for marksync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the settings file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and serde_yaml line context.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested settings file does not exist.
    #[error("settings file not found at {path}")]
    NotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,

    /// No webhook secret configured (`WEBHOOK_SECRET`).
    #[error("webhook secret is not set; export WEBHOOK_SECRET or set webhook_secret")]
    MissingSecret,

    /// No hosting-API credential configured (`GITHUB_TOKEN`).
    #[error("GitHub token is not set; export GITHUB_TOKEN or set github_token")]
    MissingCredential,

    /// A setting has a value that cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
