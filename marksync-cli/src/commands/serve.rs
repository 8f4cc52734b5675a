//! `marksync serve`: run the webhook server in the foreground.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::load_settings;

/// Arguments for `marksync serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides `port` / `PORT`).
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let mut settings = load_settings(config)?;
        if let Some(port) = self.port {
            settings.port = port;
        }
        marksync_daemon::start_blocking(settings).context("webhook server exited with error")
    }
}
