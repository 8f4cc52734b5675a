//! `marksync config`: print effective settings.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::load_settings;

/// Arguments for `marksync config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {}

impl ConfigArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let settings = load_settings(config)?;
        let yaml = serde_yaml::to_string(&settings.redacted())
            .context("failed to serialize settings")?;
        print!("{yaml}");
        Ok(())
    }
}
