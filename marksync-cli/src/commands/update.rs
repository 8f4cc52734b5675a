//! `marksync update`: patch a local document once.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use marksync_sync::{ensure_markers, update_document, LocalUpdate, WriteResult};

use super::{build_patcher, load_settings, TargetArgs};

/// Arguments for `marksync update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would be written without touching any file.
    #[arg(long)]
    pub dry_run: bool,
}

impl UpdateArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let settings = load_settings(config)?;
        let path = self.target.document(&settings);
        let markers = self.target.markers(&settings)?;
        let status = self.target.status(&settings);
        let request = LocalUpdate {
            path: &path,
            markers: &markers,
            status: &status,
            dry_run: self.dry_run,
        };
        ensure_markers(&request).with_context(|| format!("update failed for {}", path.display()))?;
        let fact = self.target.resolve_fact(&settings)?;
        let patcher = build_patcher(&settings)?;
        let result = update_document(&request, &fact, &patcher)
            .with_context(|| format!("update failed for {}", path.display()))?;

        match result {
            WriteResult::Written { path, backup } => {
                println!("{} {}", "updated".green(), path.display());
                println!("  backup: {}", backup.display());
            }
            WriteResult::WouldWrite { path } => {
                println!("[dry-run] {} {}", "would update".yellow(), path.display());
            }
            WriteResult::Unchanged { path } => {
                println!("{} {}", "unchanged".dimmed(), path.display());
            }
        }
        Ok(())
    }
}
