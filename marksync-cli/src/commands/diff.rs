//! `marksync diff`: show what `update` would change.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use marksync_sync::{diff_document, ensure_markers, LocalUpdate};

use super::{build_patcher, load_settings, TargetArgs};

/// Arguments for `marksync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

impl DiffArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let settings = load_settings(config)?;
        let path = self.target.document(&settings);
        let markers = self.target.markers(&settings)?;
        let status = self.target.status(&settings);
        let request = LocalUpdate {
            path: &path,
            markers: &markers,
            status: &status,
            dry_run: true,
        };
        ensure_markers(&request).with_context(|| format!("diff failed for {}", path.display()))?;
        let fact = self.target.resolve_fact(&settings)?;
        let patcher = build_patcher(&settings)?;
        let diff = diff_document(&request, &fact, &patcher)
            .with_context(|| format!("diff failed for {}", path.display()))?;

        match diff {
            None => println!("No differences for {}.", path.display()),
            Some(diff) => {
                print!("{diff}");
                if !diff.ends_with('\n') {
                    println!();
                }
            }
        }
        Ok(())
    }
}
