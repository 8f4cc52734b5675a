pub mod config;
pub mod diff;
pub mod serve;
pub mod update;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use marksync_core::types::{ActivityFact, ActivityStrategy, BranchName, MarkerName, RepoRef};
use marksync_core::Settings;
use marksync_github::GithubClient;
use marksync_renderer::{SectionPatcher, SectionRenderer};
use marksync_sync::ActivityResolver;

pub(crate) fn load_settings(config: Option<&Path>) -> Result<Settings> {
    marksync_core::settings::load(config).context("failed to load settings")
}

pub(crate) fn build_patcher(settings: &Settings) -> Result<SectionPatcher> {
    let renderer = SectionRenderer::with_override(settings.section_template.as_deref())
        .context("failed to load section template")?;
    Ok(SectionPatcher::with_renderer(renderer))
}

/// Document and activity source shared by `update` and `diff`.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Document to patch (default: `document_path` from settings).
    pub path: Option<PathBuf>,

    /// Deployment status to render (default: `status` from settings).
    #[arg(long)]
    pub status: Option<String>,

    /// Marker name to patch; repeat for several (default: `markers` from settings).
    #[arg(long = "marker", value_name = "NAME")]
    pub markers: Vec<String>,

    /// Repository owner; with `--repo`, activity is read from GitHub.
    #[arg(long, requires = "repo")]
    pub owner: Option<String>,

    /// Repository name.
    #[arg(long, requires = "owner")]
    pub repo: Option<String>,

    /// Branch whose activity is embedded.
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Activity lookup: latest, rest or graphql (default: `strategy` from settings).
    #[arg(long)]
    pub strategy: Option<ActivityStrategy>,
}

impl TargetArgs {
    pub fn document(&self, settings: &Settings) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&settings.document_path))
    }

    pub fn status(&self, settings: &Settings) -> String {
        self.status.clone().unwrap_or_else(|| settings.status.clone())
    }

    pub fn markers(&self, settings: &Settings) -> Result<Vec<MarkerName>> {
        if self.markers.is_empty() {
            return Ok(settings.markers.clone());
        }
        if self.markers.iter().any(|m| m.trim().is_empty()) {
            bail!("--marker must not be empty");
        }
        Ok(self.markers.iter().map(|m| MarkerName::from(m.trim())).collect())
    }

    /// Local clock without a repository, otherwise the activity resolver.
    pub fn resolve_fact(&self, settings: &Settings) -> Result<ActivityFact> {
        let (Some(owner), Some(name)) = (&self.owner, &self.repo) else {
            return Ok(ActivityFact::now_local());
        };
        let repo = RepoRef::new(owner, name);
        let branch = BranchName::from(self.branch.as_str());
        let client = GithubClient::from_settings(settings)
            .context("reading activity from GitHub requires a token")?;
        let policy = settings.commit_policy();
        let strategy = self.strategy.unwrap_or(settings.strategy);

        ActivityResolver::new(&client, strategy, settings.lookback, &policy)
            .resolve(&repo, &branch)
            .with_context(|| format!("failed to resolve activity for {repo}@{branch}"))
    }
}
