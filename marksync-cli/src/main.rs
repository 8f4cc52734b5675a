//! marksync: keep marker-delimited README sections current.
//!
//! # Usage
//!
//! ```text
//! marksync serve
//! marksync update [PATH] [--status <s>] [--marker <NAME>]... [--owner <o> --repo <r> [--branch <b>] [--strategy <s>]] [--dry-run]
//! marksync diff   [PATH] (same options as update)
//! marksync config
//! ```
//!
//! Every subcommand accepts `--config <file>`; otherwise
//! `~/.marksync/config.yaml` and the environment are used.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigArgs, diff::DiffArgs, serve::ServeArgs, update::UpdateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "marksync",
    version,
    about = "Rewrite marker-delimited README sections with the latest activity",
    long_about = None,
)]
struct Cli {
    /// Settings file (default: ~/.marksync/config.yaml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook server.
    Serve(ServeArgs),

    /// Patch a local document once, keeping a `.bak` copy.
    Update(UpdateArgs),

    /// Show the unified diff `update` would apply.
    Diff(DiffArgs),

    /// Print effective settings with secrets redacted.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    if !matches!(cli.command, Commands::Serve(_)) {
        marksync_daemon::init_tracing_with_default("warn");
    }
    match cli.command {
        Commands::Serve(args) => args.run(config),
        Commands::Update(args) => args.run(config),
        Commands::Diff(args) => args.run(config),
        Commands::Config(args) => args.run(config),
    }
}
