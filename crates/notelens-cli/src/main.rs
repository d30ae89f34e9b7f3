//! notelens CLI
//!
//! Runs the post image analysis tool server, or a single analysis from the
//! command line.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

/// Initialize tracing with optional file logging.
///
/// When `mcp_mode` is true, all tracing output goes to stderr with ANSI disabled
/// to prevent corrupting the JSON-RPC protocol on stdout.
fn init_tracing(log_file: Option<&std::path::Path>, mcp_mode: bool, verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "notelens=debug,notelens_core=debug,notelens_mcp=debug"
    } else {
        "notelens=info,notelens_core=info,notelens_mcp=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    // Console output always goes to stderr: stdout carries JSON-RPC in MCP
    // mode and the analysis text otherwise.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!mcp_mode),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mcp_mode = matches!(&cli.command, Commands::Mcp(_));
    init_tracing(cli.log_file.as_deref(), mcp_mode, cli.verbose)?;

    cli.execute().await
}
