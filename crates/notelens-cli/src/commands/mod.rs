//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use notelens_core::config::{self, Config, ModelSettings};
use std::path::PathBuf;
use std::time::Duration;

pub mod analyze;
pub mod mcp;

/// notelens - image analysis for social-media travel posts
#[derive(Parser)]
#[command(name = "notelens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// MCP server commands
    #[command(subcommand)]
    Mcp(mcp::McpCommands),

    /// Analyze a set of images once and print the result
    Analyze(analyze::AnalyzeArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Mcp(cmd) => mcp::execute(cmd).await,
            Commands::Analyze(args) => analyze::execute(args).await,
        }
    }
}

/// Model options shared by every command that talks to Gemini.
#[derive(Args, Clone)]
pub struct ModelArgs {
    /// Gemini API key (takes precedence over GOOGLE_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "NOTELENS_MODEL", default_value = config::DEFAULT_MODEL)]
    pub model: String,

    /// Gemini API base URL
    #[arg(long, env = "NOTELENS_API_BASE", default_value = config::DEFAULT_API_BASE)]
    pub api_base: String,

    /// Seconds to wait for the model before giving up
    #[arg(
        long,
        env = "NOTELENS_TIMEOUT_SECS",
        default_value_t = 120,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Seconds to wait for each image download
    #[arg(
        long,
        env = "NOTELENS_FETCH_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_secs: u64,

    /// Instruction prompt (defaults to the built-in travel-post prompt)
    #[arg(long)]
    pub prompt: Option<String>,

    /// System instruction sent alongside the request
    #[arg(long)]
    pub system_prompt: Option<String>,
}

impl ModelArgs {
    /// Build the runtime configuration.
    pub fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            api_key: self.api_key,
            model: self.model,
            api_base: self.api_base,
            prompt: self.prompt.unwrap_or(defaults.prompt),
            settings: ModelSettings {
                system_instruction: self.system_prompt,
                ..ModelSettings::default()
            },
            request_timeout: Duration::from_secs(self.timeout_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}
