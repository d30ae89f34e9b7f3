//! One-shot analysis from the command line.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use notelens_core::{analyze_post, AnalysisOutcome, PostInput};

use super::ModelArgs;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image paths or URLs
    #[arg(long, num_args = 1.., required = true)]
    pub images: Vec<String>,

    /// Post text sent along with the images
    #[arg(long, default_value = "")]
    pub note: String,

    #[command(flatten)]
    pub model: ModelArgs,
}

pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let config = args.model.into_config();

    if !config.has_api_key() {
        eprintln!(
            "{} No API key configured. Pass --api-key or set {}.",
            "!".yellow().bold(),
            notelens_core::config::API_KEY_ENV
        );
    }

    eprintln!("{} Processing {} image(s)...", "→".dimmed(), args.images.len());
    if let Some(system) = &config.settings.system_instruction {
        eprintln!("{} System prompt: {}", "→".dimmed(), system);
    }

    let post = PostInput {
        note: args.note,
        urls: args.images,
        api_key: None,
    };

    match analyze_post(&config, &post).await {
        AnalysisOutcome::Success(text) => {
            eprintln!("{} Analysis result:", "✓".green().bold());
            println!("{}", "-".repeat(50));
            println!("{}", text);
            println!("{}", "-".repeat(50));
            Ok(())
        }
        AnalysisOutcome::NoImages => {
            anyhow::bail!("No image could be loaded. Check that the paths or URLs are correct.")
        }
        AnalysisOutcome::Failure(e) => Err(e).context("Analysis failed"),
    }
}
