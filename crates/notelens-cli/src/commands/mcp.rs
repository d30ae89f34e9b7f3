//! MCP server commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use notelens_core::config::API_KEY_ENV;
use std::sync::Arc;

use super::ModelArgs;

#[derive(Subcommand)]
pub enum McpCommands {
    /// Run MCP server over stdio
    Stdio(ModelArgs),

    /// Show the exposed tool and client configuration
    Status,
}

pub async fn execute(cmd: McpCommands) -> Result<()> {
    match cmd {
        McpCommands::Stdio(model) => {
            let config = model.into_config();

            eprintln!(
                "  {} {} {}",
                "●".green().bold(),
                "notelens MCP".cyan().bold(),
                "server running (stdio)".bold()
            );
            eprintln!("  {} tool: {}", "▸".dimmed(), notelens_mcp::TOOL_NAME);
            eprintln!("  {} model: {}", "▸".dimmed(), config.model);
            if !config.has_api_key() {
                eprintln!(
                    "  {} no API key configured; calls fail unless they pass api_key or {} is set",
                    "!".yellow().bold(),
                    API_KEY_ENV
                );
            }
            eprintln!("  {} Ctrl+C to stop", "▸".dimmed());
            eprintln!();

            notelens_mcp::run_stdio_server(Arc::new(config)).await?;
        }

        McpCommands::Status => {
            print_mcp_status();
        }
    }

    Ok(())
}

fn print_mcp_status() {
    println!();
    println!("{} notelens MCP Server", "●".green().bold());
    println!();

    println!("{}", "  Tool".bold().underline());
    println!();
    println!(
        "    {} {}",
        notelens_mcp::TOOL_NAME.cyan(),
        "Analyze the images of a RED note post".dimmed()
    );
    println!("      {} {}", "red_note".green(), "post text".dimmed());
    println!("      {} {}", "urls".green(), "image URLs or local paths".dimmed());
    println!("      {} {}", "api_key".green(), "optional per-call Gemini key".dimmed());
    println!();

    println!("{}", "  Environment".bold().underline());
    println!();
    println!("    {} Gemini API key (read on every call)", API_KEY_ENV.green());
    println!("    {} Model name", "NOTELENS_MODEL".green());
    println!("    {} API base URL", "NOTELENS_API_BASE".green());
    println!("    {} Model call timeout", "NOTELENS_TIMEOUT_SECS".green());
    println!("    {} Image download timeout", "NOTELENS_FETCH_TIMEOUT_SECS".green());
    println!();

    println!("{}", "  Configuration".bold().underline());
    println!();
    println!(
        r#"  {{
    "mcpServers": {{
      "{}": {{
        "command": "notelens",
        "args": ["mcp", "stdio"],
        "env": {{ "{}": "<your key>" }}
      }}
    }}
  }}"#,
        notelens_mcp::SERVER_NAME,
        API_KEY_ENV
    );
    println!();
}
