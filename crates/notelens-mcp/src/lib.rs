//! notelens MCP server
//!
//! Exposes post image analysis as a tool over stdio.

pub mod server;
pub mod tool;

use notelens_core::Config;
use std::sync::Arc;

pub use server::{serve, SERVER_NAME};
pub use tool::TOOL_NAME;

/// Run the MCP server over stdio.
pub async fn run_stdio_server(config: Arc<Config>) -> anyhow::Result<()> {
    server::run_stdio(config).await
}
