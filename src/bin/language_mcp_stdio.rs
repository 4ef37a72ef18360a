//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes the language tools and resources over stdio. This mode is
//! designed for editor/agent integrations and shares all runtime configuration with the HTTP
//! binary. `--tools` restricts the exposed tools; unknown names are rejected before startup.
use anyhow::{Context, Result};
use clap::Parser;
use language_mcp::{
    config, logging,
    mcp::{LanguageMcpServer, ToolName, parse_tool_name},
    service::LanguageService,
};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;
use strum::IntoEnumIterator;

#[derive(Parser, Debug)]
#[command(name = "language-mcp-stdio", version, about = "Language tools over MCP stdio")]
struct Cli {
    /// Comma separated tools to expose (default: all).
    #[arg(long, value_delimiter = ',', value_parser = parse_tool_name)]
    tools: Vec<ToolName>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();

    let tools = if cli.tools.is_empty() {
        ToolName::iter().collect()
    } else {
        cli.tools
    };
    let service = Arc::new(
        LanguageService::from_config(config::get_config())
            .context("failed to initialize language clients")?,
    );
    let server = LanguageMcpServer::new(service, &tools);
    tracing::info!(tools = tools.len(), "Starting MCP server over stdio");

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
