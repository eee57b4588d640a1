/// Planweave: Schema-gated workflow automation backend with LLM planning
///
/// Main entry point. Initializes configuration and starts the HTTP server
/// with workflow generation, lifecycle, and execution capabilities.

use planweave::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow generation and management API at /api/workflows/*
/// - Connector catalog API at /api/connectors/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
