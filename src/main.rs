/// FlowFinance editor server
///
/// Main entry point. Loads configuration from the environment and starts the
/// HTTP server exposing:
/// - Editor session API at /api/editor/*
/// - Uploaded files at /api/files/*
/// - Saved workflow snapshots at /api/workflows/*
/// - Health check at /healthz

use flowfinance::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3004, ./data and in-memory files)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
