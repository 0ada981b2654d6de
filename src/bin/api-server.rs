//! Macropulse API Server
//!
//! HTTP API for the economic data pipeline: indicator catalog, ETL job
//! submission and history, and on-demand analytics. ETL jobs run as
//! background tasks; submission never waits on the external process.

use dotenvy::dotenv;
use macropulse::config;
use macropulse::core::http::start_server;
use macropulse::logging;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    // Initialize logging based on environment
    logging::init_logging();

    let port = config::get_port();
    let env = config::get_environment();
    info!("Starting Macropulse API Server");
    info!(environment = %env, "Environment");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);
    info!(
        scripts_dir = %config::get_scripts_dir().display(),
        interpreter = %config::get_interpreter(),
        "Analytics capability"
    );

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port).await {
            error!(error = %e, "HTTP server error");
        }
    });

    // Graceful shutdown
    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
            info!("API server stopped");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
