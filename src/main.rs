//! SSH NAS MCP Server - Entry point
//!
//! Loads `.env`, parses CLI arguments, validates configuration, starts the MCP
//! server on stdio transport, and closes the SSH session on shutdown.

use clap::Parser;
use rmcp::service::ServiceExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mcp_ssh_nas::agent::AgentToolkit;
use mcp_ssh_nas::config::{Args, Config};
use mcp_ssh_nas::error::{Result, SshNasError};
use mcp_ssh_nas::server::SshNasServer;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr; stdout carries MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_tools {
        let definitions = serde_json::to_string_pretty(&AgentToolkit::definitions())
            .map_err(|e| SshNasError::config(e.to_string()))?;
        println!("{}", definitions);
        return Ok(());
    }

    let config = Config::from_args(args)?;

    info!("SSH NAS MCP Server v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Target NAS: {}@{}:{}",
        config.user, config.host, config.port
    );
    info!("Default command timeout: {}s", config.timeout_secs);

    let server = SshNasServer::new(config);

    info!("SSH NAS MCP Server running on stdio");

    let server_for_shutdown = server.clone();

    let shutdown_handle = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), shutting down...");
            }
            _ = terminate() => {
                info!("Received SIGTERM, shutting down...");
            }
        }

        server_for_shutdown.shutdown().await;
    });

    let session = server.session().clone();

    match server.serve(rmcp::transport::io::stdio()).await {
        Ok(running_server) => {
            info!("MCP server is serving...");
            if let Err(e) = running_server.waiting().await {
                error!("Server error: {}", e);
            }
        }
        Err(e) => {
            error!("Failed to start MCP server: {}", e);
            session.close().await;
            return Err(SshNasError::connection(e.to_string()));
        }
    }

    shutdown_handle.abort();
    session.close().await;

    info!("SSH NAS MCP Server stopped");

    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
