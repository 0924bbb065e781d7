//! Resourceful MCP server: CRUD tools over configurable REST resource APIs.

mod config;
mod handler;
mod resources;

use anyhow::Context as _;
use clap::Parser;
use resourceful_rest_tools::profile::ProfileRegistry;
use resourceful_rest_tools::runtime::RestToolSource;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[derive(Parser, Debug)]
#[command(name = "resourceful-mcp-server", version, about)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, env = "RESOURCEFUL_CONFIG")]
    config: Option<PathBuf>,

    /// Address to serve the MCP streamable HTTP endpoint on.
    #[arg(long, env = "RESOURCEFUL_BIND", default_value = "127.0.0.1:8173")]
    bind: SocketAddr,

    /// Per-request timeout in seconds (overrides the config file).
    #[arg(long)]
    request_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let cfg = config::ServerConfig::load(args.config.as_deref())?;

    let timeout = args
        .request_timeout
        .map_or_else(|| cfg.request_timeout(), Duration::from_secs);

    let registry = Arc::new(
        ProfileRegistry::new(cfg.effective_profiles()).context("invalid API profiles")?,
    );
    let default_profile = cfg
        .effective_default()
        .context("no API profiles configured")?;
    anyhow::ensure!(
        registry.get(&default_profile).is_some(),
        "default profile '{default_profile}' is not registered"
    );

    let source = RestToolSource::new(resources::bookshop_schemas(), timeout)
        .context("invalid resource schemas")?;

    info!(
        profiles = registry.len(),
        default = %default_profile,
        tools = source.catalog().entries().len(),
        "catalog ready"
    );

    let session_manager = Arc::new(LocalSessionManager::default());
    let service = StreamableHttpService::new(
        {
            let source = source.clone();
            let registry = Arc::clone(&registry);
            let default_profile = default_profile.clone();
            // One handler per MCP session; each gets its own session profile.
            move || {
                handler::ResourcefulHandler::new(
                    source.clone(),
                    Arc::clone(&registry),
                    &default_profile,
                )
                .map_err(|e| std::io::Error::other(e.to_string()))
            }
        },
        session_manager,
        StreamableHttpServerConfig {
            stateful_mode: true,
            sse_keep_alive: Some(Duration::from_secs(15)),
            ..Default::default()
        },
    );

    let router = axum::Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    info!(addr = %args.bind, "serving MCP over streamable HTTP at /mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve MCP endpoint")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    info!("shutdown signal received");
}
