//! Startup shared by the `lcpserver` and `lsdserver` binaries.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, ServiceRole};

/// Command-line flags of both servers.
#[derive(Debug, Parser)]
pub struct ServerArgs {
    /// YAML configuration file.
    #[arg(short, long, env = "LCP_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines;
/// `RUST_LOG` filters, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Read the configuration file and apply environment overrides for `role`.
pub fn load_config(args: &ServerArgs, role: ServiceRole) -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.apply_env_overrides(role, |key| std::env::var(key).ok());
    Ok(config)
}

/// Bind `addr` and serve `app` until the process is stopped.
pub async fn serve(addr: std::net::SocketAddr, app: axum::Router, name: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("{name} listening on {addr}");
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
