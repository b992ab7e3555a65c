//! License status server.

use clap::Parser;

use lcp_api::auth::AuthConfig;
use lcp_api::config::ServiceRole;
use lcp_api::server::{init_tracing, load_config, serve, ServerArgs};
use lcp_api::{status_app, StatusState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = ServerArgs::parse();
    let config = load_config(&args, ServiceRole::Status)?;

    let state = StatusState::from_config(&config)?;
    let auth = AuthConfig::new(config.auth.clone());
    if !auth.is_enabled() {
        tracing::warn!("no auth credentials configured, provider routes are open");
    }
    let app = status_app(state, auth);

    serve(config.bind_addr(ServiceRole::Status), app, "lsdserver").await
}
