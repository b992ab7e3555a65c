//! License issuer server.

use clap::Parser;

use lcp_api::auth::AuthConfig;
use lcp_api::config::ServiceRole;
use lcp_api::localization::Localizer;
use lcp_api::server::{init_tracing, load_config, serve, ServerArgs};
use lcp_api::{issuer_app, IssuerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = ServerArgs::parse();
    let config = load_config(&args, ServiceRole::Issuer)?;

    let state = IssuerState::from_config(&config)?;
    let auth = AuthConfig::new(config.auth.clone());
    if !auth.is_enabled() {
        tracing::warn!("no auth credentials configured, issuer routes are open");
    }
    let app = issuer_app(state, auth, Localizer::from_config(&config.localization));

    serve(config.bind_addr(ServiceRole::Issuer), app, "lcpserver").await
}
