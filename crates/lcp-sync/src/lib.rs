//! # lcp-sync — Cross-Service Synchronizer
//!
//! HTTP clients between the two services and the CMS:
//! - **Issuer** (`issuer.rs`): rights end updates and license regeneration.
//! - **CMS** (`cms.rs`): user data lookup and the fresh-license flow.
//! - **Notifier** (`notify.rs`): fire-and-forget issuance notifications
//!   to the status service.
//!
//! All clients share one `reqwest::Client` with the configured timeout.
//! Idempotent calls (`PATCH` and `POST /licenses/{id}`) retry transport
//! failures with backoff, all attempts within that same timeout; non-2xx
//! answers are returned as errors at once.

pub mod cms;
pub mod config;
pub mod error;
pub mod issuer;
pub mod notify;
pub(crate) mod retry;

pub use cms::{partial_from_user_data, CmsClient, FreshLicenseService, UserData};
pub use config::{ConfigError, Credentials, SyncConfig};
pub use error::SyncError;
pub use issuer::IssuerClient;
pub use notify::StatusNotifier;

use std::time::Duration;

/// Top-level synchronizer. Holds the clients built from one configuration.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    issuer: IssuerClient,
    cms: Option<CmsClient>,
    notifier: Option<StatusNotifier>,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let budget = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(budget)
            .build()
            .map_err(|e| SyncError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let cms = config
            .user_data_url
            .as_ref()
            .filter(|url| !url.is_empty())
            .map(|url| CmsClient::new(http.clone(), url.clone(), config.cms_access_auth.clone()));
        let notifier = config
            .status_base_url
            .as_ref()
            .map(|url| StatusNotifier::new(http.clone(), url, config.lsd_notify_auth.clone()));
        let issuer = IssuerClient::new(
            http,
            config.issuer_base_url.clone(),
            config.lcp_update_auth.clone(),
            budget,
        );
        Ok(Self {
            issuer,
            cms,
            notifier,
        })
    }

    pub fn issuer(&self) -> &IssuerClient {
        &self.issuer
    }

    /// Notifier, when a status service is configured.
    pub fn notifier(&self) -> Option<&StatusNotifier> {
        self.notifier.as_ref()
    }

    /// Fresh-license flow; needs the CMS user data URL.
    pub fn fresh_licenses(&self) -> Result<FreshLicenseService, SyncError> {
        let cms = self
            .cms
            .clone()
            .ok_or(ConfigError::Missing("user_data_url"))?;
        Ok(FreshLicenseService::new(cms, self.issuer.clone()))
    }
}
