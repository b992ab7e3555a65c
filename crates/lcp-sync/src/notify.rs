//! Issuer → status service notification of newly issued licenses.

use reqwest::header::CONTENT_TYPE;
use tokio::task::JoinHandle;
use url::Url;

use lcp_core::license::LICENSE_CONTENT_TYPE;
use lcp_core::License;

use crate::config::{endpoint_url, Credentials};
use crate::error::SyncError;

/// Posts issued licenses to the status service in the background.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    http: reqwest::Client,
    url: String,
    auth: Credentials,
}

impl StatusNotifier {
    pub(crate) fn new(http: reqwest::Client, status_base_url: &Url, auth: Credentials) -> Self {
        Self {
            http,
            url: endpoint_url(status_base_url, &["licenses"]),
            auth,
        }
    }

    /// Spawn a task that posts `license` to `{status}/licenses`.
    ///
    /// Failures are logged and never reach the caller. The handle is only
    /// useful to tests and shutdown code.
    pub fn notify(&self, license: License) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.post(&license).await {
                tracing::error!(license_id = %license.id, error = %e, "status service notification failed");
            }
        })
    }

    async fn post(&self, license: &License) -> Result<(), SyncError> {
        let endpoint = "POST /licenses".to_string();
        let body = serde_json::to_vec(license).map_err(|e| SyncError::Serialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        let resp = self
            .auth
            .apply(self.http.post(&self.url))
            .header(CONTENT_TYPE, LICENSE_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        if !resp.status().is_success() {
            return Err(SyncError::Upstream {
                endpoint,
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        tracing::debug!(license_id = %license.id, "status service notified");
        Ok(())
    }
}
