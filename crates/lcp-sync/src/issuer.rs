//! Client for the issuer's license endpoints.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

use lcp_core::license::LICENSE_CONTENT_TYPE;
use lcp_core::{License, Timestamp};

use crate::config::{endpoint_url, Credentials};
use crate::error::SyncError;

#[derive(Serialize)]
struct RightsEnd {
    end: Timestamp,
}

/// Body of a rights-end update: the license id and the new end.
#[derive(Serialize)]
struct RightsEndPatch<'a> {
    id: &'a str,
    rights: RightsEnd,
}

/// Client for `PATCH` and `POST /licenses/{id}` on the issuer.
#[derive(Debug, Clone)]
pub struct IssuerClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Credentials,
    /// Upper bound of one call, retries included.
    budget: Duration,
}

impl IssuerClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        auth: Credentials,
        budget: Duration,
    ) -> Self {
        Self {
            http,
            base_url,
            auth,
            budget,
        }
    }

    /// Move the rights end of a license on the issuer, which re-signs it.
    ///
    /// Calls `PATCH {issuer}/licenses/{id}`; only 200 and 206 count as
    /// success.
    pub async fn update_rights_end(&self, license_id: &str, end: Timestamp) -> Result<(), SyncError> {
        let endpoint = format!("PATCH /licenses/{license_id}");
        let url = endpoint_url(&self.base_url, &["licenses", license_id]);
        let body = serde_json::to_vec(&RightsEndPatch {
            id: license_id,
            rights: RightsEnd { end },
        })
        .map_err(|e| SyncError::Serialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let resp = crate::retry::retry_send(&endpoint, self.budget, || {
            self.auth
                .apply(self.http.patch(&url))
                .header(CONTENT_TYPE, LICENSE_CONTENT_TYPE)
                .body(body.clone())
                .send()
        })
        .await?;

        match resp.status() {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {
                tracing::info!(license_id, end = %end, "issuer rights end updated");
                Ok(())
            }
            status => Err(SyncError::Upstream {
                endpoint,
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Ask the issuer to regenerate a license from a partial license
    /// carrying user data and key material.
    ///
    /// Calls `POST {issuer}/licenses/{id}`; expects 200 with the license.
    pub async fn fetch_license(&self, partial: &License) -> Result<License, SyncError> {
        let endpoint = format!("POST /licenses/{}", partial.id);
        let url = endpoint_url(&self.base_url, &["licenses", &partial.id]);
        let body = serde_json::to_vec(partial).map_err(|e| SyncError::Serialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let resp = crate::retry::retry_send(&endpoint, self.budget, || {
            self.auth
                .apply(self.http.post(&url))
                .header(CONTENT_TYPE, LICENSE_CONTENT_TYPE)
                .body(body.clone())
                .send()
        })
        .await?;

        if resp.status() != StatusCode::OK {
            return Err(SyncError::Upstream {
                endpoint,
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        resp.json().await.map_err(|e| SyncError::Deserialization {
            endpoint,
            source: e,
        })
    }
}
