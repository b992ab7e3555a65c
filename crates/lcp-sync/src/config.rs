//! Synchronizer configuration: peer base URLs, credentials and timeout.

use serde::Deserialize;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default timeout of every outbound call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Basic-auth credentials for a peer service.
///
/// The password is wiped on drop and never printed.
#[derive(Clone, Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Credentials are only sent when a username is configured.
    pub fn is_set(&self) -> bool {
        !self.username.is_empty()
    }

    /// Attach Basic auth to `request` when set.
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.is_set() {
            request.basic_auth(&self.username, Some(&self.password))
        } else {
            request
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Where the peers live and how to authenticate to them.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Public base URL of the issuer (`PATCH`/`POST /licenses/{id}`).
    pub issuer_base_url: Url,
    /// Public base URL of the status service (`POST /licenses`). `None`
    /// disables issuance notifications.
    pub status_base_url: Option<Url>,
    /// CMS user data URL template with a `{license_id}` placeholder.
    pub user_data_url: Option<String>,
    pub lcp_update_auth: Credentials,
    pub lsd_notify_auth: Credentials,
    pub cms_access_auth: Credentials,
    pub timeout_secs: u64,
}

impl SyncConfig {
    /// Configuration with only the issuer set and no credentials.
    pub fn new(issuer_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            issuer_base_url: parse_url("issuer_base_url", issuer_base_url)?,
            status_base_url: None,
            user_data_url: None,
            lcp_update_auth: Credentials::default(),
            lsd_notify_auth: Credentials::default(),
            cms_access_auth: Credentials::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn with_status_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.status_base_url = Some(parse_url("status_base_url", url)?);
        Ok(self)
    }
}

pub(crate) fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))
}

/// Join `segments` onto `base` as path segments, keeping any base path.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> String {
    let mut url = base.as_str().trim_end_matches('/').to_string();
    for segment in segments {
        url.push('/');
        url.push_str(segment);
    }
    url
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("{0} is not configured")]
    Missing(&'static str),
}
