//! # Server Configuration
//!
//! One YAML file configures both services; each binary reads the sections
//! it needs. Every section has defaults, so an empty file starts a working
//! development pair on `localhost:8989` (issuer) and `localhost:8990`
//! (status service) with an ephemeral signing key.
//!
//! ```yaml
//! lcp:
//!   port: 8989
//!   public_base_url: "https://lcp.example.org"
//! lsd:
//!   port: 8990
//!   license_link_url: "https://cms.example.org/licenses/{license_id}"
//!   user_data_url: "https://cms.example.org/users/{license_id}"
//! certificate:
//!   private_key: "/etc/lcp/provider.key"
//! license:
//!   provider: "https://provider.example.org"
//!   links:
//!     hint: "https://provider.example.org/hint"
//!     publication: "https://cdn.example.org/{content_id}.epub"
//! license_status:
//!   register: true
//!   renting_days: 60
//!   renew_days: 7
//! auth:
//!   username: admin
//!   password: secret
//! ```
//!
//! `PORT` overrides the port of the service being started and
//! `LCP_AUTH_PASSWORD` the password of the privileged endpoints.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use lcp_core::UserRights;
use lcp_crypto::Ed25519KeyPair;
use lcp_license::{BuilderConfig, LinkTemplates};
use lcp_state::{LinkConfig, StatusPolicy};
use lcp_sync::{Credentials, SyncConfig};

pub const DEFAULT_ISSUER_PORT: u16 = 8989;
pub const DEFAULT_STATUS_PORT: u16 = 8990;
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Configuration errors raised at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid signing key in {path}: {reason}")]
    Key { path: PathBuf, reason: String },

    #[error(transparent)]
    Sync(#[from] lcp_sync::ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] lcp_sync::SyncError),
}

/// Which service a binary runs; selects the port `PORT` overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    Issuer,
    Status,
}

// ─── Sections ────────────────────────────────────────────────────────

/// `lcp:` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IssuerSection {
    pub host: String,
    pub port: u16,
    pub public_base_url: Option<String>,
}

impl Default for IssuerSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_ISSUER_PORT,
            public_base_url: None,
        }
    }
}

/// `lsd:` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusSection {
    pub host: String,
    pub port: u16,
    pub public_base_url: Option<String>,
    /// Template of the status document `license` link.
    pub license_link_url: Option<String>,
    /// CMS user data URL template for fresh-license requests.
    pub user_data_url: Option<String>,
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_STATUS_PORT,
            public_base_url: None,
            license_link_url: None,
            user_data_url: None,
        }
    }
}

/// `certificate:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CertificateSection {
    /// File holding the hex Ed25519 seed of the provider key.
    pub private_key: Option<PathBuf>,
}

impl CertificateSection {
    /// Load the provider key, or generate an ephemeral one when no key
    /// file is configured.
    pub fn load_key(&self) -> Result<Ed25519KeyPair, ConfigError> {
        let Some(path) = self.private_key.as_deref() else {
            tracing::warn!("no certificate.private_key configured, signing with an ephemeral key");
            return Ok(Ed25519KeyPair::generate());
        };
        let seed = Zeroizing::new(read_file(path)?);
        Ed25519KeyPair::from_seed_hex(seed.trim()).map_err(|e| ConfigError::Key {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// `license.links:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkSection {
    pub hint: String,
    pub publication: String,
    /// Status document link; defaults to the status service's
    /// `/licenses/{license_id}/status`.
    pub status: Option<String>,
}

/// `license:` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LicenseSection {
    pub provider: String,
    pub links: LinkSection,
    /// Rights applied where a license request leaves them unset.
    pub rights: UserRights,
}

/// `localization:` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LocalizationSection {
    pub languages: Vec<String>,
    pub default_language: String,
}

impl Default for LocalizationSection {
    fn default() -> Self {
        Self {
            languages: vec![DEFAULT_LANGUAGE.to_string()],
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// `compliance:` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComplianceSection {
    /// Mounts `POST /compliancetest` on the status service.
    pub enabled: bool,
}

// ─── Server Config ───────────────────────────────────────────────────

/// The whole configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub lcp: IssuerSection,
    pub lsd: StatusSection,
    pub certificate: CertificateSection,
    pub license: LicenseSection,
    pub license_status: StatusPolicy,
    /// Status service → issuer rights updates.
    pub lcp_update_auth: Credentials,
    /// Issuer → status service notifications.
    pub lsd_notify_auth: Credentials,
    /// Status service → CMS user data lookups.
    pub cms_access_auth: Credentials,
    /// Privileged endpoints of both services.
    pub auth: Credentials,
    pub localization: LocalizationSection,
    pub compliance: ComplianceSection,
}

impl ServerConfig {
    /// Read and parse a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = read_file(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `PORT` and `LCP_AUTH_PASSWORD` read through `env`.
    pub fn apply_env_overrides(&mut self, role: ServiceRole, env: impl Fn(&str) -> Option<String>) {
        if let Some(port) = env("PORT").and_then(|p| p.parse::<u16>().ok()) {
            match role {
                ServiceRole::Issuer => self.lcp.port = port,
                ServiceRole::Status => self.lsd.port = port,
            }
        }
        if let Some(password) = env("LCP_AUTH_PASSWORD") {
            self.auth.password = password;
        }
    }

    pub fn issuer_base_url(&self) -> String {
        public_base_url(&self.lcp.public_base_url, &self.lcp.host, self.lcp.port)
    }

    pub fn status_base_url(&self) -> String {
        public_base_url(&self.lsd.public_base_url, &self.lsd.host, self.lsd.port)
    }

    /// Listen address of a service.
    pub fn bind_addr(&self, role: ServiceRole) -> std::net::SocketAddr {
        let port = match role {
            ServiceRole::Issuer => self.lcp.port,
            ServiceRole::Status => self.lsd.port,
        };
        std::net::SocketAddr::from(([0, 0, 0, 0], port))
    }

    /// Envelope builder settings.
    pub fn builder_config(&self) -> BuilderConfig {
        let status = self.license.links.status.clone().unwrap_or_else(|| {
            format!(
                "{}/licenses/{{license_id}}/status",
                self.status_base_url().trim_end_matches('/')
            )
        });
        BuilderConfig {
            provider: self.license.provider.clone(),
            links: LinkTemplates {
                hint: self.license.links.hint.clone(),
                publication: self.license.links.publication.clone(),
                status: Some(status),
            },
            default_rights: self.license.rights.clone(),
        }
    }

    /// Links of status documents.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            status_base_url: self.status_base_url(),
            issuer_base_url: self.issuer_base_url(),
            license_link_url: self.lsd.license_link_url.clone(),
        }
    }

    /// Peer URLs and credentials of the synchronizer.
    pub fn sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let mut sync =
            SyncConfig::new(&self.issuer_base_url())?.with_status_base_url(&self.status_base_url())?;
        sync.user_data_url = self.lsd.user_data_url.clone();
        sync.lcp_update_auth = self.lcp_update_auth.clone();
        sync.lsd_notify_auth = self.lsd_notify_auth.clone();
        sync.cms_access_auth = self.cms_access_auth.clone();
        Ok(sync)
    }
}

fn public_base_url(configured: &Option<String>, host: &str, port: u16) -> String {
    match configured.as_deref() {
        Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
        _ => format!("http://{host}:{port}"),
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
