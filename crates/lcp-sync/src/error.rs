//! Synchronizer error types.

/// Errors from calls to the issuer, the status service or the CMS.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// HTTP transport error, after retries where they apply.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// All attempts together overran the call budget.
    #[error("{endpoint} did not complete within {budget:?}")]
    Timeout {
        endpoint: String,
        budget: std::time::Duration,
    },
    /// The peer answered with an unexpected status.
    #[error("{endpoint} returned {status}: {body}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Request body serialization failed.
    #[error("failed to serialize request to {endpoint}: {source}")]
    Serialization {
        endpoint: String,
        source: serde_json::Error,
    },
    /// The CMS returned user data that cannot seed a license request.
    #[error("invalid user data for license {license_id}: {reason}")]
    InvalidUserData { license_id: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
