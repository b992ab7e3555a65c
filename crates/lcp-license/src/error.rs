use lcp_core::{CanonicalizationError, CryptoError};
use lcp_crypto::{DecryptionError, EncryptionError};
use thiserror::Error;

/// Errors from building, signing or verifying a license.
#[derive(Error, Debug)]
pub enum LicenseError {
    /// The license request is missing required data or carries malformed
    /// key material.
    #[error("bad license input: {0}")]
    BadLicenseInput(String),

    /// The referenced content is not registered.
    #[error("content {0} not found")]
    ContentNotFound(String),

    /// The configured link templates are unusable.
    #[error("license configuration: {0}")]
    Config(String),

    /// Canonicalization of the unsigned license failed.
    #[error("signing failed: {0}")]
    Signing(#[from] CanonicalizationError),

    /// Wrapping the content key or encrypting a field failed.
    #[error("encryption failed: {0}")]
    Encryption(#[from] EncryptionError),

    /// A license field could not be decrypted with the given user key.
    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    /// The license carries no signature, or the signature does not verify.
    #[error("verification failed: {0}")]
    Verification(#[from] CryptoError),
}
