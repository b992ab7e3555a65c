//! # lcp-license — License Envelope Builder
//!
//! - **Builder** (`builder.rs`): completes a license request for a content,
//!   regenerates a stored license with fresh user data, applies rights
//!   patches. Every path ends by re-signing.
//! - **Signer** (`signer.rs`): Ed25519 over the JCS form of the unsigned
//!   license; verification against the embedded certificate.
//! - **Partial** (`partial.rs`): the key-less view returned with 206.
//! - **Check** (`check.rs`): key check, content key and user field
//!   decryption for a given user key.

pub mod builder;
pub mod check;
pub mod error;
pub mod partial;
pub mod signer;

pub use builder::{BuilderConfig, LicenseBuilder, LinkTemplates};
pub use check::{decrypt_user_field, key_check_matches, unwrap_content_key};
pub use error::LicenseError;
pub use partial::partial_license;
pub use signer::{signing_input, verify_license, LicenseSigner};
