//! # Content — Registered Publication Masters
//!
//! A `Content` is created once per encrypted publication. Its
//! `encryption_key` is the content master key: it is wrapped under a user
//! key inside each license and never serialized on its own.

use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ValidationError;

/// Length of an AES-256 content key.
pub const CONTENT_KEY_LEN: usize = 32;

/// A 256-bit content master key. Zeroized on drop; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ContentKeyBytes(Vec<u8>);

impl ContentKeyBytes {
    /// Wrap raw key bytes, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.len() != CONTENT_KEY_LEN {
            return Err(ValidationError::KeyLength {
                expected: CONTENT_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for ContentKeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContentKeyBytes([REDACTED])")
    }
}

/// A registered publication.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub id: String,
    #[serde(skip)]
    pub encryption_key: ContentKeyBytes,
    pub location: String,
    pub length: u64,
    pub sha256: String,
}
