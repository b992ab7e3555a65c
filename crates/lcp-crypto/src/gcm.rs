//! # AES-256-GCM Encrypter
//!
//! Output layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//!
//! The nonce is a per-instance counter: the first 8 bytes are the big-endian
//! counter value, the last 4 are zero. The counter is advanced atomically on
//! every call, so one `AesGcm` shared across worker tasks never reuses a
//! nonce. Two instances under the same key would, so callers keep one
//! instance per key lifetime.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use lcp_core::ContentKeyBytes;

use crate::encrypter::{random_bytes, DecryptionError, Decrypter, EncryptionError, Encrypter};

/// Algorithm URI for AES-256-GCM.
pub const AES256_GCM_URI: &str = "http://www.w3.org/2009/xmlenc11#aes256-gcm";

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

const TAG_LEN: usize = 16;

/// AES-256-GCM with a monotonic counter nonce.
#[derive(Debug, Default)]
pub struct AesGcm {
    counter: AtomicU64,
}

impl AesGcm {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_nonce(&self) -> [u8; NONCE_LEN] {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut nonce = [0u8; NONCE_LEN];
        nonce[..8].copy_from_slice(&n.to_be_bytes());
        nonce
    }
}

impl Encrypter for AesGcm {
    fn signature(&self) -> &'static str {
        AES256_GCM_URI
    }

    fn generate_key(&self) -> Result<ContentKeyBytes, EncryptionError> {
        let mut key = [0u8; 32];
        random_bytes(&mut key);
        let out = ContentKeyBytes::from_slice(&key)
            .map_err(|e| EncryptionError::InvalidInput(e.to_string()));
        zeroize::Zeroize::zeroize(&mut key);
        out
    }

    fn encrypt(
        &self,
        key: &[u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), EncryptionError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| EncryptionError::InvalidKeyLength(key.len()))?;

        let mut plaintext = Vec::new();
        input.read_to_end(&mut plaintext)?;

        let nonce = self.next_nonce();
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;
        zeroize::Zeroize::zeroize(&mut plaintext);

        output.write_all(&nonce)?;
        output.write_all(&sealed)?;
        Ok(())
    }
}

impl Decrypter for AesGcm {
    fn decrypt(
        &self,
        key: &[u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), DecryptionError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| DecryptionError::InvalidKeyLength(key.len()))?;

        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptionError::Truncated(format!(
                "{} bytes, need at least a nonce and a tag",
                data.len()
            )));
        }

        let (nonce, sealed) = data.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| DecryptionError::Authentication)?;
        output.write_all(&plaintext)?;
        Ok(())
    }
}
