//! # Encrypter Capability
//!
//! An `Encrypter` names its algorithm by URI, generates keys for itself and
//! encrypts a stream. `Decrypter` is the optional reverse direction. The
//! streaming publication pipeline only encrypts; the envelope builder and
//! reading-side tooling decrypt.

use std::io::{Read, Write};

use lcp_core::ContentKeyBytes;
use thiserror::Error;

/// Encryption failed.
#[derive(Error, Debug)]
pub enum EncryptionError {
    /// The key has the wrong length for the cipher.
    #[error("invalid key length {0} for this cipher")]
    InvalidKeyLength(usize),

    /// The input does not satisfy the algorithm's framing rules.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The AEAD backend refused to seal.
    #[error("cipher failure: {0}")]
    Cipher(String),

    /// Reading the plaintext or writing the ciphertext failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decryption failed.
#[derive(Error, Debug)]
pub enum DecryptionError {
    /// The key has the wrong length for the cipher.
    #[error("invalid key length {0} for this cipher")]
    InvalidKeyLength(usize),

    /// Ciphertext is shorter than the IV/nonce plus one block, or is not
    /// block aligned.
    #[error("truncated ciphertext: {0}")]
    Truncated(String),

    /// The trailing padding byte is out of range.
    #[error("invalid padding")]
    InvalidPadding,

    /// Authentication tag or key-wrap integrity check failed.
    #[error("authentication failed")]
    Authentication,

    /// Reading the ciphertext or writing the plaintext failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Symmetric encryption capability.
pub trait Encrypter: Send + Sync {
    /// Algorithm identifier URI, as written in `content_key.algorithm` and
    /// publication encryption metadata.
    fn signature(&self) -> &'static str;

    /// Generate a fresh random key for this algorithm.
    fn generate_key(&self) -> Result<ContentKeyBytes, EncryptionError>;

    /// Encrypt everything read from `input` into `output`.
    fn encrypt(
        &self,
        key: &[u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), EncryptionError>;
}

/// Reverse direction of an [`Encrypter`].
pub trait Decrypter: Send + Sync {
    /// Decrypt everything read from `input` into `output`.
    fn decrypt(
        &self,
        key: &[u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), DecryptionError>;
}

/// Encrypt a byte slice.
pub fn encrypt_bytes(
    encrypter: &dyn Encrypter,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let mut out = Vec::with_capacity(data.len() + 48);
    let mut input = data;
    encrypter.encrypt(key, &mut input, &mut out)?;
    Ok(out)
}

/// Decrypt a byte slice.
pub fn decrypt_bytes(
    decrypter: &dyn Decrypter,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let mut out = Vec::with_capacity(data.len());
    let mut input = data;
    decrypter.decrypt(key, &mut input, &mut out)?;
    Ok(out)
}

/// Fill a buffer from the OS RNG.
pub(crate) fn random_bytes(buf: &mut [u8]) {
    use rand::RngCore;
    rand::rngs::OsRng.fill_bytes(buf);
}
