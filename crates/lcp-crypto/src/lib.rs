//! # lcp-crypto — Cryptographic Primitives
//!
//! - **Encrypters** (`encrypter.rs`): the `Encrypter` / `Decrypter`
//!   capability, implemented by AES-256-CBC (`cbc.rs`, random IV, W3C
//!   padding) and AES-256-GCM (`gcm.rs`, counter nonce).
//! - **Key wrap** (`keywrap.rs`): deterministic RFC 3394 wrapping.
//! - **Ed25519** (`ed25519.rs`): license signing over `CanonicalBytes`.
//! - **SHA-256** (`sha256.rs`): user-key derivation and hex digests.
//! - **Blob store** (`cas.rs`): content-addressed storage for encrypted
//!   publication resources.
//! - **Worker pool** (`pool.rs`): fixed-size pool encrypting resources off
//!   the request path, one completion channel per task.
//!
//! ## Crate Policy
//!
//! - Depends only on `lcp-core` internally.
//! - No mocking of cryptographic operations in tests.

pub mod cas;
pub mod cbc;
pub mod ed25519;
pub mod encrypter;
pub mod gcm;
pub mod keywrap;
pub mod padding;
pub mod pool;
pub mod sha256;

pub use cas::{BlobStoreError, FsBlobStore, StoredBlob};
pub use cbc::{AesCbc, AES256_CBC_URI};
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use ed25519::ED25519_SIGNATURE_URI;
pub use encrypter::{
    decrypt_bytes, encrypt_bytes, DecryptionError, Decrypter, EncryptionError, Encrypter,
};
pub use gcm::{AesGcm, AES256_GCM_URI};
pub use pool::{EncryptedResource, EncryptionPool, PoolError};
pub use sha256::{sha256_hex, user_key_from_passphrase};
