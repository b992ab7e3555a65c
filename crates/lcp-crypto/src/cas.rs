//! # Content-Addressed Blob Store
//!
//! Encrypted publication resources are stored under `<root>/<sha256-hex>`.
//! Retrieval recomputes the digest and refuses content that does not match
//! the name it was stored under.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::sha256::sha256_hex;

/// Blob store failure.
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// Filesystem access failed.
    #[error("blob store io error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested name is not a SHA-256 hex digest.
    #[error("invalid digest {0:?}")]
    InvalidDigest(String),

    /// Stored bytes no longer hash to their name.
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}

/// Where a blob landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub location: String,
    pub length: u64,
    pub sha256: String,
}

/// Filesystem blob store.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BlobStoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes`. Writing the same bytes twice is a no-op.
    pub fn put(&self, bytes: &[u8]) -> Result<StoredBlob, BlobStoreError> {
        let sha256 = sha256_hex(bytes);
        let path = self.root.join(&sha256);
        if !path.exists() {
            // Write-then-rename so a reader never sees a partial blob.
            let tmp = self.root.join(format!("{sha256}.tmp-{:016x}", rand::random::<u64>()));
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
        }
        Ok(StoredBlob {
            location: path.to_string_lossy().into_owned(),
            length: bytes.len() as u64,
            sha256,
        })
    }

    /// Read the blob named by `sha256`, verifying its digest.
    pub fn get(&self, sha256: &str) -> Result<Vec<u8>, BlobStoreError> {
        if sha256.len() != 64 || !sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BlobStoreError::InvalidDigest(sha256.to_string()));
        }
        let expected = sha256.to_ascii_lowercase();
        let bytes = fs::read(self.root.join(&expected))?;
        let actual = sha256_hex(&bytes);
        if actual != expected {
            return Err(BlobStoreError::DigestMismatch { expected, actual });
        }
        Ok(bytes)
    }
}
