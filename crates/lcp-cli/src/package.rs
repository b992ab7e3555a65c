//! # Package Subcommand
//!
//! Encrypts publications under fresh content keys through the encryption
//! worker pool, stores the ciphertexts in the blob store and prints one
//! `PUT /contents/{id}` body per publication (JSON lines).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::task::JoinSet;
use zeroize::Zeroizing;

use lcp_core::{encoding, ContentKeyBytes};
use lcp_crypto::{EncryptionPool, FsBlobStore};

/// Arguments for the `lcpctl package` subcommand.
#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Publications to encrypt.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Blob store directory for the encrypted files.
    #[arg(long)]
    pub store: PathBuf,
    /// Content id; only with a single input. Defaults to the file stem.
    #[arg(long)]
    pub content_id: Option<String>,
    /// Encryption workers.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,
}

/// Body of the issuer's content registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRegistration {
    #[serde(rename = "content-id")]
    pub content_id: String,
    #[serde(rename = "content-encryption-key")]
    pub content_encryption_key: String,
    #[serde(rename = "protected-content-location")]
    pub location: String,
    #[serde(rename = "protected-content-length")]
    pub length: u64,
    #[serde(rename = "protected-content-sha256")]
    pub sha256: String,
}

pub fn run_package(args: &PackageArgs) -> Result<u8> {
    if args.content_id.is_some() && args.inputs.len() > 1 {
        bail!("--content-id needs exactly one input");
    }
    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    let registrations = runtime.block_on(package(
        &args.inputs,
        &args.store,
        args.content_id.as_deref(),
        args.workers,
    ))?;
    for registration in &registrations {
        println!("{}", serde_json::to_string(registration)?);
    }
    Ok(0)
}

/// Encrypt every input and return the registrations in input order.
pub async fn package(
    inputs: &[PathBuf],
    store: &Path,
    content_id: Option<&str>,
    workers: usize,
) -> Result<Vec<ContentRegistration>> {
    let store = FsBlobStore::open(store)
        .with_context(|| format!("opening blob store {}", store.display()))?;
    let pool = EncryptionPool::spawn(workers, store);

    let mut tasks = JoinSet::new();
    for (index, input) in inputs.iter().enumerate() {
        let id = match content_id {
            Some(id) => id.to_string(),
            None => file_stem(input)?,
        };
        let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let pool = pool.clone();
        tasks.spawn(async move {
            let key = Zeroizing::new(rand::random::<[u8; 32]>());
            let resource = pool
                .encrypt(ContentKeyBytes::from_slice(&key[..])?, data)
                .await?;
            tracing::info!(content_id = %id, location = %resource.location, "publication encrypted");
            anyhow::Ok((
                index,
                ContentRegistration {
                    content_id: id,
                    content_encryption_key: encoding::encode(&key[..]),
                    location: resource.location,
                    length: resource.length,
                    sha256: resource.sha256,
                },
            ))
        });
    }

    let mut done = Vec::with_capacity(inputs.len());
    while let Some(joined) = tasks.join_next().await {
        done.push(joined.context("encryption task failed")??);
    }
    done.sort_by_key(|(index, _)| *index);
    Ok(done.into_iter().map(|(_, registration)| registration).collect())
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a content id from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn packages_in_input_order_with_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("alpha.epub");
        let b = dir.path().join("beta.epub");
        std::fs::write(&a, b"alpha publication").unwrap();
        std::fs::write(&b, vec![42u8; 10_000]).unwrap();

        let store = dir.path().join("store");
        let out = package(&[a, b], &store, None, 2).await.unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].content_id, "alpha");
        assert_eq!(out[1].content_id, "beta");
        assert_ne!(out[0].content_encryption_key, out[1].content_encryption_key);
        assert!(out[1].length > 10_000);
        assert_eq!(out[0].sha256.len(), 64);
    }

    #[tokio::test]
    async fn explicit_content_id_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.epub");
        std::fs::write(&input, b"book").unwrap();
        let out = package(&[input], &dir.path().join("store"), Some("urn:isbn:1"), 1)
            .await
            .unwrap();
        assert_eq!(out[0].content_id, "urn:isbn:1");
    }

    #[tokio::test]
    async fn missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.epub");
        assert!(package(&[missing], &dir.path().join("store"), None, 1).await.is_err());
    }

    #[test]
    fn registration_uses_issuer_field_names() {
        let value = serde_json::to_value(ContentRegistration {
            content_id: "c1".into(),
            content_encryption_key: "a2V5".into(),
            location: "/store/ab".into(),
            length: 3,
            sha256: "00".into(),
        })
        .unwrap();
        assert_eq!(value["content-id"], "c1");
        assert_eq!(value["protected-content-length"], 3);
    }
}
