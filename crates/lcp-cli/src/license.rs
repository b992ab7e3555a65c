//! # License Subcommand
//!
//! Offline checks of a license document, as a reading system would do them:
//! signature, then key check and content key with the user's passphrase.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use zeroize::Zeroizing;

use lcp_core::License;
use lcp_crypto::{user_key_from_passphrase, Ed25519PublicKey};
use lcp_license::{decrypt_user_field, key_check_matches, unwrap_content_key, verify_license};

/// Arguments for the `lcpctl license` subcommand.
#[derive(Args, Debug)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// Verify the license signature.
    Verify {
        /// License file (`.lcpl`).
        file: PathBuf,
        /// Provider public key (hex) the certificate must match.
        #[arg(long)]
        public_key: Option<String>,
    },
    /// Check a passphrase against the license key check.
    Check {
        /// License file (`.lcpl`).
        file: PathBuf,
        /// User passphrase.
        #[arg(long, env = "LCP_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },
}

/// What a passphrase unlocks in a license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub key_check: bool,
    pub content_key: bool,
    /// Encrypted user fields and their clear values.
    pub user_fields: Vec<(String, String)>,
}

pub fn run_license(args: &LicenseArgs) -> Result<u8> {
    match &args.command {
        LicenseCommand::Verify { file, public_key } => {
            let license = read_license(file)?;
            let trusted = public_key
                .as_deref()
                .map(Ed25519PublicKey::from_hex)
                .transpose()
                .context("--public-key is not a hex Ed25519 public key")?;
            match verify_license(&license, trusted.as_ref()) {
                Ok(()) => {
                    println!("OK: signature of license {} is valid", license.id);
                    Ok(0)
                }
                Err(e) => {
                    println!("FAIL: license {}: {e}", license.id);
                    Ok(2)
                }
            }
        }
        LicenseCommand::Check { file, passphrase } => {
            let license = read_license(file)?;
            let passphrase = Zeroizing::new(passphrase.clone());
            let report = check_passphrase(&license, &passphrase)?;
            if !report.key_check {
                println!("FAIL: passphrase does not open license {}", license.id);
                return Ok(2);
            }
            println!("OK: passphrase opens license {}", license.id);
            println!("  Content key: {}", if report.content_key { "unwrapped" } else { "invalid" });
            for (field, value) in &report.user_fields {
                println!("  user.{field}: {value}");
            }
            Ok(if report.content_key { 0 } else { 2 })
        }
    }
}

pub fn read_license(path: &Path) -> Result<License> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("{} is not a license", path.display()))
}

/// Test `passphrase` against the key check; when it matches, unwrap the
/// content key and decrypt the encrypted user fields.
pub fn check_passphrase(license: &License, passphrase: &str) -> Result<CheckReport> {
    let user_key = user_key_from_passphrase(passphrase);
    let key_check = key_check_matches(license, &user_key[..])?;
    if !key_check {
        return Ok(CheckReport {
            key_check,
            content_key: false,
            user_fields: Vec::new(),
        });
    }

    let content_key = unwrap_content_key(license, &user_key[..]).is_ok();
    let mut user_fields = Vec::new();
    for field in &license.user.encrypted {
        let value = match field.as_str() {
            "email" => license.user.email.as_deref(),
            "name" => license.user.name.as_deref(),
            _ => None,
        };
        if let Some(value) = value {
            user_fields.push((field.clone(), decrypt_user_field(value, &user_key[..])?));
        }
    }
    Ok(CheckReport {
        key_check,
        content_key,
        user_fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lcp_core::{Content, ContentKeyBytes, Encryption, UserInfo, UserKey};
    use lcp_crypto::Ed25519KeyPair;
    use lcp_license::{BuilderConfig, LicenseBuilder, LicenseSigner, LinkTemplates};

    fn issued_license(passphrase: &str) -> (License, Ed25519PublicKey) {
        let signer = Arc::new(LicenseSigner::new(Ed25519KeyPair::generate()));
        let public = signer.public_key();
        let builder = LicenseBuilder::new(
            BuilderConfig {
                provider: "https://provider.example".into(),
                links: LinkTemplates {
                    hint: "https://provider.example/hint".into(),
                    publication: "https://cdn.example/{content_id}.epub".into(),
                    status: None,
                },
                ..BuilderConfig::default()
            },
            signer,
        );
        let mut license = License {
            user: UserInfo {
                id: "user-1".into(),
                email: Some("reader@example.com".into()),
                name: None,
                encrypted: vec!["email".into()],
            },
            encryption: Encryption {
                user_key: UserKey {
                    text_hint: "colour".into(),
                    clear_value: Some(passphrase.into()),
                    ..UserKey::default()
                },
                ..Encryption::default()
            },
            ..License::default()
        };
        let content = Content {
            id: "book-1".into(),
            encryption_key: ContentKeyBytes::from_slice(&[9u8; 32]).unwrap(),
            location: "book-1.epub".into(),
            length: 10,
            sha256: String::new(),
        };
        builder.complete_license(&mut license, &content).unwrap();
        (license, public)
    }

    #[test]
    fn right_passphrase_unlocks_key_and_fields() {
        let (license, _) = issued_license("blue");
        let report = check_passphrase(&license, "blue").unwrap();
        assert!(report.key_check);
        assert!(report.content_key);
        assert_eq!(
            report.user_fields,
            vec![("email".to_string(), "reader@example.com".to_string())]
        );
    }

    #[test]
    fn wrong_passphrase_unlocks_nothing() {
        let (license, _) = issued_license("blue");
        let report = check_passphrase(&license, "red").unwrap();
        assert!(!report.key_check);
        assert!(!report.content_key);
        assert!(report.user_fields.is_empty());
    }

    #[test]
    fn license_file_round_trips_and_verifies() {
        let (license, public) = issued_license("blue");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.lcpl");
        std::fs::write(&path, serde_json::to_vec(&license).unwrap()).unwrap();

        let read = read_license(&path).unwrap();
        assert_eq!(read.id, license.id);
        verify_license(&read, Some(&public)).unwrap();
    }

    #[test]
    fn non_license_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.lcpl");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();
        assert!(read_license(&path).is_err());
    }
}
