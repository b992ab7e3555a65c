//! # Key Subcommand
//!
//! - `generate` — Write a fresh Ed25519 seed (hex) for `certificate.private_key`.
//! - `public` — Print the public key of an existing seed file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use zeroize::Zeroizing;

use lcp_crypto::Ed25519KeyPair;

/// Arguments for the `lcpctl key` subcommand.
#[derive(Args, Debug)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Generate a new provider signing key.
    Generate {
        /// Seed file to create.
        #[arg(long)]
        out: PathBuf,
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the public key of a seed file.
    Public {
        /// Seed file.
        #[arg(long)]
        key: PathBuf,
    },
}

pub fn run_key(args: &KeyArgs) -> Result<u8> {
    match &args.command {
        KeyCommand::Generate { out, force } => {
            let public = generate_key(out, *force)?;
            println!("OK: wrote signing key to {}", out.display());
            println!("  Public key (hex): {public}");
        }
        KeyCommand::Public { key } => {
            println!("{}", load_key(key)?.public_key().to_hex());
        }
    }
    Ok(0)
}

/// Write a new seed to `path` and return the public key hex.
pub fn generate_key(path: &Path, force: bool) -> Result<String> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to replace it", path.display());
    }
    let pair = Ed25519KeyPair::generate();
    let seed = pair.seed_hex();
    std::fs::write(path, format!("{}\n", seed.as_str()))
        .with_context(|| format!("writing {}", path.display()))?;
    restrict_permissions(path)?;
    tracing::info!(path = %path.display(), "signing key generated");
    Ok(pair.public_key().to_hex())
}

/// Read a seed file written by [`generate_key`].
pub fn load_key(path: &Path) -> Result<Ed25519KeyPair> {
    let raw = Zeroizing::new(
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
    );
    Ed25519KeyPair::from_seed_hex(raw.trim())
        .with_context(|| format!("{} is not a hex Ed25519 seed", path.display()))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("restricting permissions of {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
