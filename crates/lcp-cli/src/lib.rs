//! # lcp-cli — License Server Operator CLI
//!
//! ## Subcommands
//!
//! - `key` — Generate the provider signing key, print its public half
//! - `package` — Encrypt a publication into the blob store and print the
//!   content registration body for the issuer
//! - `license` — Verify a license signature, check a passphrase against it
//!
//! ## Crate Policy
//!
//! - Argument parsing lives next to each handler; handlers return an exit
//!   code and delegate to the domain crates.
//! - Secrets read from disk or flags are zeroized after use.

pub mod key;
pub mod license;
pub mod package;
