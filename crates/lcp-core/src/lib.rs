//! # lcp-core — Foundational Types for the LCP License Server
//!
//! Every other crate in the workspace depends on `lcp-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One wire model.** `License` is both the persisted shape and the
//!    document delivered to reading applications. The signature is computed
//!    over, and stored with, exactly this JSON.
//!
//! 2. **`CanonicalBytes` newtype.** License signatures are computed over
//!    `CanonicalBytes::new()` output only (RFC 8785 / JCS). No raw
//!    `serde_json::to_vec()` on a signing path.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with second
//!    precision so a license re-serializes to the same canonical bytes.
//!
//! 4. **Absent vs present.** Optional fields are `Option<T>` and are omitted
//!    from JSON when unset; an unset `rights.end` never appears as a zero
//!    time.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lcp-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod content;
pub mod encoding;
pub mod error;
pub mod license;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use content::{Content, ContentKeyBytes};
pub use error::{CanonicalizationError, CryptoError, ValidationError};
pub use license::{
    ContentKey, Encryption, License, Link, Signature, UserInfo, UserKey, UserRights,
};
pub use temporal::Timestamp;
