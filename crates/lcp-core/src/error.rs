//! # Error Types
//!
//! Shared error types for the leaf crates. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations. Higher crates wrap
//! these in their own enums.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in signed documents.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in signing or key handling.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),
}

/// A value received from a client or a peer service could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Timestamp is not RFC 3339.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A binary field is not valid base64.
    #[error("invalid base64 in {field}: {reason}")]
    InvalidBase64 {
        /// Name of the offending field.
        field: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// A hex field has an odd length or a non-hex digit.
    #[error("invalid hex in {field}: {reason}")]
    InvalidHex {
        /// Name of the offending field.
        field: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// A content key does not have the required length.
    #[error("content key must be {expected} bytes, got {actual}")]
    KeyLength {
        /// Required length in bytes.
        expected: usize,
        /// Length received.
        actual: usize,
    },
}
