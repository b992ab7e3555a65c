//! Base64 helpers for binary license fields.
//!
//! `content_key.encrypted_value`, `user_key.key_check` and `user_key.value`
//! travel as standard (padded) base64 strings. Signatures, certificates and
//! CMS passphrase hashes are lowercase hex.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ValidationError;

/// Encode bytes as standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a standard base64 string, naming the field on failure.
pub fn decode(field: &'static str, s: &str) -> Result<Vec<u8>, ValidationError> {
    STANDARD
        .decode(s.trim())
        .map_err(|e| ValidationError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })
}

/// Render bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a hex string (either case), naming the field on failure.
pub fn hex_decode(field: &'static str, s: &str) -> Result<Vec<u8>, ValidationError> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(ValidationError::InvalidHex {
            field,
            reason: "odd length".to_string(),
        });
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ValidationError::InvalidHex {
                    field,
                    reason: format!("invalid digit at position {i}"),
                })
        })
        .collect()
}

/// `#[serde(with = "...")]` adapter for `Vec<u8>` fields.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode("bytes", &s).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "...")]` adapter for `Option<Vec<u8>>` fields.
pub mod base64_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_str(&super::encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => super::decode("bytes", &s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
