//! # License Model
//!
//! The DRM artifact delivered to reading applications. This is the wire
//! shape, the persisted shape, and the shape over which the signature is
//! computed.
//!
//! ```text
//! License
//! ├── provider, id, issued, updated
//! ├── encryption { profile, content_key, user_key }
//! ├── links [ hint, publication, status ]
//! ├── user { id, email, name, encrypted[] }
//! ├── rights { print, copy, start, end, tts, edit }
//! └── signature { certificate, value, algorithm }
//! ```
//!
//! Every field a partial input may omit deserializes with a default, so the
//! same type carries the partial license a client posts and the complete
//! license the server returns.

use serde::{Deserialize, Serialize};

use crate::encoding::{base64_bytes, base64_opt};
use crate::temporal::Timestamp;

/// Encryption profile stamped on every license this server issues.
pub const PROFILE_1_0: &str = "http://readium.org/lcp/profile-1.0";

/// Basic (test) profile accepted from older clients.
pub const PROFILE_BASIC: &str = "http://readium.org/lcp/basic-profile";

/// Algorithm used to derive the user key from a passphrase.
pub const USER_KEY_ALGORITHM_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// Media type of a serialized license.
pub const LICENSE_CONTENT_TYPE: &str = "application/vnd.readium.lcp.license.v1.0+json";

/// Media type of a license status document.
pub const STATUS_CONTENT_TYPE: &str = "application/vnd.readium.license.status.v1.0+json";

/// Media type of the publication link.
pub const EPUB_CONTENT_TYPE: &str = "application/epub+zip";

/// User fields that may be listed in `user.encrypted`.
pub const ENCRYPTABLE_USER_FIELDS: [&str; 2] = ["email", "name"];

// ─── License ─────────────────────────────────────────────────────────

/// A license, complete or partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
    #[serde(default)]
    pub encryption: Encryption,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(default)]
    pub user: UserInfo,
    #[serde(default, skip_serializing_if = "UserRights::is_empty")]
    pub rights: UserRights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl License {
    /// First link with the given relation.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }

    /// A copy of this license with the signature removed: the exact
    /// document the signature covers.
    pub fn unsigned(&self) -> License {
        License {
            signature: None,
            ..self.clone()
        }
    }
}

// ─── Encryption ──────────────────────────────────────────────────────

/// The `encryption` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encryption {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_key: Option<ContentKey>,
    #[serde(default)]
    pub user_key: UserKey,
}

/// The content master key wrapped under the user key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentKey {
    pub algorithm: String,
    #[serde(with = "base64_bytes")]
    pub encrypted_value: Vec<u8>,
}

/// User key parameters.
///
/// `value` and `clear_value` exist only on license requests; the envelope
/// builder consumes and clears them.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserKey {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub key_check: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub value: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_value: Option<String>,
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKey")
            .field("algorithm", &self.algorithm)
            .field("text_hint", &self.text_hint)
            .field("key_check", &self.key_check.as_ref().map(|c| c.len()))
            .field("value", &self.value.as_ref().map(|_| "[REDACTED]"))
            .field("clear_value", &self.clear_value.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ─── Links, user, rights, signature ──────────────────────────────────

/// A hyperlink carried in a license.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Link {
    /// A plain link with a relation and a target.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            ..Self::default()
        }
    }
}

/// The license holder. Fields named in `encrypted` hold base64 ciphertext.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted: Vec<String>,
}

/// Usage rights. Every member is nullable; `end` absent means the license
/// never expires (a purchase).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<bool>,
}

impl UserRights {
    /// True when no right is set.
    pub fn is_empty(&self) -> bool {
        self.print.is_none()
            && self.copy.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.tts.is_none()
            && self.edit.is_none()
    }
}

/// Detached signature over the canonical unsigned license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub certificate: String,
    pub value: String,
    pub algorithm: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_input_deserializes_with_defaults() {
        let json = r#"{
            "provider": "https://provider.example",
            "user": {"id": "u1", "email": "a@b.c", "encrypted": ["email"]},
            "encryption": {"user_key": {"text_hint": "hint", "clear_value": "secret"}}
        }"#;
        let lic: License = serde_json::from_str(json).unwrap();
        assert_eq!(lic.provider, "https://provider.example");
        assert!(lic.id.is_empty());
        assert!(lic.issued.is_none());
        assert_eq!(lic.encryption.user_key.clear_value.as_deref(), Some("secret"));
        assert!(lic.rights.is_empty());
    }

    #[test]
    fn absent_rights_end_is_omitted() {
        let lic = License {
            rights: UserRights {
                print: Some(10),
                ..UserRights::default()
            },
            ..License::default()
        };
        let v = serde_json::to_value(&lic).unwrap();
        assert_eq!(v["rights"]["print"], 10);
        assert!(v["rights"].get("end").is_none());
    }

    #[test]
    fn empty_rights_are_omitted() {
        let v = serde_json::to_value(License::default()).unwrap();
        assert!(v.get("rights").is_none());
        assert!(v.get("signature").is_none());
    }

    #[test]
    fn binary_fields_are_base64() {
        let lic = License {
            encryption: Encryption {
                profile: PROFILE_1_0.to_string(),
                content_key: Some(ContentKey {
                    algorithm: "alg".to_string(),
                    encrypted_value: vec![0, 1, 2],
                }),
                user_key: UserKey {
                    key_check: Some(vec![255]),
                    ..UserKey::default()
                },
            },
            ..License::default()
        };
        let v = serde_json::to_value(&lic).unwrap();
        assert_eq!(v["encryption"]["content_key"]["encrypted_value"], "AAEC");
        assert_eq!(v["encryption"]["user_key"]["key_check"], "/w==");
        let back: License = serde_json::from_value(v).unwrap();
        assert_eq!(back, lic);
    }

    #[test]
    fn link_type_field_is_renamed() {
        let mut link = Link::new("publication", "https://x/y.epub");
        link.media_type = Some(EPUB_CONTENT_TYPE.to_string());
        let v = serde_json::to_value(&link).unwrap();
        assert_eq!(v["type"], EPUB_CONTENT_TYPE);
    }

    #[test]
    fn user_key_debug_redacts_secrets() {
        let key = UserKey {
            clear_value: Some("hunter2".to_string()),
            value: Some(vec![1, 2, 3]),
            ..UserKey::default()
        };
        let dbg = format!("{key:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn unsigned_drops_signature_only() {
        let lic = License {
            id: "abc".to_string(),
            signature: Some(Signature {
                certificate: "c".to_string(),
                value: "v".to_string(),
                algorithm: "a".to_string(),
            }),
            ..License::default()
        };
        let u = lic.unsigned();
        assert!(u.signature.is_none());
        assert_eq!(u.id, "abc");
    }
}
