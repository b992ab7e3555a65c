//! Partial license: what the issuer returns with `206 Partial Content` when
//! a license is fetched without user data.

use lcp_core::{License, UserKey};

/// Copy of `license` without the content key and the user key parameters.
///
/// Links, user, rights and the (now stale) signature are kept so the caller
/// can tell which license it is looking at.
pub fn partial_license(license: &License) -> License {
    let mut partial = license.clone();
    partial.encryption.content_key = None;
    partial.encryption.user_key = UserKey::default();
    partial.encryption.profile.clear();
    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcp_core::{ContentKey, Encryption, Link};

    #[test]
    fn strips_key_material_and_profile() {
        let full = License {
            id: "lic-1".into(),
            links: vec![Link::new("hint", "https://h")],
            encryption: Encryption {
                profile: "p".into(),
                content_key: Some(ContentKey {
                    algorithm: "a".into(),
                    encrypted_value: vec![1; 48],
                }),
                user_key: UserKey {
                    algorithm: "a".into(),
                    text_hint: "hint".into(),
                    key_check: Some(vec![2; 48]),
                    value: None,
                    clear_value: None,
                },
            },
            ..License::default()
        };
        let partial = partial_license(&full);
        assert_eq!(partial.id, "lic-1");
        assert_eq!(partial.links.len(), 1);
        assert!(partial.encryption.content_key.is_none());
        assert_eq!(partial.encryption.user_key, UserKey::default());

        let v = serde_json::to_value(&partial).unwrap();
        assert!(v["encryption"].get("content_key").is_none());
        assert!(v["encryption"].get("profile").is_none());
        assert!(v["encryption"]["user_key"].get("key_check").is_none());
    }
}
