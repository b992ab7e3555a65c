//! CMS user data lookup and the fresh-license flow built on it.

use serde::{Deserialize, Serialize};

use lcp_core::license::USER_KEY_ALGORITHM_SHA256;
use lcp_core::{encoding, License, UserKey};

use crate::config::Credentials;
use crate::error::SyncError;
use crate::issuer::IssuerClient;

/// User data the CMS holds for a license.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Hex SHA-256 of the user passphrase.
    #[serde(default)]
    pub passphrasehash: String,
    #[serde(default)]
    pub hint: String,
}

impl std::fmt::Debug for UserData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserData")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("passphrasehash", &"[REDACTED]")
            .field("hint", &self.hint)
            .finish()
    }
}

/// Client for the CMS user data endpoint.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    user_data_url: String,
    auth: Credentials,
}

impl CmsClient {
    pub(crate) fn new(http: reqwest::Client, user_data_url: String, auth: Credentials) -> Self {
        Self {
            http,
            user_data_url,
            auth,
        }
    }

    /// Fetch the user data of a license.
    ///
    /// Calls `GET {user_data_url}` with `{license_id}` substituted.
    pub async fn user_data(&self, license_id: &str) -> Result<UserData, SyncError> {
        let url = self.user_data_url.replace("{license_id}", license_id);
        let endpoint = format!("GET {url}");

        let resp = self
            .auth
            .apply(self.http.get(&url))
            .send()
            .await
            .map_err(|e| SyncError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(SyncError::Upstream {
                endpoint,
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        resp.json().await.map_err(|e| SyncError::Deserialization {
            endpoint,
            source: e,
        })
    }
}

/// Partial license asking the issuer for a fresh copy of `license_id`,
/// with name and email to be encrypted and the passphrase hash as the user
/// key value.
pub fn partial_from_user_data(license_id: &str, data: &UserData) -> Result<License, SyncError> {
    let value = encoding::hex_decode("passphrasehash", &data.passphrasehash).map_err(|e| {
        SyncError::InvalidUserData {
            license_id: license_id.to_string(),
            reason: e.to_string(),
        }
    })?;
    if value.len() != 32 {
        return Err(SyncError::InvalidUserData {
            license_id: license_id.to_string(),
            reason: format!("passphrase hash is {} bytes, expected 32", value.len()),
        });
    }

    let mut partial = License {
        id: license_id.to_string(),
        ..License::default()
    };
    partial.user.id = data.id.clone();
    partial.user.name = non_empty(&data.name);
    partial.user.email = non_empty(&data.email);
    partial.user.encrypted = vec!["name".to_string(), "email".to_string()];
    partial.encryption.user_key = UserKey {
        algorithm: USER_KEY_ALGORITHM_SHA256.to_string(),
        text_hint: data.hint.clone(),
        value: Some(value),
        ..UserKey::default()
    };
    Ok(partial)
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Regenerates a license with current user data: CMS lookup, then an
/// issuer fetch with the resulting partial license.
#[derive(Debug, Clone)]
pub struct FreshLicenseService {
    cms: CmsClient,
    issuer: IssuerClient,
}

impl FreshLicenseService {
    pub fn new(cms: CmsClient, issuer: IssuerClient) -> Self {
        Self { cms, issuer }
    }

    pub async fn fresh_license(&self, license_id: &str) -> Result<License, SyncError> {
        let data = self.cms.user_data(license_id).await?;
        let partial = partial_from_user_data(license_id, &data)?;
        let license = self.issuer.fetch_license(&partial).await?;
        tracing::info!(license_id, "fresh license fetched");
        Ok(license)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_data(hash: &str) -> UserData {
        UserData {
            id: "u-1".into(),
            name: "Ada".into(),
            email: "ada@example.org".into(),
            passphrasehash: hash.into(),
            hint: "first computer".into(),
        }
    }

    #[test]
    fn partial_license_carries_user_and_key_value() {
        let hash = "ab".repeat(32);
        let partial = partial_from_user_data("lic-1", &user_data(&hash)).unwrap();
        assert_eq!(partial.id, "lic-1");
        assert_eq!(partial.user.email.as_deref(), Some("ada@example.org"));
        assert_eq!(partial.user.encrypted, ["name", "email"]);
        let key = &partial.encryption.user_key;
        assert_eq!(key.algorithm, USER_KEY_ALGORITHM_SHA256);
        assert_eq!(key.text_hint, "first computer");
        assert_eq!(key.value.as_deref(), Some(&[0xab; 32][..]));

        let v = serde_json::to_value(&partial).unwrap();
        assert_eq!(
            v["encryption"]["user_key"]["value"],
            encoding::encode(&[0xab; 32])
        );
    }

    #[test]
    fn bad_passphrase_hash_is_rejected() {
        for hash in ["zz", "abcd", ""] {
            assert!(matches!(
                partial_from_user_data("lic-1", &user_data(hash)),
                Err(SyncError::InvalidUserData { .. })
            ));
        }
    }

    #[test]
    fn user_data_debug_redacts_hash() {
        let dbg = format!("{:?}", user_data("deadbeef"));
        assert!(!dbg.contains("deadbeef"));
    }
}
