//! # License Envelope Builder
//!
//! Turns a license request and a registered content into a complete,
//! signed license:
//!
//! 1. **prepare**: fresh UUID, `issued = now`, default rights, profile.
//! 2. **links**: hint, publication (with length, hash and title from the
//!    content) and, when configured, status.
//! 3. **user key**: the passphrase hash from `user_key.value`, or SHA-256 of
//!    `clear_value`. Both are cleared.
//! 4. **content key**: the content master key encrypted under the user key.
//! 5. **user fields**: every field listed in `user.encrypted` replaced by its
//!    base64 ciphertext.
//! 6. **key check**: the license id encrypted under the user key.
//! 7. **sign**, always last.
//!
//! All encryption in the envelope is AES-256-CBC with a random IV.

use std::sync::Arc;

use lcp_core::encoding;
use lcp_core::license::{
    EPUB_CONTENT_TYPE, PROFILE_1_0, STATUS_CONTENT_TYPE, USER_KEY_ALGORITHM_SHA256,
};
use lcp_core::{Content, ContentKey, License, Link, Timestamp, UserInfo, UserKey, UserRights};
use lcp_crypto::{encrypt_bytes, user_key_from_passphrase, AesCbc, Encrypter};
use zeroize::Zeroizing;

use crate::error::LicenseError;
use crate::signer::LicenseSigner;

/// Link templates stamped on every license.
///
/// `publication` may contain `{content_id}` (or the legacy
/// `{publication_id}`); `status` may contain `{license_id}`.
#[derive(Debug, Clone, Default)]
pub struct LinkTemplates {
    pub hint: String,
    pub publication: String,
    pub status: Option<String>,
}

/// Static builder configuration.
#[derive(Debug, Clone, Default)]
pub struct BuilderConfig {
    /// Provider URI used when the request does not name one.
    pub provider: String,
    pub links: LinkTemplates,
    /// Rights applied member by member where the request leaves them unset.
    pub default_rights: UserRights,
}

/// Builds and re-signs licenses.
#[derive(Debug, Clone)]
pub struct LicenseBuilder {
    config: BuilderConfig,
    signer: Arc<LicenseSigner>,
}

impl LicenseBuilder {
    pub fn new(config: BuilderConfig, signer: Arc<LicenseSigner>) -> Self {
        Self { config, signer }
    }

    pub fn signer(&self) -> &LicenseSigner {
        &self.signer
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Complete a license request for `content` and sign it.
    pub fn complete_license(
        &self,
        license: &mut License,
        content: &Content,
    ) -> Result<(), LicenseError> {
        self.prepare(license);
        self.build(license, content)?;
        self.signer.sign(license)?;
        tracing::debug!(license_id = %license.id, content_id = %content.id, "license completed");
        Ok(())
    }

    /// Regenerate a stored license for a holder who supplied their user data
    /// and key material again.
    ///
    /// The stored license keeps its id, issue date and rights; `user` and
    /// `user_key` come from `input`.
    pub fn rebuild_license(
        &self,
        stored: &mut License,
        content: &Content,
        input: &License,
    ) -> Result<(), LicenseError> {
        if input.user.email.as_deref().map_or(true, str::is_empty) {
            return Err(LicenseError::BadLicenseInput(
                "user information must be passed in input".to_string(),
            ));
        }
        stored.user = input.user.clone();
        stored.encryption.user_key = input.encryption.user_key.clone();
        stored.encryption.profile = PROFILE_1_0.to_string();
        stored.updated = Some(Timestamp::now());
        self.build(stored, content)?;
        self.signer.sign(stored)?;
        tracing::debug!(license_id = %stored.id, "license regenerated");
        Ok(())
    }

    /// Apply a rights patch, stamp `updated` and re-sign.
    ///
    /// Only `print`, `copy`, `start` and `end` are taken from `patch.rights`;
    /// a non-empty `patch.provider` replaces the provider.
    pub fn update_rights(&self, license: &mut License, patch: &License) -> Result<(), LicenseError> {
        let rights = &patch.rights;
        if rights.print.is_some() {
            license.rights.print = rights.print;
        }
        if rights.copy.is_some() {
            license.rights.copy = rights.copy;
        }
        if rights.start.is_some() {
            license.rights.start = rights.start;
        }
        if rights.end.is_some() {
            license.rights.end = rights.end;
        }
        if !patch.provider.is_empty() {
            license.provider = patch.provider.clone();
        }
        license.updated = Some(Timestamp::now());
        self.signer.sign(license)
    }

    fn prepare(&self, license: &mut License) {
        license.id = uuid::Uuid::new_v4().to_string();
        license.issued = Some(Timestamp::now());
        license.updated = None;
        license.signature = None;
        if license.provider.is_empty() {
            license.provider = self.config.provider.clone();
        }
        apply_default_rights(&mut license.rights, &self.config.default_rights);
        license.encryption.profile = PROFILE_1_0.to_string();
    }

    /// Links, key derivation and every encrypted field. Does not sign.
    fn build(&self, license: &mut License, content: &Content) -> Result<(), LicenseError> {
        license.links = self.build_links(&license.id, content)?;

        let user_key = derive_user_key(&mut license.encryption.user_key)?;
        if license.encryption.user_key.algorithm.is_empty() {
            license.encryption.user_key.algorithm = USER_KEY_ALGORITHM_SHA256.to_string();
        }

        let cbc = AesCbc;
        license.encryption.content_key = Some(ContentKey {
            algorithm: cbc.signature().to_string(),
            encrypted_value: encrypt_bytes(&cbc, &user_key[..], content.encryption_key.as_bytes())?,
        });
        encrypt_user_fields(&mut license.user, &user_key[..])?;
        license.encryption.user_key.key_check =
            Some(encrypt_bytes(&cbc, &user_key[..], license.id.as_bytes())?);
        Ok(())
    }

    fn build_links(&self, license_id: &str, content: &Content) -> Result<Vec<Link>, LicenseError> {
        let templates = &self.config.links;
        if templates.hint.is_empty() {
            return Err(LicenseError::Config("no hint link configured".to_string()));
        }
        if templates.publication.is_empty() {
            return Err(LicenseError::Config("no publication link configured".to_string()));
        }

        let mut links = Vec::with_capacity(3);
        links.push(Link {
            media_type: Some("text/html".to_string()),
            ..Link::new("hint", &templates.hint)
        });

        let href = templates
            .publication
            .replace("{content_id}", &content.id)
            .replace("{publication_id}", &content.id);
        links.push(Link {
            media_type: Some(EPUB_CONTENT_TYPE.to_string()),
            title: (!content.location.is_empty()).then(|| content.location.clone()),
            length: Some(content.length),
            hash: (!content.sha256.is_empty()).then(|| content.sha256.clone()),
            ..Link::new("publication", href)
        });

        if let Some(status) = &templates.status {
            links.push(Link {
                media_type: Some(STATUS_CONTENT_TYPE.to_string()),
                ..Link::new("status", status.replace("{license_id}", license_id))
            });
        }
        Ok(links)
    }
}

fn apply_default_rights(rights: &mut UserRights, defaults: &UserRights) {
    rights.print = rights.print.or(defaults.print);
    rights.copy = rights.copy.or(defaults.copy);
    rights.start = rights.start.or(defaults.start);
    rights.end = rights.end.or(defaults.end);
    rights.tts = rights.tts.or(defaults.tts);
    rights.edit = rights.edit.or(defaults.edit);
}

/// Take the user key out of the request. `value` wins over `clear_value`;
/// both are cleared.
fn derive_user_key(user_key: &mut UserKey) -> Result<Zeroizing<[u8; 32]>, LicenseError> {
    let value = user_key.value.take();
    let clear = user_key.clear_value.take();

    if let Some(mut value) = value {
        if value.len() != 32 {
            let len = value.len();
            zeroize::Zeroize::zeroize(&mut value);
            return Err(LicenseError::BadLicenseInput(format!(
                "user key value must be a 32-byte hash, got {len} bytes"
            )));
        }
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&value);
        zeroize::Zeroize::zeroize(&mut value);
        return Ok(key);
    }

    match clear {
        Some(passphrase) if !passphrase.is_empty() => {
            let passphrase = Zeroizing::new(passphrase);
            Ok(user_key_from_passphrase(&passphrase))
        }
        _ => Err(LicenseError::BadLicenseInput(
            "user key value or clear value required".to_string(),
        )),
    }
}

fn encrypt_user_fields(user: &mut UserInfo, key: &[u8]) -> Result<(), LicenseError> {
    for field in user.encrypted.clone() {
        let slot = match field.as_str() {
            "email" => &mut user.email,
            "name" => &mut user.name,
            _ => continue,
        };
        if let Some(plain) = slot.as_deref() {
            let ct = encrypt_bytes(&AesCbc, key, plain.as_bytes())?;
            *slot = Some(encoding::encode(&ct));
        }
    }
    Ok(())
}
