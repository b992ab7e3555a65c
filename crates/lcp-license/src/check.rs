//! Reading-side checks against a user key: the key check, the wrapped
//! content key and encrypted user fields.

use lcp_core::{encoding, ContentKeyBytes, License};
use lcp_crypto::{decrypt_bytes, AesCbc, DecryptionError};

use crate::error::LicenseError;

/// True when `user_key` decrypts `key_check` to the license id.
///
/// A wrong key usually fails padding validation; that is reported as
/// `Ok(false)`, not as an error.
pub fn key_check_matches(license: &License, user_key: &[u8]) -> Result<bool, LicenseError> {
    let check = license
        .encryption
        .user_key
        .key_check
        .as_deref()
        .ok_or_else(|| LicenseError::BadLicenseInput("license has no key check".to_string()))?;
    match decrypt_bytes(&AesCbc, user_key, check) {
        Ok(plain) => Ok(plain == license.id.as_bytes()),
        Err(DecryptionError::InvalidPadding) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Decrypt the content master key with `user_key`.
pub fn unwrap_content_key(
    license: &License,
    user_key: &[u8],
) -> Result<ContentKeyBytes, LicenseError> {
    let wrapped = license
        .encryption
        .content_key
        .as_ref()
        .ok_or_else(|| LicenseError::BadLicenseInput("license has no content key".to_string()))?;
    let mut plain = decrypt_bytes(&AesCbc, user_key, &wrapped.encrypted_value)?;
    let key = ContentKeyBytes::from_slice(&plain)
        .map_err(|e| LicenseError::BadLicenseInput(e.to_string()));
    zeroize::Zeroize::zeroize(&mut plain);
    key
}

/// Decrypt one base64 user field.
pub fn decrypt_user_field(value: &str, user_key: &[u8]) -> Result<String, LicenseError> {
    let ct = encoding::decode("user field", value)
        .map_err(|e| LicenseError::BadLicenseInput(e.to_string()))?;
    let plain = decrypt_bytes(&AesCbc, user_key, &ct)?;
    String::from_utf8(plain)
        .map_err(|_| LicenseError::BadLicenseInput("user field is not UTF-8".to_string()))
}
