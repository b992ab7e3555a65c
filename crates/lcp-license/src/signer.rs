//! # License Signing and Verification
//!
//! The signing input is the JCS form of the license with `signature`
//! removed. The signature block carries the hex public key as
//! `certificate` and the hex Ed25519 signature as `value`, so a license is
//! verifiable on its own.

use lcp_core::error::CryptoError;
use lcp_core::{CanonicalBytes, License, Signature};
use lcp_crypto::ed25519::{verify_with_public_key, ED25519_SIGNATURE_URI};
use lcp_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

use crate::error::LicenseError;

/// Canonical bytes of `license` without its signature.
pub fn signing_input(license: &License) -> Result<CanonicalBytes, LicenseError> {
    Ok(CanonicalBytes::new(&license.unsigned())?)
}

/// Holds the provider key pair.
#[derive(Debug)]
pub struct LicenseSigner {
    key: Ed25519KeyPair,
}

impl LicenseSigner {
    pub fn new(key: Ed25519KeyPair) -> Self {
        Self { key }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }

    /// Replace any existing signature with a fresh one.
    pub fn sign(&self, license: &mut License) -> Result<(), LicenseError> {
        license.signature = None;
        let canonical = signing_input(license)?;
        let sig = self.key.sign(&canonical);
        license.signature = Some(Signature {
            certificate: self.key.public_key().to_hex(),
            value: sig.to_hex(),
            algorithm: ED25519_SIGNATURE_URI.to_string(),
        });
        Ok(())
    }
}

/// Verify the embedded signature against the embedded certificate.
///
/// When `trusted` is given the certificate must also match it.
pub fn verify_license(
    license: &License,
    trusted: Option<&Ed25519PublicKey>,
) -> Result<(), LicenseError> {
    let sig_block = license
        .signature
        .as_ref()
        .ok_or_else(|| CryptoError::VerificationFailed("license is not signed".to_string()))?;

    if sig_block.algorithm != ED25519_SIGNATURE_URI {
        return Err(CryptoError::VerificationFailed(format!(
            "unsupported signature algorithm {}",
            sig_block.algorithm
        ))
        .into());
    }

    let embedded = Ed25519PublicKey::from_hex(&sig_block.certificate)?;
    if let Some(trusted) = trusted {
        if trusted != &embedded {
            return Err(CryptoError::VerificationFailed(
                "certificate does not match the trusted provider key".to_string(),
            )
            .into());
        }
    }

    let sig = Ed25519Signature::from_hex(&sig_block.value)?;
    let canonical = signing_input(license)?;
    verify_with_public_key(&canonical, &sig, &embedded)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcp_core::UserRights;

    fn sample() -> License {
        License {
            provider: "https://provider.example".into(),
            id: "lic-1".into(),
            rights: UserRights {
                print: Some(10),
                ..UserRights::default()
            },
            ..License::default()
        }
    }

    #[test]
    fn sign_then_verify() {
        let signer = LicenseSigner::new(Ed25519KeyPair::generate());
        let mut lic = sample();
        signer.sign(&mut lic).unwrap();

        let sig = lic.signature.as_ref().unwrap();
        assert_eq!(sig.algorithm, ED25519_SIGNATURE_URI);
        assert_eq!(sig.certificate, signer.public_key().to_hex());
        verify_license(&lic, None).unwrap();
        verify_license(&lic, Some(&signer.public_key())).unwrap();
    }

    #[test]
    fn any_mutation_after_signing_fails() {
        let signer = LicenseSigner::new(Ed25519KeyPair::generate());
        let mut lic = sample();
        signer.sign(&mut lic).unwrap();

        let mut tampered = lic.clone();
        tampered.rights.print = Some(11);
        assert!(verify_license(&tampered, None).is_err());

        let mut tampered = lic.clone();
        tampered.provider.push('x');
        assert!(verify_license(&tampered, None).is_err());
    }

    #[test]
    fn untrusted_certificate_rejected() {
        let signer = LicenseSigner::new(Ed25519KeyPair::generate());
        let other = Ed25519KeyPair::generate().public_key();
        let mut lic = sample();
        signer.sign(&mut lic).unwrap();
        assert!(matches!(
            verify_license(&lic, Some(&other)),
            Err(LicenseError::Verification(_))
        ));
    }

    #[test]
    fn verification_key_comes_from_embedded_certificate() {
        let signer = LicenseSigner::new(Ed25519KeyPair::generate());
        let mut lic = sample();
        signer.sign(&mut lic).unwrap();

        let mut swapped = lic.clone();
        if let Some(sig) = swapped.signature.as_mut() {
            sig.certificate = Ed25519KeyPair::generate().public_key().to_hex();
        }
        assert!(verify_license(&swapped, None).is_err());
    }

    #[test]
    fn unsigned_license_fails() {
        assert!(verify_license(&sample(), None).is_err());
    }

    #[test]
    fn resigning_replaces_signature() {
        let signer = LicenseSigner::new(Ed25519KeyPair::generate());
        let mut lic = sample();
        signer.sign(&mut lic).unwrap();
        lic.rights.copy = Some(5);
        signer.sign(&mut lic).unwrap();
        verify_license(&lic, None).unwrap();
    }
}
