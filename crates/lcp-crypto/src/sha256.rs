//! SHA-256 helpers.
//!
//! A user key is the SHA-256 digest of the user passphrase. Publication
//! digests are reported as lowercase hex.

use lcp_core::encoding::hex_encode;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Derive the 32-byte user key from a clear passphrase.
pub fn user_key_from_passphrase(passphrase: &str) -> Zeroizing<[u8; 32]> {
    let hash = Sha256::digest(passphrase.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&hash);
    key
}

/// SHA-256 of `data` as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex_encode(&Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn passphrase_key_matches_digest() {
        let key = user_key_from_passphrase("abc");
        assert_eq!(
            hex_encode(&key[..]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
