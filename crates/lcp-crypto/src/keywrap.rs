//! RFC 3394 AES key wrap.
//!
//! Deterministic: the same KEK and key always produce the same output. The
//! KEK length selects AES-128, AES-192 or AES-256.

use aes_gcm::aes::cipher::consts::U16;
use aes_gcm::aes::cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit};
use aes_gcm::aes::{Aes128, Aes192, Aes256, Block};

use crate::encrypter::{DecryptionError, EncryptionError};

/// Default integrity check value.
pub const DEFAULT_IV: [u8; 8] = [0xA6; 8];

/// Wrap `key` under `kek`. `key` must be at least two 64-bit blocks and a
/// multiple of 8 bytes.
pub fn wrap(kek: &[u8], key: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if key.len() < 16 || key.len() % 8 != 0 {
        return Err(EncryptionError::InvalidInput(format!(
            "key to wrap must be at least 16 bytes and a multiple of 8, got {}",
            key.len()
        )));
    }
    match kek.len() {
        16 => Ok(wrap_with(&Aes128::new_from_slice(kek).map_err(|_| bad_kek(kek))?, key)),
        24 => Ok(wrap_with(&Aes192::new_from_slice(kek).map_err(|_| bad_kek(kek))?, key)),
        32 => Ok(wrap_with(&Aes256::new_from_slice(kek).map_err(|_| bad_kek(kek))?, key)),
        n => Err(EncryptionError::InvalidKeyLength(n)),
    }
}

/// Unwrap `wrapped` under `kek`, checking the integrity value.
pub fn unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    if wrapped.len() < 24 || wrapped.len() % 8 != 0 {
        return Err(DecryptionError::Truncated(format!(
            "wrapped key must be at least 24 bytes and a multiple of 8, got {}",
            wrapped.len()
        )));
    }
    let kek_len = kek.len();
    let bad = || DecryptionError::InvalidKeyLength(kek_len);
    match kek_len {
        16 => unwrap_with(&Aes128::new_from_slice(kek).map_err(|_| bad())?, wrapped),
        24 => unwrap_with(&Aes192::new_from_slice(kek).map_err(|_| bad())?, wrapped),
        32 => unwrap_with(&Aes256::new_from_slice(kek).map_err(|_| bad())?, wrapped),
        n => Err(DecryptionError::InvalidKeyLength(n)),
    }
}

fn bad_kek(kek: &[u8]) -> EncryptionError {
    EncryptionError::InvalidKeyLength(kek.len())
}

fn wrap_with<C: BlockEncrypt + BlockSizeUser<BlockSize = U16>>(cipher: &C, key: &[u8]) -> Vec<u8> {
    let n = key.len() / 8;
    let mut a = DEFAULT_IV;
    let mut r: Vec<[u8; 8]> = key
        .chunks_exact(8)
        .map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            b
        })
        .collect();

    let mut block = Block::default();
    for j in 0..6u64 {
        for (i, ri) in r.iter_mut().enumerate() {
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(ri);
            cipher.encrypt_block(&mut block);
            let t = j * n as u64 + i as u64 + 1;
            a.copy_from_slice(&block[..8]);
            xor_t(&mut a, t);
            ri.copy_from_slice(&block[8..]);
        }
    }

    let mut out = Vec::with_capacity(8 * (n + 1));
    out.extend_from_slice(&a);
    for ri in &r {
        out.extend_from_slice(ri);
    }
    out
}

fn unwrap_with<C: BlockDecrypt + BlockSizeUser<BlockSize = U16>>(
    cipher: &C,
    wrapped: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let n = wrapped.len() / 8 - 1;
    let mut a = [0u8; 8];
    a.copy_from_slice(&wrapped[..8]);
    let mut r: Vec<[u8; 8]> = wrapped[8..]
        .chunks_exact(8)
        .map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            b
        })
        .collect();

    let mut block = Block::default();
    for j in (0..6u64).rev() {
        for i in (0..n).rev() {
            let t = j * n as u64 + i as u64 + 1;
            xor_t(&mut a, t);
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(&r[i]);
            cipher.decrypt_block(&mut block);
            a.copy_from_slice(&block[..8]);
            r[i].copy_from_slice(&block[8..]);
        }
    }

    if !ct_eq(&a, &DEFAULT_IV) {
        return Err(DecryptionError::Authentication);
    }
    Ok(r.concat())
}

fn xor_t(a: &mut [u8; 8], t: u64) {
    for (x, y) in a.iter_mut().zip(t.to_be_bytes()) {
        *x ^= y;
    }
}

fn ct_eq(a: &[u8; 8], b: &[u8; 8]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
