//! W3C XML Encryption block padding.
//!
//! The plaintext is extended to a multiple of the block size with arbitrary
//! filler bytes; the last byte holds the number of bytes added. Aligned
//! input gets a full block of padding, so a padded stream always ends with
//! at least one padding byte.

use crate::encrypter::{random_bytes, DecryptionError};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Append 1..=`BLOCK_SIZE` padding bytes to `buf`.
pub fn pad(buf: &mut Vec<u8>) {
    let pad_len = BLOCK_SIZE - (buf.len() % BLOCK_SIZE);
    let mut filler = [0u8; BLOCK_SIZE];
    random_bytes(&mut filler[..pad_len - 1]);
    buf.extend_from_slice(&filler[..pad_len - 1]);
    // pad_len <= 16
    buf.push(pad_len as u8);
}

/// Remove the padding written by [`pad`], returning the unpadded length.
pub fn unpad(buf: &[u8]) -> Result<usize, DecryptionError> {
    let last = *buf.last().ok_or(DecryptionError::InvalidPadding)? as usize;
    if last == 0 || last > BLOCK_SIZE || last > buf.len() {
        return Err(DecryptionError::InvalidPadding);
    }
    Ok(buf.len() - last)
}
