//! # AES-256-CBC Encrypter
//!
//! Output layout: `IV (16 bytes) || CBC(plaintext || W3C padding)`.
//!
//! A fresh random IV is drawn on every call, so two encryptions of the same
//! plaintext under the same key never produce the same ciphertext. This is
//! the algorithm used for the content key, the key check and encrypted user
//! fields, and for publication resources.

use std::io::{Read, Write};

use aes_gcm::aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes_gcm::aes::{Aes256, Block};
use lcp_core::ContentKeyBytes;

use crate::encrypter::{random_bytes, DecryptionError, Decrypter, EncryptionError, Encrypter};
use crate::padding::{pad, unpad, BLOCK_SIZE};

/// Algorithm URI for AES-256-CBC.
pub const AES256_CBC_URI: &str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";

const READ_CHUNK: usize = 64 * 1024;

/// AES-256-CBC with a random IV prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCbc;

impl AesCbc {
    fn cipher(key: &[u8]) -> Option<Aes256> {
        Aes256::new_from_slice(key).ok()
    }
}

impl Encrypter for AesCbc {
    fn signature(&self) -> &'static str {
        AES256_CBC_URI
    }

    fn generate_key(&self) -> Result<ContentKeyBytes, EncryptionError> {
        let mut key = [0u8; 32];
        random_bytes(&mut key);
        let out = ContentKeyBytes::from_slice(&key)
            .map_err(|e| EncryptionError::InvalidInput(e.to_string()));
        zeroize::Zeroize::zeroize(&mut key);
        out
    }

    fn encrypt(
        &self,
        key: &[u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), EncryptionError> {
        let cipher = Self::cipher(key).ok_or(EncryptionError::InvalidKeyLength(key.len()))?;

        let mut chain = Block::default();
        random_bytes(&mut chain);
        output.write_all(&chain)?;

        let mut pending: Vec<u8> = Vec::with_capacity(READ_CHUNK + BLOCK_SIZE);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = input.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            pending.extend_from_slice(&chunk[..n]);
            let full = pending.len() - pending.len() % BLOCK_SIZE;
            encrypt_blocks(&cipher, &mut chain, &mut pending[..full]);
            output.write_all(&pending[..full])?;
            pending.drain(..full);
        }

        pad(&mut pending);
        encrypt_blocks(&cipher, &mut chain, &mut pending);
        output.write_all(&pending)?;
        Ok(())
    }
}

impl Decrypter for AesCbc {
    fn decrypt(
        &self,
        key: &[u8],
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), DecryptionError> {
        let cipher = Self::cipher(key).ok_or(DecryptionError::InvalidKeyLength(key.len()))?;

        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        if data.len() < 2 * BLOCK_SIZE {
            return Err(DecryptionError::Truncated(format!(
                "{} bytes, need at least an IV and one block",
                data.len()
            )));
        }
        if data.len() % BLOCK_SIZE != 0 {
            return Err(DecryptionError::Truncated(format!(
                "{} bytes is not a multiple of the block size",
                data.len()
            )));
        }

        let (iv, body) = data.split_at_mut(BLOCK_SIZE);
        let mut chain = Block::clone_from_slice(iv);
        for block in body.chunks_exact_mut(BLOCK_SIZE) {
            let saved = Block::clone_from_slice(block);
            let b = Block::from_mut_slice(block);
            cipher.decrypt_block(b);
            xor_in_place(b, &chain);
            chain = saved;
        }

        let plain_len = unpad(body)?;
        output.write_all(&body[..plain_len])?;
        Ok(())
    }
}

fn encrypt_blocks(cipher: &Aes256, chain: &mut Block, data: &mut [u8]) {
    for block in data.chunks_exact_mut(BLOCK_SIZE) {
        let b = Block::from_mut_slice(block);
        xor_in_place(b, chain);
        cipher.encrypt_block(b);
        *chain = *b;
    }
}

fn xor_in_place(block: &mut Block, other: &Block) {
    for (a, b) in block.iter_mut().zip(other.iter()) {
        *a ^= b;
    }
}
