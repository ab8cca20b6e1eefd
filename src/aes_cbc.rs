//! AES-128-CBC engine with PKCS#7 padding (spec component 4.3).
//!
//! Ciphertext layout is always `IV (16 bytes) || AES-CBC(data, PKCS#7 padded)`, with the IV drawn
//! fresh from a cryptographically secure RNG on every call to [`encrypt`].

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::error::DecryptionError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const BLOCK_SIZE: usize = 16;

/// Encrypts `plaintext` under `key` (must be exactly 16 bytes), prepending a fresh random IV.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    if key.len() != BLOCK_SIZE {
        return Err(DecryptionError::MalformedCiphertext("AES-128 key must be 16 bytes"));
    }

    let mut iv = [0u8; BLOCK_SIZE];
    rand::rng().fill_bytes(&mut iv);

    // Ciphertext is the padded plaintext rounded up to the next block boundary.
    let padded_len = (plaintext.len() / BLOCK_SIZE + 1) * BLOCK_SIZE;
    let mut buffer = vec![0u8; BLOCK_SIZE + padded_len];
    buffer[..BLOCK_SIZE].copy_from_slice(&iv);
    buffer[BLOCK_SIZE..BLOCK_SIZE + plaintext.len()].copy_from_slice(plaintext);

    let ciphertext = Aes128CbcEnc::new(key.into(), &iv.into())
        .encrypt_padded_mut::<Pkcs7>(&mut buffer[BLOCK_SIZE..], plaintext.len())
        .map_err(|_| DecryptionError::MalformedCiphertext("padding failed during encryption"))?;
    let ciphertext_len = ciphertext.len();
    buffer.truncate(BLOCK_SIZE + ciphertext_len);
    Ok(buffer)
}

/// Decrypts `ciphertext` (must be `IV || ciphertext`, ciphertext a non-empty multiple of 16
/// bytes) under `key` (must be exactly 16 bytes), returning the unpadded plaintext.
pub fn decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    if key.len() != BLOCK_SIZE {
        return Err(DecryptionError::MalformedCiphertext("AES-128 key must be 16 bytes"));
    }
    if ciphertext.len() < 2 * BLOCK_SIZE || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(DecryptionError::MalformedCiphertext(
            "ciphertext must be at least 32 bytes and a multiple of 16 after the IV",
        ));
    }

    let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
    let mut body = body.to_vec();
    let plaintext = Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<Pkcs7>(&mut body)
        .map_err(|_| DecryptionError::MalformedCiphertext("PKCS#7 padding invalid"))?;
    Ok(plaintext.to_vec())
}
