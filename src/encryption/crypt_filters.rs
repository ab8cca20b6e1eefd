//! Per-object key derivation and cipher dispatch (Algorithm 1, spec component 4.5).
//!
//! Every string or stream is encrypted under its own key, derived from the file encryption key
//! mixed with the containing object's id. [`CryptFilter`] hides that derivation plus the choice
//! of cipher behind one small interface so the traversal driver in [`crate::encryption`] doesn't
//! need to know which crypt filter a document selected.

use std::fmt;

use crate::aes_cbc;
use crate::error::DecryptionError;
use crate::md5::md5;
use crate::object::ObjectId;
use crate::rc4::rc4;

pub trait CryptFilter: fmt::Debug + Send + Sync {
    /// The `/CFM` name this filter corresponds to (`V2` or `AESV2`).
    fn method(&self) -> &'static [u8];
    fn compute_key(&self, file_key: &[u8], obj_id: ObjectId) -> Result<Vec<u8>, DecryptionError>;
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, DecryptionError>;
    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError>;
}

/// Extends the file key with the low-order bytes of the object id (and, for AES, the "sAlT"
/// constant), then MD5-hashes and truncates to at most 16 bytes. Shared by both crypt filters;
/// they differ only in the extra salt and in which cipher consumes the result.
fn object_key(file_key: &[u8], obj_id: ObjectId, aes_salt: bool) -> Result<Vec<u8>, DecryptionError> {
    if file_key.is_empty() {
        return Err(DecryptionError::EmptyFileKey);
    }

    let mut material = Vec::with_capacity(file_key.len() + 9);
    material.extend_from_slice(file_key);
    material.extend_from_slice(&obj_id.0.to_le_bytes()[..3]);
    material.extend_from_slice(&obj_id.1.to_le_bytes()[..2]);
    if aes_salt {
        material.extend_from_slice(b"sAlT");
    }

    let key_len = (file_key.len() + 5).min(16);
    Ok(md5(material)[..key_len].to_vec())
}

#[derive(Clone, Copy, Debug)]
pub struct Rc4CryptFilter;

impl CryptFilter for Rc4CryptFilter {
    fn method(&self) -> &'static [u8] {
        b"V2"
    }

    fn compute_key(&self, file_key: &[u8], obj_id: ObjectId) -> Result<Vec<u8>, DecryptionError> {
        object_key(file_key, obj_id, false)
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        rc4(key, plaintext)
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        rc4(key, ciphertext)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Aes128CryptFilter;

impl CryptFilter for Aes128CryptFilter {
    fn method(&self) -> &'static [u8] {
        b"AESV2"
    }

    fn compute_key(&self, file_key: &[u8], obj_id: ObjectId) -> Result<Vec<u8>, DecryptionError> {
        object_key(file_key, obj_id, true)
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        aes_cbc::encrypt(key, plaintext)
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        aes_cbc::decrypt(key, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_differs_per_object_id() {
        let file_key = [0x11u8; 16];
        let k1 = object_key(&file_key, (1, 0), false).unwrap();
        let k2 = object_key(&file_key, (2, 0), false).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn object_key_length_capped_at_16() {
        let file_key = [0x22u8; 16];
        let key = object_key(&file_key, (7, 0), true).unwrap();
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn rc4_filter_round_trips_through_the_trait() {
        let filter = Rc4CryptFilter;
        let key = filter.compute_key(&[0x33u8; 5], (9, 0)).unwrap();
        let ciphertext = filter.encrypt(&key, b"per-object plaintext").unwrap();
        let plaintext = filter.decrypt(&key, &ciphertext).unwrap();
        assert_eq!(plaintext, b"per-object plaintext");
    }

    #[test]
    fn aes_filter_round_trips_through_the_trait() {
        let filter = Aes128CryptFilter;
        let key = filter.compute_key(&[0x44u8; 16], (3, 0)).unwrap();
        let ciphertext = filter.encrypt(&key, b"stream body").unwrap();
        let plaintext = filter.decrypt(&key, &ciphertext).unwrap();
        assert_eq!(plaintext, b"stream body");
    }

    #[test]
    fn aes_filter_decrypt_of_empty_ciphertext_is_empty() {
        let filter = Aes128CryptFilter;
        assert_eq!(filter.decrypt(&[0u8; 16], &[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn empty_file_key_is_rejected() {
        assert!(matches!(object_key(&[], (1, 0), false), Err(DecryptionError::EmptyFileKey)));
    }
}
