//! Key derivation: the Standard Security Handler's Algorithms 2 through 7 (spec component 4.4).
//!
//! Revision 2 uses a 40-bit (5-byte) key and the plain RC4-encrypted padding constant as `/U`;
//! revisions 3 and 4 use a key of `key_len_bytes` (up to 16) and run the extra 50-round rehash
//! and 19-round XOR'd RC4 cascade that Algorithms 3 and 5 call for.

use zeroize::Zeroizing;

use crate::error::DecryptionError;
use crate::md5::md5;
use crate::rc4::rc4;

/// If a password is shorter than 32 bytes, it is padded by appending bytes from the start of
/// this constant; an empty password is replaced by the constant in its entirety.
pub const PAD_BYTES: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pads or truncates `password` to exactly 32 bytes per the rule above.
pub fn pad(password: &[u8]) -> Zeroizing<[u8; 32]> {
    let len = password.len().min(32);
    let mut padded = [0u8; 32];
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PAD_BYTES[..32 - len]);
    Zeroizing::new(padded)
}

/// XORs every byte of `key` with the single-byte round counter used by Algorithms 3, 5, and 7's
/// 19-round RC4 cascade.
fn xor_round_key(key: &[u8], round: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ round).collect()
}

/// Algorithm 3: computes the encryption dictionary's `/O` value.
///
/// `owner_password` is already-sanitized bytes; pass an empty slice when there is no distinct
/// owner password (the user password is then used in its place, per spec resolution #5).
pub fn compute_owner_value(owner_password: &[u8], user_password: &[u8], revision: u8, key_len_bytes: usize) -> Result<[u8; 32], DecryptionError> {
    let password = if owner_password.is_empty() { user_password } else { owner_password };

    let mut hash = Zeroizing::new(md5(pad(password).as_slice()));
    if revision >= 3 {
        for _ in 0..50 {
            hash = Zeroizing::new(md5(*hash));
        }
    }

    let key = &hash[..key_len_bytes];
    let mut result = Zeroizing::new(rc4(key, pad(user_password).as_slice())?);

    if revision >= 3 {
        for round in 1..=19u8 {
            result = Zeroizing::new(rc4(&xor_round_key(key, round), &result)?);
        }
    }

    let mut owner_value = [0u8; 32];
    owner_value.copy_from_slice(&result);
    Ok(owner_value)
}

/// Algorithm 2: computes the file encryption key from the (already-sanitized) user password and
/// the other encryption dictionary fields it is mixed with.
///
/// `key_len_bytes` is 5 for revision 2, and the `/Length`-derived byte count (up to 16) for
/// revision 3 or 4. Owner-key rehashing (Algorithm 3) truncates to `key_len_bytes` only *after*
/// all 50 rounds settle on the final digest; this rehashes the truncated digest on every round,
/// which is the distinct procedure Algorithm 2 actually specifies.
///
/// `/EncryptMetadata` is not mixed in here: per this handler's scope, the flag is recorded in the
/// encryption dictionary but has no behavioral effect on key derivation.
pub fn compute_file_key(
    user_password: &[u8],
    owner_value: &[u8; 32],
    permissions: u32,
    file_id: &[u8],
    revision: u8,
    key_len_bytes: usize,
) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
    if key_len_bytes == 0 || key_len_bytes > 16 {
        return Err(DecryptionError::InvalidKeyLength(key_len_bytes as i64 * 8));
    }

    let mut digest_input = Zeroizing::new(Vec::with_capacity(32 + 32 + 4 + file_id.len()));
    digest_input.extend_from_slice(pad(user_password).as_slice());
    digest_input.extend_from_slice(owner_value);
    digest_input.extend_from_slice(&permissions.to_le_bytes());
    digest_input.extend_from_slice(file_id);

    let mut hash = Zeroizing::new(md5(&digest_input));
    if revision >= 3 {
        for _ in 0..50 {
            hash = Zeroizing::new(md5(&hash[..key_len_bytes]));
        }
    }

    Ok(Zeroizing::new(hash[..key_len_bytes].to_vec()))
}

/// Algorithm 4: computes the encryption dictionary's `/U` value for revision 2.
pub fn compute_user_value_r2(file_key: &[u8]) -> Result<[u8; 32], DecryptionError> {
    let mut user_value = [0u8; 32];
    user_value.copy_from_slice(&rc4(file_key, &PAD_BYTES)?);
    Ok(user_value)
}

/// Algorithm 5: computes the encryption dictionary's `/U` value for revision 3 or 4.
///
/// The final 16 bytes are padding with no bearing on validation; this crate follows spec
/// resolution #2 and fills them with zeros instead of the original's arbitrary random bytes, so
/// that `/U` is a pure function of the file key and file id.
pub fn compute_user_value_r3_r4(file_key: &[u8], file_id: &[u8]) -> Result<[u8; 32], DecryptionError> {
    let mut digest_input = Vec::with_capacity(32 + file_id.len());
    digest_input.extend_from_slice(&PAD_BYTES);
    digest_input.extend_from_slice(file_id);
    let hash = md5(&digest_input);

    let mut result = Zeroizing::new(rc4(file_key, &hash)?);
    for round in 1..=19u8 {
        result = Zeroizing::new(rc4(&xor_round_key(file_key, round), &result)?);
    }

    let mut user_value = [0u8; 32];
    user_value[..16].copy_from_slice(&result);
    Ok(user_value)
}

/// Algorithm 6: checks a candidate user password against the stored `/U` value, returning the
/// file encryption key on success.
///
/// Revision 3/4 only compares the first 16 bytes of `/U`, since bytes 16..32 are padding.
#[allow(clippy::too_many_arguments)]
pub fn authenticate_user_password(
    candidate_user_password: &[u8],
    owner_value: &[u8; 32],
    user_value: &[u8; 32],
    permissions: u32,
    file_id: &[u8],
    revision: u8,
    key_len_bytes: usize,
) -> Result<Option<Zeroizing<Vec<u8>>>, DecryptionError> {
    let file_key = compute_file_key(candidate_user_password, owner_value, permissions, file_id, revision, key_len_bytes)?;

    let computed_user_value = if revision == 2 {
        compute_user_value_r2(&file_key)?
    } else {
        compute_user_value_r3_r4(&file_key, file_id)?
    };

    let compare_len = if revision == 2 { 32 } else { 16 };
    if computed_user_value[..compare_len] == user_value[..compare_len] {
        Ok(Some(file_key))
    } else {
        Ok(None)
    }
}

/// Algorithm 7: checks a candidate owner password against the stored `/O` value by inverting
/// Algorithm 3 to recover the padded user password, then re-validating it through Algorithm 6.
///
/// The inversion runs the RC4 cascade with *descending* round counters (19 down to 1) before the
/// final unmodified-key pass, exactly undoing the ascending cascade Algorithm 3 applied.
#[allow(clippy::too_many_arguments)]
pub fn authenticate_owner_password(
    candidate_owner_password: &[u8],
    owner_value: &[u8; 32],
    user_value: &[u8; 32],
    permissions: u32,
    file_id: &[u8],
    revision: u8,
    key_len_bytes: usize,
) -> Result<Option<Zeroizing<Vec<u8>>>, DecryptionError> {
    let mut hash = Zeroizing::new(md5(pad(candidate_owner_password).as_slice()));
    if revision >= 3 {
        for _ in 0..50 {
            hash = Zeroizing::new(md5(*hash));
        }
    }
    let key = &hash[..key_len_bytes];

    let mut result = Zeroizing::new(owner_value.to_vec());
    if revision >= 3 {
        for round in (1..=19u8).rev() {
            result = Zeroizing::new(rc4(&xor_round_key(key, round), &result)?);
        }
    }
    let recovered_user_password = Zeroizing::new(rc4(key, &result)?);

    authenticate_user_password(&recovered_user_password, owner_value, user_value, permissions, file_id, revision, key_len_bytes)
}
