//! The Standard Security Handler: password validation, the encryption dictionary, and the
//! object-graph traversal that applies per-object ciphers (spec components 4.5–4.8).

mod algorithms;
pub mod crypt_filters;

use std::sync::Arc;

use bitflags::bitflags;
use log::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::encryption::crypt_filters::{Aes128CryptFilter, CryptFilter, Rc4CryptFilter};
use crate::document::Document;
use crate::error::{DecryptionError, Result};
use crate::object::{Dictionary, Object, ObjectId};

pub use crypt_filters::CryptFilter as _;

bitflags! {
    /// The `/P` permission flags (ISO 32000-1 Table 22), minus the reserved bits that
    /// [`Permissions::normalize`] fills in before the value is written to an encryption
    /// dictionary.
    #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
    pub struct Permissions: u32 {
        const PRINTABLE = 1 << 2;
        const MODIFIABLE = 1 << 3;
        const COPYABLE = 1 << 4;
        const ANNOTABLE = 1 << 5;
        const FILLABLE = 1 << 8;
        const COPYABLE_FOR_ACCESSIBILITY = 1 << 9;
        const ASSEMBLABLE = 1 << 10;
        const PRINTABLE_IN_HIGH_QUALITY = 1 << 11;
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

impl Permissions {
    /// Normalizes the reserved bits per §4.8 step 1, returning the raw 32-bit `/P` value.
    pub fn normalize(self, strong: bool) -> u32 {
        let mut bits = self.bits();
        bits |= if strong { 0xFFFF_F0C0 } else { 0xFFFF_FFC0 };
        bits &= 0xFFFF_FFFC;
        bits
    }
}

/// The three encryption profiles this handler can produce. Revision and `/CF` generality beyond
/// these (public-key handlers, R5/R6 AES-256) is out of scope.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SecurityLevel {
    Rc4_40,
    Rc4_128,
    Aes_128,
}

impl SecurityLevel {
    fn version(self) -> i64 {
        match self {
            SecurityLevel::Rc4_40 => 1,
            SecurityLevel::Rc4_128 => 2,
            SecurityLevel::Aes_128 => 4,
        }
    }

    fn revision(self) -> u8 {
        match self {
            SecurityLevel::Rc4_40 => 2,
            SecurityLevel::Rc4_128 => 3,
            SecurityLevel::Aes_128 => 4,
        }
    }

    fn key_len_bytes(self) -> usize {
        match self {
            SecurityLevel::Rc4_40 => 5,
            SecurityLevel::Rc4_128 | SecurityLevel::Aes_128 => 16,
        }
    }

    fn crypt_filter(self) -> Arc<dyn CryptFilter> {
        match self {
            SecurityLevel::Rc4_40 | SecurityLevel::Rc4_128 => Arc::new(Rc4CryptFilter),
            SecurityLevel::Aes_128 => Arc::new(Aes128CryptFilter),
        }
    }
}

/// Everything derived from a successful password validation or a fresh [`prepare_encryption`]
/// call: the live session material the traversal driver needs to encrypt or decrypt objects.
pub struct EncryptionState {
    version: i64,
    revision: u8,
    key_len_bytes: usize,
    encrypt_metadata: bool,
    permissions_raw: u32,
    owner_value: [u8; 32],
    user_value: [u8; 32],
    file_key: Zeroizing<Vec<u8>>,
    crypt_filter: Arc<dyn CryptFilter>,
}

impl EncryptionState {
    pub fn revision(&self) -> u8 {
        self.revision
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::from_bits_truncate(self.permissions_raw)
    }

    pub fn file_key(&self) -> &[u8] {
        &self.file_key
    }

    /// Builds the `/Encrypt` dictionary for this session (spec component 4.8).
    pub fn encode(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(b"Standard".to_vec()));
        dict.set("V", self.version);
        dict.set("R", i64::from(self.revision));
        dict.set("Length", (self.key_len_bytes * 8) as i64);
        dict.set("O", Object::string_literal(self.owner_value.to_vec()));
        dict.set("U", Object::string_literal(self.user_value.to_vec()));
        dict.set("P", i64::from(self.permissions_raw as i32));

        if self.revision >= 4 {
            dict.set("EncryptMetadata", self.encrypt_metadata);

            let mut std_cf = Dictionary::new();
            std_cf.set("CFM", Object::Name(self.crypt_filter.method().to_vec()));
            std_cf.set("AuthEvent", Object::Name(b"DocOpen".to_vec()));
            std_cf.set("Length", self.key_len_bytes as i64);

            let mut cf = Dictionary::new();
            cf.set("StdCF", std_cf);

            dict.set("CF", cf);
            dict.set("StmF", Object::Name(b"StdCF".to_vec()));
            dict.set("StrF", Object::Name(b"StdCF".to_vec()));
        }

        dict
    }
}

/// A parsed, not-yet-validated `/Encrypt` dictionary: everything needed to try a password
/// without yet knowing whether it is the owner's or the user's.
struct ParsedEncryptDict {
    version: i64,
    revision: u8,
    key_len_bytes: usize,
    encrypt_metadata: bool,
    permissions_raw: u32,
    owner_value: [u8; 32],
    user_value: [u8; 32],
    crypt_filter: Arc<dyn CryptFilter>,
}

impl ParsedEncryptDict {
    fn parse(dict: &Dictionary) -> Result<Self> {
        let filter = dict.get(b"Filter")?.as_name_opt().ok_or(DecryptionError::WrongFieldType("Filter"))?;
        if filter != b"Standard" {
            return Err(DecryptionError::UnknownEncryption.into());
        }

        let version = dict.get(b"V")?.as_i64()?;
        match version {
            1 | 2 | 4 => {}
            _ => return Err(DecryptionError::UnknownEncryption.into()),
        }

        let revision = dict.get(b"R")?.as_i64()?;
        let revision: u8 = match revision {
            2 | 3 | 4 => revision as u8,
            _ => return Err(DecryptionError::UnsupportedRevision.into()),
        };

        let owner_value = fixed_32(dict.get(b"O")?.as_str()?, DecryptionError::InvalidOwnerValueLength)?;
        let user_value = fixed_32(dict.get(b"U")?.as_str()?, DecryptionError::InvalidUserValueLength)?;

        let permissions_raw = dict.get(b"P")?.as_i64()? as u32;

        let encrypt_metadata = dict
            .get(b"EncryptMetadata")
            .ok()
            .and_then(|object| match object {
                Object::Boolean(value) => Some(*value),
                _ => None,
            })
            .unwrap_or(true);

        let default_key_len_bytes = if revision == 2 { 5 } else { 16 };
        let key_len_bytes = match dict.get(b"Length") {
            Ok(object) => {
                let bits = object.as_i64()?;
                if !(40..=128).contains(&bits) || bits % 8 != 0 {
                    return Err(DecryptionError::InvalidKeyLength(bits).into());
                }
                if version == 1 && bits != 40 {
                    warn!("/Encrypt has /V 1 with a non-default /Length {bits}");
                }
                (bits / 8) as usize
            }
            Err(_) => default_key_len_bytes,
        };

        let crypt_filter: Arc<dyn CryptFilter> = if version == 4 {
            let cf = dict.get(b"CF")?.as_dict()?;
            let std_cf = cf.get(b"StdCF")?.as_dict()?;

            let auth_event = std_cf
                .get(b"AuthEvent")
                .ok()
                .and_then(Object::as_name_opt)
                .unwrap_or(b"DocOpen");
            if auth_event != b"DocOpen" {
                return Err(DecryptionError::UnsupportedCryptFilter.into());
            }

            let cfm = std_cf.get(b"CFM")?.as_name_opt().ok_or(DecryptionError::WrongFieldType("CFM"))?;
            match cfm {
                b"V2" => Arc::new(Rc4CryptFilter),
                b"AESV2" => Arc::new(Aes128CryptFilter),
                _ => return Err(DecryptionError::UnsupportedCryptFilter.into()),
            }
        } else {
            Arc::new(Rc4CryptFilter)
        };

        Ok(ParsedEncryptDict {
            version,
            revision,
            key_len_bytes,
            encrypt_metadata,
            permissions_raw,
            owner_value,
            user_value,
            crypt_filter,
        })
    }

    fn into_state(self, file_key: Zeroizing<Vec<u8>>) -> EncryptionState {
        EncryptionState {
            version: self.version,
            revision: self.revision,
            key_len_bytes: self.key_len_bytes,
            encrypt_metadata: self.encrypt_metadata,
            permissions_raw: self.permissions_raw,
            owner_value: self.owner_value,
            user_value: self.user_value,
            file_key,
            crypt_filter: self.crypt_filter,
        }
    }
}

fn fixed_32(bytes: &[u8], err: fn(usize) -> DecryptionError) -> Result<[u8; 32]> {
    if bytes.len() != 32 {
        return Err(err(bytes.len()).into());
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// The result of checking a password against a document's encryption dictionary (spec §4.4.4,
/// §4.7). Password mismatch is a value, never an error.
pub enum ValidationOutcome {
    OwnerPassword(EncryptionState),
    UserPassword(EncryptionState),
    Invalid,
}

/// Tries `password` as owner, then as user, against `document`'s `/Encrypt` dictionary.
pub fn validate(document: &Document, password: &[u8]) -> Result<ValidationOutcome> {
    let dict = document.get_encrypted()?;
    let parsed = ParsedEncryptDict::parse(dict)?;
    let file_id = document.file_id().ok_or(DecryptionError::MissingFileId)?;

    if let Some(file_key) = algorithms::authenticate_owner_password(
        password,
        &parsed.owner_value,
        &parsed.user_value,
        parsed.permissions_raw,
        file_id,
        parsed.revision,
        parsed.key_len_bytes,
    )? {
        debug!("password validated against /Encrypt R{} as owner", parsed.revision);
        return Ok(ValidationOutcome::OwnerPassword(parsed.into_state(file_key)));
    }

    if let Some(file_key) = algorithms::authenticate_user_password(
        password,
        &parsed.owner_value,
        &parsed.user_value,
        parsed.permissions_raw,
        file_id,
        parsed.revision,
        parsed.key_len_bytes,
    )? {
        debug!("password validated against /Encrypt R{} as user", parsed.revision);
        return Ok(ValidationOutcome::UserPassword(parsed.into_state(file_key)));
    }

    warn!("password validation failed against /Encrypt R{}", parsed.revision);
    Ok(ValidationOutcome::Invalid)
}

/// Builds a fresh encryption session and `/Encrypt` dictionary for `level` (spec component 4.8).
pub fn prepare_encryption(
    document: &Document,
    level: SecurityLevel,
    user_password: &[u8],
    owner_password: &[u8],
    permissions: Permissions,
) -> Result<EncryptionState> {
    let revision = level.revision();
    let key_len_bytes = level.key_len_bytes();
    let strong = revision >= 3;
    let permissions_raw = permissions.normalize(strong);

    let owner_password = if owner_password.is_empty() { user_password } else { owner_password };

    let file_id = document.file_id().ok_or(DecryptionError::MissingFileId)?;

    let owner_value = algorithms::compute_owner_value(owner_password, user_password, revision, key_len_bytes)?;
    let file_key = algorithms::compute_file_key(user_password, &owner_value, permissions_raw, file_id, revision, key_len_bytes)?;
    let user_value = if revision == 2 {
        algorithms::compute_user_value_r2(&file_key)?
    } else {
        algorithms::compute_user_value_r3_r4(&file_key, file_id)?
    };

    Ok(EncryptionState {
        version: level.version(),
        revision,
        key_len_bytes,
        encrypt_metadata: true,
        permissions_raw,
        owner_value,
        user_value,
        file_key,
        crypt_filter: level.crypt_filter(),
    })
}

/// Encrypts every indirect object in `document` except the security handler's own object (spec
/// component 4.6).
pub fn encrypt_document(document: &mut Document, state: &EncryptionState) -> Result<()> {
    traverse_document(document, state, transform_object_encrypt)
}

/// Decrypts every indirect object in `document` except the security handler's own object.
pub fn decrypt_document(document: &mut Document, state: &EncryptionState) -> Result<()> {
    traverse_document(document, state, transform_object_decrypt)
}

fn traverse_document(
    document: &mut Document,
    state: &EncryptionState,
    transform: fn(&EncryptionState, ObjectId, &mut Object) -> Result<()>,
) -> Result<()> {
    let exempt = document.encrypt_object_id();
    let ids: Vec<ObjectId> = document.objects.keys().copied().collect();
    debug!("traversing {} indirect objects (exempt: {:?})", ids.len(), exempt);
    for id in ids {
        if Some(id) == exempt {
            debug!("skipping {:?}: the security handler's own object", id);
            continue;
        }
        if let Some(obj) = document.get_object_mut(id) {
            trace!("visiting object {:?}", id);
            transform(state, id, obj)?;
        }
    }
    Ok(())
}

/// `/Type /XRef` dictionaries (and the streams carrying them) are exempt from encryption.
fn is_xref(dict: &Dictionary) -> bool {
    dict.get_type() == Some(b"XRef")
}

fn transform_object_encrypt(state: &EncryptionState, obj_id: ObjectId, obj: &mut Object) -> Result<()> {
    transform_object(state, obj_id, obj, true)
}

fn transform_object_decrypt(state: &EncryptionState, obj_id: ObjectId, obj: &mut Object) -> Result<()> {
    transform_object(state, obj_id, obj, false)
}

fn transform_object(state: &EncryptionState, obj_id: ObjectId, obj: &mut Object, encrypting: bool) -> Result<()> {
    match obj {
        Object::Dictionary(dict) => {
            if is_xref(dict) {
                return Ok(());
            }
            for (_, value) in dict.iter_mut() {
                transform_object(state, obj_id, value, encrypting)?;
            }
            Ok(())
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                transform_object(state, obj_id, item, encrypting)?;
            }
            Ok(())
        }
        Object::Stream(stream) => {
            if is_xref(&stream.dict) {
                debug!("skipping {:?}: /Type /XRef is exempt from encryption", obj_id);
                return Ok(());
            }
            for (_, value) in stream.dict.iter_mut() {
                transform_object(state, obj_id, value, encrypting)?;
            }
            if !stream.content.is_empty() {
                let key = state.crypt_filter.compute_key(&state.file_key, obj_id)?;
                stream.content = if encrypting {
                    state.crypt_filter.encrypt(&key, &stream.content)?
                } else {
                    state.crypt_filter.decrypt(&key, &stream.content)?
                };
            }
            Ok(())
        }
        Object::String(content, _) => {
            if !content.is_empty() {
                let key = state.crypt_filter.compute_key(&state.file_key, obj_id)?;
                *content = if encrypting {
                    state.crypt_filter.encrypt(&key, content)?
                } else {
                    state.crypt_filter.decrypt(&key, content)?
                };
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
