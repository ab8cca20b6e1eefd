use thiserror::Error;

/// Failures specific to the Standard Security Handler's cryptographic machinery.
#[derive(Error, Debug)]
pub enum DecryptionError {
    #[error("encryption dictionary has an unsupported /Filter (must be /Standard)")]
    UnknownEncryption,

    #[error("encryption dictionary has an unsupported /V value (must be 1, 2, or 4)")]
    UnsupportedVersion,

    #[error("encryption dictionary has an unsupported /R value (must be 2, 3, or 4)")]
    UnsupportedRevision,

    #[error("crypt filter is not one of the supported CFM values (V2, AESV2) or AuthEvent is not DocOpen")]
    UnsupportedCryptFilter,

    #[error("/O must be exactly 32 bytes, found {0}")]
    InvalidOwnerValueLength(usize),

    #[error("/U must be exactly 32 bytes, found {0}")]
    InvalidUserValueLength(usize),

    #[error("/Length must be a multiple of 8 in range 40..=128, found {0}")]
    InvalidKeyLength(i64),

    #[error("document trailer is missing a usable /ID entry")]
    MissingFileId,

    #[error("encryption dictionary is missing required field /{0}")]
    MissingField(String),

    #[error("encryption dictionary field /{0} has the wrong object type")]
    WrongFieldType(&'static str),

    #[error("AES ciphertext is malformed: {0}")]
    MalformedCiphertext(&'static str),

    #[error("RC4 key must not be empty")]
    EmptyRc4Key,

    #[error("per-object key computation requires a non-empty file key")]
    EmptyFileKey,
}

/// Crate-level error type. Most callers only care whether something went wrong, not which
/// cryptographic subsystem raised it; `DecryptionError` is preserved via `#[from]` for callers
/// that do.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decryption(#[from] DecryptionError),
}

pub type Result<T> = std::result::Result<T, Error>;
