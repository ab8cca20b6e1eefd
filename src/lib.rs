#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(clippy::all)]

mod aes_cbc;
mod document;
pub mod encryption;
mod error;
mod md5;
mod object;
mod rc4;

pub use crate::document::Document;
pub use crate::encryption::{prepare_encryption, validate, Permissions, SecurityLevel, ValidationOutcome};
pub use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};

pub use error::{DecryptionError, Error, Result};
