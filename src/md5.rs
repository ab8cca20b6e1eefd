//! Incremental MD5 digest primitive (spec component 4.1).
//!
//! Thin wrapper over the `md-5` crate giving the `init / update / finalize / reset` vocabulary
//! used throughout the key-derivation algorithms, plus a one-shot helper for the common case of
//! hashing a single buffer.

use md5::Digest;

/// A 16-byte MD5 digest.
pub type Md5Digest = [u8; 16];

/// Incremental MD5 hasher.
#[derive(Clone, Default)]
pub struct Md5Hasher(md5::Md5);

impl Md5Hasher {
    /// Starts a fresh hash with no input consumed yet.
    pub fn new() -> Self {
        Self(md5::Md5::new())
    }

    /// Feeds another chunk of bytes into the running hash.
    pub fn update(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.0.update(data);
        self
    }

    /// Consumes the hasher and returns the 16-byte digest.
    pub fn finalize(self) -> Md5Digest {
        self.0.finalize().into()
    }

    /// Resets the hasher to its initial state, discarding any consumed input, so it can be
    /// reused for an unrelated hash.
    pub fn reset(&mut self) {
        self.0 = md5::Md5::new();
    }
}

/// One-shot MD5 of a single buffer.
pub fn md5(data: impl AsRef<[u8]>) -> Md5Digest {
    Md5Hasher::new().update(data).finalize()
}
