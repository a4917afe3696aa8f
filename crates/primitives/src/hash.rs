//! SHA-256 based hashing used throughout the protocol.
//!
//! Multi-field hashes are computed over the plain concatenation of their fields. Integers are
//! encoded big-endian at their full width and booleans as a single byte, so every field has a
//! fixed size and the concatenation is unambiguous.

use digest::Digest;
use sha2::Sha256;

use crate::buf::Buf32;

/// Hashes a single byte string.
pub fn raw(data: &[u8]) -> Buf32 {
    Buf32::new(Sha256::digest(data).into())
}

/// Hashes the concatenation of two buffers, `H(a, b)`.
pub fn hash_pair(a: &Buf32, b: &Buf32) -> Buf32 {
    Hasher::new().buf32(a).buf32(b).finish()
}

/// Incremental builder for multi-field hashes.
#[derive(Clone, Debug, Default)]
pub struct Hasher {
    inner: Sha256,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buf32(mut self, v: &Buf32) -> Self {
        self.inner.update(v.as_slice());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.inner.update(v.to_be_bytes());
        self
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.inner.update([v]);
        self
    }

    pub fn bool(self, v: bool) -> Self {
        self.u8(v as u8)
    }

    pub fn finish(self) -> Buf32 {
        Buf32::new(self.inner.finalize().into())
    }
}
