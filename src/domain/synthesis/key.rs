//! Content-addressed cache keys
//!
//! A key is the SHA-256 of the request's language and text. The same pair
//! always maps to the same key across process restarts, so the on-disk cache
//! stays valid between runs.

use sha2::{Digest, Sha256};
use std::fmt;

/// ASCII unit separator, placed between the two fields
const FIELD_SEPARATOR: u8 = 0x1f;

/// Deterministic identifier of a `(text, language)` synthesis request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of the hex-encoded digest
    pub const LEN: usize = 64;

    /// Derive the key for a request.
    ///
    /// The language is length-prefixed, so no text/language split of the same
    /// bytes can produce the same digest input.
    pub fn derive(text: &str, language: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((language.len() as u64).to_le_bytes());
        hasher.update(language.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a key received from outside the process (e.g. a URL segment).
    ///
    /// Only exactly 64 lowercase hex characters are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == Self::LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
