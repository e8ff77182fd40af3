//! Strong type definitions for the Recipe Kernel.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Blake3Hash;

/// A content identifier.
///
/// For blobs written by the kernel this is the lowercase hex Blake3 digest of
/// the exact bytes, so identical content always yields the identical id.
/// Chunk ids produced by an external chunker are opaque text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier of a blob from its bytes.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(Blake3Hash::hash(bytes).to_hex())
    }

    /// Interpret this id as a Blake3 digest, if it is one.
    pub fn as_blake3(&self) -> Option<Blake3Hash> {
        Blake3Hash::from_hex(&self.0).ok()
    }

    /// Get the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Ids are opaque text, so cut on a char boundary.
        let short = self
            .0
            .char_indices()
            .nth(16)
            .map_or(&self.0[..], |(end, _)| &self.0[..end]);
        write!(f, "ContentId({})", short)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Blake3Hash> for ContentId {
    fn from(hash: Blake3Hash) -> Self {
        Self(hash.to_hex())
    }
}
