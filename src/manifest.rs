//! Pre-cache manifest handling
//!
//! The manifest is the fixed, ordered list of resources loaded into the
//! cache at install time. It is immutable for the lifetime of a generation;
//! shipping a different manifest requires bumping the generation identifier,
//! otherwise stale entries persist under the old cache key. The fingerprint
//! gives embedders a cheap way to notice that kind of drift.

use sha2::{Digest, Sha256};
use std::fmt;

/// Ordered list of resources to pre-cache for a generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheManifest {
    urls: Vec<String>,
}

impl PrecacheManifest {
    /// Build a manifest from an ordered list of resource URLs
    pub fn new(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    /// The manifest entries, in install order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Hex SHA-256 over the entry list.
    ///
    /// Same entries in the same order = same fingerprint. Entries are
    /// newline-delimited before hashing so that `["ab", "c"]` and
    /// `["a", "bc"]` do not collide.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for url in &self.urls {
            hasher.update(url.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for PrecacheManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entries ({})", self.urls.len(), &self.fingerprint()[..12])
    }
}
