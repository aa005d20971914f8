//! URL-addressed storage key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a source URL.
///
/// Bodies and sidecar metadata are keyed by the source URL, not the content:
/// repeated fetches of the same URL reuse the same storage slot.
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
