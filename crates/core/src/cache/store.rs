//! On-disk content store for fetched bodies and sidecar metadata.
//!
//! One `{hash}.bin` body file per successful fetch and one
//! `{hash}_metadata.json` sidecar per cached URL, where the hash is derived
//! from the source URL. Sidecars let the cache be reconstructed at startup
//! without replaying the snapshot's embedded fields.

use std::path::{Path, PathBuf};

use crate::Error;
use crate::cache::entry::CacheEntry;
use crate::cache::hash::url_hash;

/// Body and sidecar storage rooted at the configured cache directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    /// Open the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a body blob, returning the content-store reference.
    pub async fn put_body(&self, hash: &str, bytes: &[u8]) -> Result<String, Error> {
        tokio::fs::write(self.body_path(hash), bytes).await?;
        Ok(hash.to_string())
    }

    /// Load a body blob.
    ///
    /// Returns `None` when the blob is missing or unreadable, never a silent
    /// empty success: callers distinguish "no body expected" (error entries)
    /// from "body expected but gone" via the entry's body reference.
    pub async fn body(&self, body_ref: &str) -> Option<Vec<u8>> {
        match tokio::fs::read(self.body_path(body_ref)).await {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!("failed to read cached body {}: {}", body_ref, err);
                None
            }
        }
    }

    /// Write the sidecar metadata record for an entry.
    pub async fn put_meta(&self, entry: &CacheEntry) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(entry)?;
        tokio::fs::write(self.meta_path(&url_hash(&entry.url)), json).await?;
        Ok(())
    }

    /// Load the sidecar metadata record for a URL.
    ///
    /// Returns `Ok(None)` when no sidecar exists; an unreadable or malformed
    /// sidecar is an error the caller logs and skips.
    pub async fn meta(&self, url: &str) -> Result<Option<CacheEntry>, Error> {
        let path = self.meta_path(&url_hash(url));
        let json = match tokio::fs::read(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let entry: CacheEntry = serde_json::from_slice(&json)?;
        Ok(Some(entry))
    }

    fn body_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.bin"))
    }

    fn meta_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}_metadata.json"))
    }
}
