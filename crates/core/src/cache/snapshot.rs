//! Bounded cache snapshot persisted at shutdown and restored at startup.
//!
//! The snapshot is a JSON document with two top-level fields: a
//! URL → final-URL redirect map covering every current cache entry, and the
//! club overview for the configured prewarm target only. Arbitrary cache
//! entries are deliberately never embedded; the sidecar metadata records in
//! the content store carry the full entry state, so loading reconstructs
//! entries from redirect keys plus sidecars.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::cache::entry::CacheEntry;
use crate::cache::store::ContentStore;
use crate::model::ClubOverview;

/// Snapshot files above this size are deleted unread.
pub const SNAPSHOT_MAX_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    redirects: BTreeMap<String, String>,
    #[serde(default)]
    club_overviews: HashMap<String, ClubOverview>,
}

/// Caches reconstructed by [`load`].
#[derive(Debug, Default)]
pub struct RestoredCaches {
    pub entries: Vec<CacheEntry>,
    pub overview: Option<(String, ClubOverview)>,
}

/// Write the snapshot, flushed and forced to stable storage before
/// returning.
pub async fn save(
    path: &Path,
    entries: &[CacheEntry],
    overview: Option<(&str, &ClubOverview)>,
) -> Result<(), Error> {
    let mut snapshot = SnapshotFile::default();
    for entry in entries {
        snapshot.redirects.insert(entry.url.clone(), entry.final_url.clone());
    }
    if let Some((club_id, overview)) = overview {
        snapshot.club_overviews.insert(club_id.to_string(), overview.clone());
    }

    let json = serde_json::to_vec_pretty(&snapshot)?;
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&json).await?;
    file.flush().await?;
    file.sync_all().await?;

    tracing::info!("saved cache snapshot to {}", path.display());
    Ok(())
}

/// Restore the snapshot written by [`save`].
///
/// A snapshot file exceeding [`SNAPSHOT_MAX_BYTES`] is deleted unread. Each
/// redirect entry is reconstructed from its sidecar metadata record; entries
/// whose sidecar is missing are silently dropped, and a sidecar that fails
/// to parse is logged and skipped without aborting the rest. The club
/// overview is restored only for the configured prewarm target; without a
/// target, loaded aggregate state is discarded.
pub async fn load(
    path: &Path,
    store: &ContentStore,
    prewarm_target: Option<&str>,
) -> Result<RestoredCaches, Error> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RestoredCaches::default());
        }
        Err(err) => return Err(err.into()),
    };

    if meta.len() > SNAPSHOT_MAX_BYTES {
        tracing::warn!(
            "cache snapshot {} exceeds {} bytes ({}); deleting",
            path.display(),
            SNAPSHOT_MAX_BYTES,
            meta.len()
        );
        let _ = tokio::fs::remove_file(path).await;
        return Ok(RestoredCaches::default());
    }

    let json = tokio::fs::read(path).await?;
    let mut snapshot: SnapshotFile = serde_json::from_slice(&json)?;

    let mut entries = Vec::new();
    for url in snapshot.redirects.keys() {
        match store.meta(url).await {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(err) => tracing::error!("failed to restore cache entry for {}: {}", url, err),
        }
    }

    let overview = match prewarm_target {
        Some(target) => snapshot
            .club_overviews
            .remove(target)
            .map(|overview| (target.to_string(), overview)),
        None => {
            if !snapshot.club_overviews.is_empty() {
                tracing::info!("no prewarm target configured; discarding persisted club overviews");
            }
            None
        }
    };

    Ok(RestoredCaches { entries, overview })
}
