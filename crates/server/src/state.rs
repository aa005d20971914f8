//! Shared application state and cache lifecycle.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use spielplan_client::{CachedClient, Crawler};
use spielplan_core::cache::snapshot;
use spielplan_core::model::{ClubOverview, Game, TeamWithDetails};
use spielplan_core::AppConfig;

/// Name of the durable snapshot file inside the cache directory.
const SNAPSHOT_FILE: &str = "spielplan_cache.json";

/// Shared state handed to every request handler and the prewarm loop.
///
/// The overview map is written only by the prewarm loop (for the configured
/// club) and by snapshot restore; handlers read it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: Arc<CachedClient>,
    pub crawler: Arc<Crawler>,
    overviews: Arc<RwLock<HashMap<String, ClubOverview>>>,
}

impl AppState {
    pub fn new(config: AppConfig, client: Arc<CachedClient>, crawler: Arc<Crawler>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            crawler,
            overviews: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.config.cache_dir.join(SNAPSHOT_FILE)
    }

    /// Restore the HTTP cache and the prewarmed overview from the snapshot
    /// file, if present. Failures are logged and never fatal.
    pub async fn load_caches(&self) {
        let path = self.snapshot_path();
        match snapshot::load(&path, self.client.store(), self.config.prewarm_club_id.as_deref())
            .await
        {
            Ok(restored) => {
                let count = restored.entries.len();
                self.client.restore_entries(restored.entries).await;
                if let Some((club_id, overview)) = restored.overview {
                    tracing::info!("restored prewarmed overview for club {}", club_id);
                    self.overviews.write().await.insert(club_id, overview);
                }
                tracing::info!("restored {} cache entries from snapshot", count);
            }
            Err(err) => tracing::error!("failed to load caches: {}", err),
        }
    }

    /// Persist the redirect map and the prewarm target's overview. Failures
    /// are logged and never fatal.
    pub async fn save_caches(&self) {
        let entries = self.client.snapshot_entries().await;
        let overviews = self.overviews.read().await;
        let target = self
            .config
            .prewarm_club_id
            .as_deref()
            .and_then(|club_id| overviews.get(club_id).map(|overview| (club_id, overview)));

        if let Err(err) = snapshot::save(&self.snapshot_path(), &entries, target).await {
            tracing::error!("failed to save caches: {}", err);
        }
    }

    pub async fn overview(&self, club_id: &str) -> Option<ClubOverview> {
        self.overviews.read().await.get(club_id).cloned()
    }

    /// Atomically replace the retained overview for a club.
    pub async fn set_overview(&self, club_id: &str, overview: ClubOverview) {
        self.overviews.write().await.insert(club_id.to_string(), overview);
    }

    /// Search the prewarmed overviews for a team.
    pub async fn find_team(&self, team_id: &str) -> Option<TeamWithDetails> {
        let overviews = self.overviews.read().await;
        overviews
            .values()
            .flat_map(|overview| overview.teams.iter())
            .find(|team| team.id == team_id)
            .cloned()
    }

    /// Search the prewarmed overviews for a game, club-level lists first.
    pub async fn find_game(&self, game_id: &str) -> Option<Game> {
        let overviews = self.overviews.read().await;
        for overview in overviews.values() {
            if let Some(game) = overview
                .club_next_games
                .iter()
                .chain(overview.club_prev_games.iter())
                .find(|game| game.id == game_id)
            {
                return Some(game.clone());
            }
            for team in &overview.teams {
                if let Some(game) = team
                    .next_games
                    .iter()
                    .chain(team.prev_games.iter())
                    .find(|game| game.id == game_id)
                {
                    return Some(game.clone());
                }
            }
        }
        None
    }
}
