//! Periodic cache pre-warming for one configured club.
//!
//! An infinite loop: fetch the club's team list, fan out one fetch task per
//! data facet per team behind a counting semaphore, assemble the club
//! overview from whatever succeeded, and sleep until the next cycle. The
//! loop never stops itself; every failure is logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::state::AppState;
use spielplan_core::model::{ClubOverview, TeamWithDetails};

/// Upper bound on concurrent prewarm fetches, so the remote site is never
/// hit with unbounded parallel requests.
const PREWARM_CONCURRENCY: usize = 5;

/// Run the pre-warming loop forever.
pub async fn run(state: AppState, club_id: String) {
    let interval = Duration::from_secs(state.config.prewarm_interval_secs);
    tracing::info!(
        "starting cache pre-warming for club {} with an interval of {}s",
        club_id,
        interval.as_secs()
    );

    loop {
        // a crashing cycle must never take the loop down with it
        let cycle_state = state.clone();
        let cycle_club = club_id.clone();
        let cycle = tokio::spawn(async move { run_cycle(&cycle_state, &cycle_club).await });
        if let Err(err) = cycle.await {
            tracing::error!("unexpected error in the pre-warming cycle: {}", err);
        }
        tokio::time::sleep(interval).await;
    }
}

/// One pre-warming cycle. A failing facet never aborts the cycle; the
/// overview is assembled from whatever succeeded.
async fn run_cycle(state: &AppState, club_id: &str) {
    tracing::info!("running pre-warming cycle for club {}", club_id);

    let teams = state.crawler.club_teams(club_id).await;
    if teams.is_empty() {
        tracing::warn!("pre-warming: could not fetch teams for club {}", club_id);
        return;
    }

    let semaphore = Arc::new(Semaphore::new(PREWARM_CONCURRENCY));

    let club_next = {
        let crawler = Arc::clone(&state.crawler);
        let id = club_id.to_string();
        limited(&semaphore, async move { crawler.club_next_games(&id).await })
    };
    let club_prev = {
        let crawler = Arc::clone(&state.crawler);
        let id = club_id.to_string();
        limited(&semaphore, async move { crawler.club_prev_games(&id).await })
    };

    let mut team_tasks = Vec::with_capacity(teams.len());
    for team in &teams {
        let next = {
            let crawler = Arc::clone(&state.crawler);
            let id = team.id.clone();
            limited(&semaphore, async move { crawler.team_next_games(&id).await })
        };
        let prev = {
            let crawler = Arc::clone(&state.crawler);
            let id = team.id.clone();
            limited(&semaphore, async move { crawler.team_prev_games(&id).await })
        };
        let table = {
            let crawler = Arc::clone(&state.crawler);
            let id = team.id.clone();
            limited(&semaphore, async move { crawler.team_table(&id).await })
        };
        team_tasks.push((next, prev, table));
    }

    // join barrier: every facet completes before assembly
    let club_next_games = join_or_default(club_next).await;
    let club_prev_games = join_or_default(club_prev).await;

    let mut teams_with_details = Vec::with_capacity(teams.len());
    for (team, (next, prev, table)) in teams.iter().zip(team_tasks) {
        teams_with_details.push(TeamWithDetails {
            id: team.id.clone(),
            name: team.name.clone(),
            url: team.url.clone(),
            table: join_or_default(table).await,
            next_games: join_or_default(next).await,
            prev_games: join_or_default(prev).await,
        });
    }

    let overview = ClubOverview { club_prev_games, club_next_games, teams: teams_with_details };
    state.set_overview(club_id, overview).await;

    tracing::info!("pre-warming cycle for club {} completed", club_id);
}

/// Spawn a future gated by the semaphore.
fn limited<T: Send + 'static>(
    semaphore: &Arc<Semaphore>,
    future: impl Future<Output = T> + Send + 'static,
) -> JoinHandle<T> {
    let semaphore = Arc::clone(semaphore);
    tokio::spawn(async move {
        let _permit = semaphore.acquire_owned().await.ok();
        future.await
    })
}

/// Await a task, falling back to the default value when it failed.
async fn join_or_default<T: Default>(handle: JoinHandle<T>) -> T {
    match handle.await {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("pre-warming task failed: {}", err);
            T::default()
        }
    }
}
