//! On-demand assembly of the full club overview.

use futures::future::join_all;

use super::Crawler;
use spielplan_core::model::{ClubOverview, TeamWithDetails};

impl Crawler {
    /// The full denormalized overview for one club: club-level game lists
    /// plus per-team table and games.
    ///
    /// Sub-fetches run concurrently and may complete in any order; assembly
    /// waits for all of them behind a join barrier.
    pub async fn club_overview(&self, club_id: &str) -> ClubOverview {
        let teams = self.club_teams(club_id).await;

        let details = teams.iter().map(|team| async {
            let (table, next_games, prev_games) = tokio::join!(
                self.team_table(&team.id),
                self.team_next_games(&team.id),
                self.team_prev_games(&team.id),
            );
            TeamWithDetails {
                id: team.id.clone(),
                name: team.name.clone(),
                url: team.url.clone(),
                table,
                prev_games,
                next_games,
            }
        });

        let (club_next_games, club_prev_games, teams) = tokio::join!(
            self.club_next_games(club_id),
            self.club_prev_games(club_id),
            join_all(details),
        );

        ClubOverview { club_prev_games, club_next_games, teams }
    }
}
