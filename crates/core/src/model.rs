//! Domain models for the read-only API.
//!
//! These are the entities the crawler extracts from fussball.de markup and
//! the shapes the HTTP API serves. The aggregate [`ClubOverview`] is the
//! denormalized view of one club and all its nested sub-entities, suitable
//! for serving a single rich response without further fetching.

use serde::{Deserialize, Serialize};

/// A single club in the search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubSearchResult {
    /// The unique ID of the club on fussball.de.
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub city: String,
}

/// A single team of a club.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// The unique ID of the team on fussball.de.
    pub id: String,
    pub name: String,
    /// URL of the team's page on fussball.de, as found in the markup.
    pub url: String,
}

/// A single row in a league table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    pub place: u32,
    pub team: String,
    pub img: String,
    pub games: u32,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    /// Goal ratio as displayed, e.g. "50:25".
    pub goal: String,
    pub goal_difference: i32,
    pub points: i32,
    #[serde(default)]
    pub is_promotion: bool,
    #[serde(default)]
    pub is_relegation: bool,
}

/// A league table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub entries: Vec<TableEntry>,
}

/// A single event in a match course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Minute of the event as displayed, e.g. "43’" or "90+1’".
    pub time: String,
    /// Event kind: "goal", "yellow-card", "red-card", "substitution", "unknown".
    #[serde(rename = "type")]
    pub kind: String,
    /// "home" or "away".
    pub team: String,
    pub description: Option<String>,
    /// Score at that point in the match, if displayed.
    pub score: Option<String>,
}

/// A single game.
///
/// Scores are strings because the site renders them through obfuscation
/// fonts; decoding can legitimately produce partial values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub datetime_utc: chrono::DateTime<chrono::Utc>,
    pub competition: String,
    pub age_group: Option<String>,
    pub home_team: String,
    pub home_logo: String,
    pub away_team: String,
    pub away_logo: String,
    /// Status as displayed, e.g. "Abgesagt" or "Verlegt".
    pub status: Option<String>,
    pub home_score: Option<String>,
    pub away_score: Option<String>,
    pub location: Option<String>,
    pub location_url: Option<String>,
    #[serde(default)]
    pub match_events: Vec<MatchEvent>,
}

/// Combined club info: teams plus club-level game lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubInfo {
    pub teams: Vec<Team>,
    pub prev_games: Vec<Game>,
    pub next_games: Vec<Game>,
}

/// Combined team info: league table plus game lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInfo {
    pub table: Option<Table>,
    pub prev_games: Vec<Game>,
    pub next_games: Vec<Game>,
}

/// A team with its detailed information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamWithDetails {
    pub id: String,
    pub name: String,
    pub url: String,
    pub table: Option<Table>,
    #[serde(default)]
    pub prev_games: Vec<Game>,
    #[serde(default)]
    pub next_games: Vec<Game>,
}

impl TeamWithDetails {
    /// The bare [`Team`] fields, without table or game lists.
    pub fn team(&self) -> Team {
        Team { id: self.id.clone(), name: self.name.clone(), url: self.url.clone() }
    }
}

/// The full denormalized result for one club: club-level game lists plus all
/// teams with their details.
///
/// Replaced wholesale on each successful prewarm cycle, never partially
/// updated. At most one club's overview is retained in durable storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubOverview {
    pub club_prev_games: Vec<Game>,
    pub club_next_games: Vec<Game>,
    pub teams: Vec<TeamWithDetails>,
}
