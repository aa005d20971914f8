//! Game-list crawling and parsing.
//!
//! The club and team game lists share one markup shape: `visible-small`
//! header rows carry date, kickoff time, age group, and competition for the
//! game rows that follow them. Scores are rendered through obfuscation
//! fonts and decoded via the font mapper.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use scraper::{ElementRef, Html, Selector};

use super::{Crawler, clean_text, has_class, last_path_segment, normalize_logo_url};
use crate::fonts::decode_fragment;
use spielplan_core::model::Game;

/// One parsed `visible-small` header row, applied to the game rows that
/// follow it.
#[derive(Debug, Clone)]
struct DateContext {
    datetime_utc: DateTime<Utc>,
    competition: String,
    age_group: Option<String>,
}

/// Game row data lifted out of the list markup before any network or
/// decode work happens.
#[derive(Debug)]
struct RawGameRow {
    context: DateContext,
    home_team: String,
    home_logo: String,
    away_team: String,
    away_logo: String,
    details_href: Option<String>,
    game_id: Option<String>,
    status: Option<String>,
    score_html: String,
}

impl Crawler {
    /// Upcoming games for all teams of a club.
    pub async fn club_next_games(&self, club_id: &str) -> Vec<Game> {
        let url = format!("{}/ajax.club.next.games/-/id/{}/mode/PAGE", self.base_url, club_id);
        self.game_list(&url, &format!("club_next_games:{club_id}")).await
    }

    /// Past games for all teams of a club.
    pub async fn club_prev_games(&self, club_id: &str) -> Vec<Game> {
        let url = format!("{}/ajax.club.prev.games/-/id/{}/mode/PAGE", self.base_url, club_id);
        self.game_list(&url, &format!("club_prev_games:{club_id}")).await
    }

    /// Upcoming games for a team.
    pub async fn team_next_games(&self, team_id: &str) -> Vec<Game> {
        let url = format!("{}/ajax.team.next.games/-/mode/PAGE/team-id/{}", self.base_url, team_id);
        self.game_list(&url, &format!("team_next_games:{team_id}")).await
    }

    /// Past games for a team.
    pub async fn team_prev_games(&self, team_id: &str) -> Vec<Game> {
        let url = format!("{}/ajax.team.prev.games/-/mode/PAGE/team-id/{}", self.base_url, team_id);
        self.game_list(&url, &format!("team_prev_games:{team_id}")).await
    }

    async fn game_list(&self, url: &str, label: &str) -> Vec<Game> {
        tracing::debug!("fetching games from {}", url);
        let Some(html) = self.fetch_text(url, self.ttl.games).await else {
            tracing::warn!("request failed for {}; cannot fetch games for {}", url, label);
            return Vec::new();
        };
        if html.trim().is_empty() {
            tracing::info!("no game content available for {}", url);
            return Vec::new();
        }

        let rows = collect_game_rows(&html, label);

        let mut games = Vec::with_capacity(rows.len());
        for row in rows {
            games.push(self.build_game(row).await);
        }
        tracing::info!("parsed {} games for {}", games.len(), label);
        games
    }

    /// Finish a raw row: fetch the detail page for the location, decode the
    /// score, and attach the match course.
    async fn build_game(&self, row: RawGameRow) -> Game {
        let mut location = None;
        let mut location_url = None;
        if let Some(href) = &row.details_href {
            let details_url = self.absolute(href);
            tracing::debug!("fetching game details from {}", details_url);
            match self.client.get(&details_url, self.ttl.games).await {
                Some(response) if response.status == 200 => {
                    (location, location_url) = parse_game_location(&response.text());
                }
                Some(response) => tracing::warn!(
                    "failed to fetch game details from {}, status: {}",
                    details_url,
                    response.status
                ),
                None => tracing::warn!("request for game details failed for {}", details_url),
            }
        }

        let decoded_score = decode_fragment(&self.fonts, &row.score_html).await;
        let (home_score, away_score) = split_score(&decoded_score);

        let match_events = match &row.game_id {
            Some(game_id) => self.match_course(game_id).await,
            None => Vec::new(),
        };

        // deterministic composite ID when the row carries no details link
        let id = row.game_id.clone().unwrap_or_else(|| {
            format!(
                "{}_{}_vs_{}",
                row.context.datetime_utc.to_rfc3339(),
                row.home_team,
                row.away_team
            )
        });

        Game {
            id,
            datetime_utc: row.context.datetime_utc,
            competition: row.context.competition,
            age_group: row.context.age_group,
            home_team: row.home_team,
            home_logo: row.home_logo,
            away_team: row.away_team,
            away_logo: row.away_logo,
            status: row.status,
            home_score,
            away_score,
            location,
            location_url,
            match_events,
        }
    }
}

fn collect_game_rows(html: &str, label: &str) -> Vec<RawGameRow> {
    let doc = Html::parse_document(html);
    let tr_sel = Selector::parse("tr").expect("invalid selector");
    let td_sel = Selector::parse("td").expect("invalid selector");
    let score_sel = Selector::parse("td.column-score").expect("invalid selector");
    let club_left_sel = Selector::parse("td.column-club-left").expect("invalid selector");
    let club_right_sel = Selector::parse("td.column-club-right").expect("invalid selector");
    let club_any_sel = Selector::parse("td.column-club").expect("invalid selector");
    let club_name_sel = Selector::parse(".club-name").expect("invalid selector");
    let logo_sel = Selector::parse("span[data-responsive-image]").expect("invalid selector");
    let link_sel = Selector::parse("a[href]").expect("invalid selector");
    let status_sel = Selector::parse("span.info-text").expect("invalid selector");

    let mut rows = Vec::new();
    let mut current: Option<DateContext> = None;

    for row in doc.select(&tr_sel) {
        if has_class(&row, "visible-small") {
            let Some(info_cell) = row.select(&td_sel).next() else { continue };
            let info_text = clean_text(&info_cell);
            current = parse_date_row(&info_text);
            if current.is_none() {
                tracing::warn!("could not parse date/time/competition row: '{}'", info_text);
            }
            continue;
        }

        let Some(score_cell) = row.select(&score_sel).next() else { continue };
        let Some(context) = current.clone() else { continue };

        // past-game rows use a different cell layout than upcoming ones
        let cells = match (row.select(&club_left_sel).next(), row.select(&club_right_sel).next()) {
            (Some(home), Some(away)) => Some((home, away)),
            _ => {
                let club_cells: Vec<_> = row.select(&club_any_sel).collect();
                if club_cells.len() == 2 { Some((club_cells[0], club_cells[1])) } else { None }
            }
        };
        let Some((home_cell, away_cell)) = cells else {
            tracing::warn!("could not find home/away team cells for {}; skipping row", label);
            continue;
        };

        let home_team = home_cell.select(&club_name_sel).next().map(|el| clean_text(&el));
        let away_team = away_cell.select(&club_name_sel).next().map(|el| clean_text(&el));
        let (Some(home_team), Some(away_team)) = (home_team, away_team) else {
            tracing::error!("error parsing game row for {}: missing club name", label);
            continue;
        };

        let details_href = score_cell
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);
        let game_id = details_href.as_deref().and_then(last_path_segment);

        let status = score_cell.select(&status_sel).next().map(|el| clean_text(&el));

        rows.push(RawGameRow {
            context,
            home_team,
            home_logo: logo_url(&home_cell, &logo_sel),
            away_team,
            away_logo: logo_url(&away_cell, &logo_sel),
            details_href,
            game_id,
            status,
            score_html: score_cell.inner_html(),
        });
    }
    rows
}

/// Parse a header row like
/// `"Sa, 25.05.2024 - 15:30 Uhr | Herren | Kreisliga A"`.
///
/// The three-field form carries age group and competition, the two-field
/// form competition only. Kickoff times are naive local German times.
fn parse_date_row(info_text: &str) -> Option<DateContext> {
    let (date_part, rest) = info_text.split_once(" - ")?;
    let (_, date) = date_part.split_once(", ")?;

    let fields: Vec<&str> = rest.split(" | ").collect();
    let time = fields.first()?.replace(" Uhr", "").trim().to_string();

    let naive = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%d.%m.%Y %H:%M").ok()?;
    let local = match Berlin.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => return None,
    };
    let datetime_utc = local.with_timezone(&Utc);

    let (age_group, competition) = match fields.len() {
        3 => (Some(fields[1].trim().to_string()), fields[2].trim().to_string()),
        2 => (None, fields[1].trim().to_string()),
        _ => return None,
    };

    Some(DateContext { datetime_utc, competition, age_group })
}

fn logo_url(cell: &ElementRef<'_>, selector: &Selector) -> String {
    let Some(span) = cell.select(selector).next() else {
        return String::new();
    };
    let Some(value) = span.value().attr("data-responsive-image") else {
        return String::new();
    };
    let url = if value.starts_with("//") { format!("https:{value}") } else { value.to_string() };
    normalize_logo_url(&url)
}

/// Location and maps link from a game detail page.
fn parse_game_location(html: &str) -> (Option<String>, Option<String>) {
    let doc = Html::parse_document(html);
    let stage_sel = Selector::parse("section#stage").expect("invalid selector");
    let location_sel = Selector::parse("a.location").expect("invalid selector");

    let Some(stage) = doc.select(&stage_sel).next() else {
        return (None, None);
    };
    let Some(link) = stage.select(&location_sel).next() else {
        return (None, None);
    };

    let location_url = link.value().attr("href").map(str::to_string);
    let location = clean_text(&link).replace("Rasenplatz, ", "");
    tracing::debug!("found location: {}", location);
    (Some(location), location_url)
}

/// Split a decoded score like "1:2" into home and away halves; anything
/// without a separator yields no scores.
pub(crate) fn split_score(decoded: &str) -> (Option<String>, Option<String>) {
    let Some((home, away)) = decoded.split_once(':') else {
        return (None, None);
    };
    let clean = |part: &str| {
        let part = part.trim();
        if part.is_empty() { None } else { Some(part.to_string()) }
    };
    (clean(home), clean(away))
}
