//! Single-game detail crawling and parsing.

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};

use super::games::split_score;
use super::{Crawler, clean_text, normalize_logo_url};
use crate::fonts::decode_fragment;
use spielplan_core::model::Game;

/// Stage-section data lifted out of the detail page before any decode work
/// happens.
#[derive(Debug)]
struct RawGameDetails {
    location: Option<String>,
    location_url: Option<String>,
    home_team: String,
    home_logo: String,
    away_team: String,
    away_logo: String,
    status: Option<String>,
    result_html: Option<String>,
}

impl Crawler {
    /// Details and match events for a single game, or `None` when the page
    /// cannot be fetched or parsed.
    pub async fn game_by_id(&self, game_id: &str) -> Option<Game> {
        let url = format!("{}/spiel/-/spiel/{}", self.base_url, game_id);
        let Some(html) = self.fetch_ok(&url, self.ttl.games).await else {
            tracing::error!("failed to fetch game details for game {}", game_id);
            return None;
        };

        let details = parse_game_details(&html, game_id)?;

        let (home_score, away_score) = match &details.result_html {
            Some(result_html) => {
                let decoded = decode_fragment(&self.fonts, result_html).await;
                split_score(&decoded)
            }
            None => (None, None),
        };

        let match_events = self.match_course(game_id).await;

        Some(Game {
            id: game_id.to_string(),
            // the detail page carries no kickoff information
            datetime_utc: Utc::now(),
            competition: "Unknown".to_string(),
            age_group: None,
            home_team: details.home_team,
            home_logo: details.home_logo,
            away_team: details.away_team,
            away_logo: details.away_logo,
            status: details.status,
            home_score,
            away_score,
            location: details.location,
            location_url: details.location_url,
            match_events,
        })
    }
}

fn parse_game_details(html: &str, game_id: &str) -> Option<RawGameDetails> {
    let doc = Html::parse_document(html);
    let stage_sel = Selector::parse("section#stage").expect("invalid selector");
    let location_sel = Selector::parse("a.location").expect("invalid selector");
    let home_sel = Selector::parse("div.team-left, div.team-home").expect("invalid selector");
    let away_sel = Selector::parse("div.team-right, div.team-away").expect("invalid selector");
    let name_sel = Selector::parse("div.team-name").expect("invalid selector");
    let status_sel = Selector::parse("span.info-text").expect("invalid selector");
    let result_sel = Selector::parse("div.result").expect("invalid selector");

    let Some(stage) = doc.select(&stage_sel).next() else {
        tracing::warn!("no stage section found for game {}", game_id);
        return None;
    };

    let mut location = None;
    let mut location_url = None;
    if let Some(link) = stage.select(&location_sel).next() {
        location = Some(clean_text(&link).replace("Rasenplatz, ", ""));
        location_url = link.value().attr("href").map(str::to_string);
    }

    let (Some(home_div), Some(away_div)) =
        (stage.select(&home_sel).next(), stage.select(&away_sel).next())
    else {
        tracing::warn!("could not parse team information for game {}", game_id);
        return None;
    };

    let team_name = |div: &ElementRef<'_>| {
        div.select(&name_sel).next().map(|el| clean_text(&el)).unwrap_or_else(|| clean_text(div))
    };

    Some(RawGameDetails {
        location,
        location_url,
        home_team: team_name(&home_div),
        home_logo: detail_logo(&home_div),
        away_team: team_name(&away_div),
        away_logo: detail_logo(&away_div),
        status: stage.select(&status_sel).next().map(|el| clean_text(&el)),
        result_html: stage.select(&result_sel).next().map(|el| el.inner_html()),
    })
}

/// Logos appear either as responsive-image spans or plain img tags.
fn detail_logo(div: &ElementRef<'_>) -> String {
    let span_sel = Selector::parse("span[data-responsive-image]").expect("invalid selector");
    let img_sel = Selector::parse("img").expect("invalid selector");

    if let Some(span) = div.select(&span_sel).next()
        && let Some(value) = span.value().attr("data-responsive-image")
    {
        return normalize_logo_url(&format!("https:{value}"));
    }
    if let Some(img) = div.select(&img_sel).next()
        && let Some(src) = img.value().attr("src")
    {
        let url = if src.starts_with("//") { format!("https:{src}") } else { src.to_string() };
        return normalize_logo_url(&url);
    }
    String::new()
}
