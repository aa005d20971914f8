//! Club team-list crawling and parsing.

use scraper::{Html, Selector};

use super::{Crawler, clean_text, last_path_segment};
use spielplan_core::model::Team;

impl Crawler {
    /// All teams of a club.
    pub async fn club_teams(&self, club_id: &str) -> Vec<Team> {
        tracing::debug!("attempting to get teams for club {}", club_id);
        let url = format!("{}/ajax.club.teams/-/action/search/id/{}", self.base_url, club_id);
        let Some(html) = self.fetch_text(&url, self.ttl.teams).await else {
            tracing::warn!("request failed for {}; cannot fetch teams for {}", url, club_id);
            return Vec::new();
        };

        let teams = parse_teams(&html);
        tracing::info!("parsed {} teams for club {}", teams.len(), club_id);
        teams
    }
}

fn parse_teams(html: &str) -> Vec<Team> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("div.item h4 a").expect("invalid selector");

    let mut teams = Vec::new();
    for link in doc.select(&link_sel) {
        let Some(href) = link.value().attr("href") else { continue };
        let Some(id) = last_path_segment(href) else { continue };
        teams.push(Team { id, name: clean_text(&link), url: href.to_string() });
    }
    teams
}
