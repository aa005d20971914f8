//! League-table crawling and parsing.

use scraper::{ElementRef, Html, Selector};

use super::{Crawler, clean_text, has_class, normalize_logo_url};
use spielplan_core::model::{Table, TableEntry};

impl Crawler {
    /// The league table for a team, or `None` when no table is available.
    pub async fn team_table(&self, team_id: &str) -> Option<Table> {
        tracing::debug!("attempting to get table for team {}", team_id);
        let url = format!("{}/ajax.team.table/-/team-id/{}", self.base_url, team_id);
        let Some(html) = self.fetch_text(&url, self.ttl.table).await else {
            tracing::warn!("request failed for {}; cannot fetch table for {}", url, team_id);
            return None;
        };
        if html.trim().is_empty() {
            tracing::info!("no table content available for team {}", team_id);
            return None;
        }

        let entries = parse_table_rows(&html, team_id);
        if entries.is_empty() {
            tracing::warn!("could not parse any table entries for team {}", team_id);
            return None;
        }

        tracing::info!("parsed {} table entries for team {}", entries.len(), team_id);
        Some(Table { entries })
    }
}

fn parse_table_rows(html: &str, team_id: &str) -> Vec<TableEntry> {
    let doc = Html::parse_document(html);
    let tr_sel = Selector::parse("tr").expect("invalid selector");
    let td_sel = Selector::parse("td").expect("invalid selector");
    let img_sel = Selector::parse("img").expect("invalid selector");
    let club_name_sel = Selector::parse(".club-name").expect("invalid selector");

    let mut entries = Vec::new();
    for row in doc.select(&tr_sel) {
        if has_class(&row, "thead") {
            continue;
        }
        let cols: Vec<_> = row.select(&td_sel).collect();
        if cols.len() < 10 {
            continue;
        }

        match parse_table_entry(&row, &cols, &img_sel, &club_name_sel) {
            Some(entry) => entries.push(entry),
            None => tracing::error!("error parsing table row for team {}", team_id),
        }
    }
    entries
}

fn parse_table_entry(
    row: &ElementRef<'_>,
    cols: &[ElementRef<'_>],
    img_sel: &Selector,
    club_name_sel: &Selector,
) -> Option<TableEntry> {
    let logo = cols[2]
        .select(img_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| {
            let url = if src.starts_with("//") { format!("https:{src}") } else { src.to_string() };
            normalize_logo_url(&url)
        })
        .unwrap_or_default();

    Some(TableEntry {
        place: clean_text(&cols[1]).replace('.', "").parse().ok()?,
        team: cols[2].select(club_name_sel).next().map(|el| clean_text(&el))?,
        img: logo,
        games: clean_text(&cols[3]).parse().ok()?,
        won: clean_text(&cols[4]).parse().ok()?,
        draw: clean_text(&cols[5]).parse().ok()?,
        lost: clean_text(&cols[6]).parse().ok()?,
        goal: clean_text(&cols[7]),
        goal_difference: clean_text(&cols[8]).parse().ok()?,
        points: clean_text(&cols[9]).parse().ok()?,
        is_promotion: has_class(row, "promotion"),
        is_relegation: has_class(row, "relegation"),
    })
}
