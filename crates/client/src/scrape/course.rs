//! Match-course crawling and parsing.
//!
//! Events carry obfuscated scores and sometimes obfuscated player names;
//! substitutions are resolved to real names via the players' profile pages.

use scraper::{Html, Selector};

use super::{Crawler, clean_text, has_class};
use crate::fonts::decode_fragment;
use spielplan_core::model::MatchEvent;

/// Event row data lifted out of the markup before any network or decode
/// work happens.
#[derive(Debug)]
struct RawEvent {
    team: String,
    time: Option<String>,
    score_html: Option<String>,
    yellow: bool,
    red: bool,
    substitution: bool,
    substitute_profiles: Vec<String>,
    player_profile: Option<String>,
    player_html: Option<String>,
}

impl Crawler {
    /// The detailed match course for a game.
    pub async fn match_course(&self, game_id: &str) -> Vec<MatchEvent> {
        let url = format!("{}/ajax.match.course/-/mode/PAGE/spiel/{}", self.base_url, game_id);
        let Some(html) = self.fetch_ok(&url, self.ttl.games).await else {
            tracing::warn!("failed to fetch match course for game {}", game_id);
            return Vec::new();
        };

        let raw_events = collect_event_rows(&html);

        let mut events = Vec::with_capacity(raw_events.len());
        for raw in raw_events {
            events.push(self.build_event(raw).await);
        }
        tracing::debug!("extracted {} match events for game {}", events.len(), game_id);
        events
    }

    async fn build_event(&self, raw: RawEvent) -> MatchEvent {
        let mut kind = "unknown";
        let mut score = None;
        let mut description: Option<String> = None;

        if let Some(html) = &raw.score_html {
            score = Some(decode_fragment(&self.fonts, html).await);
            kind = "goal";
        }

        if raw.yellow {
            kind = "yellow-card";
            description = Some("Gelbe Karte".into());
        }
        if raw.red {
            kind = "red-card";
            description = Some("Rote Karte".into());
        }

        if raw.substitution {
            kind = "substitution";
            description = Some("Auswechslung".into());

            let mut names = Vec::new();
            for href in &raw.substitute_profiles {
                if let Some(name) = self.player_name(&self.absolute(href)).await {
                    names.push(name);
                }
            }
            if names.len() == 2 {
                description = Some(format!("{} für {}", names[0], names[1]));
            } else if !names.is_empty() {
                description = Some(names.join(" / "));
            }
        }

        if description.is_none() {
            if let Some(href) = &raw.player_profile {
                description = self.player_name(&self.absolute(href)).await;
            } else if let Some(html) = &raw.player_html {
                let decoded = decode_fragment(&self.fonts, html).await;
                if !decoded.is_empty() {
                    description = Some(decoded);
                }
            }
        }

        MatchEvent {
            time: raw.time.unwrap_or_default(),
            kind: kind.to_string(),
            team: raw.team,
            description,
            score,
        }
    }

    /// A player's display name from their profile page.
    async fn player_name(&self, profile_url: &str) -> Option<String> {
        let Some(html) = self.fetch_ok(profile_url, self.ttl.games).await else {
            tracing::warn!("failed to fetch player profile: {}", profile_url);
            return None;
        };

        let doc = Html::parse_document(&html);
        let name_sel = Selector::parse("p.profile-name").expect("invalid selector");
        doc.select(&name_sel)
            .next()
            .map(|el| clean_text(&el))
            .filter(|name| !name.is_empty())
    }
}

fn collect_event_rows(html: &str) -> Vec<RawEvent> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse("#match_course_body .row-event").expect("invalid selector");
    let time_sel = Selector::parse(".column-time .valign-inner").expect("invalid selector");
    let event_sel = Selector::parse(".column-event").expect("invalid selector");
    let yellow_sel = Selector::parse(".icon-card.yellow-card").expect("invalid selector");
    let red_sel = Selector::parse(".icon-card.red-card").expect("invalid selector");
    let substitute_sel = Selector::parse(".icon-substitute").expect("invalid selector");
    let substitute_link_sel =
        Selector::parse(".column-player .substitute a[href]").expect("invalid selector");
    let player_sel = Selector::parse(".column-player").expect("invalid selector");
    let link_sel = Selector::parse("a[href]").expect("invalid selector");

    let mut rows = Vec::new();
    for row in doc.select(&row_sel) {
        let team = if has_class(&row, "event-left") { "home" } else { "away" };
        let player_cell = row.select(&player_sel).next();

        rows.push(RawEvent {
            team: team.to_string(),
            time: row.select(&time_sel).next().map(|el| clean_text(&el)),
            score_html: row.select(&event_sel).next().map(|el| el.inner_html()),
            yellow: row.select(&yellow_sel).next().is_some(),
            red: row.select(&red_sel).next().is_some(),
            substitution: row.select(&substitute_sel).next().is_some(),
            substitute_profiles: row
                .select(&substitute_link_sel)
                .filter_map(|a| a.value().attr("href"))
                .filter(|href| href.contains("spielerprofil"))
                .map(str::to_string)
                .collect(),
            player_profile: player_cell
                .and_then(|cell| cell.select(&link_sel).next())
                .and_then(|a| a.value().attr("href"))
                .filter(|href| href.contains("spielerprofil"))
                .map(str::to_string),
            player_html: player_cell.map(|cell| cell.inner_html()),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontMapping;
    use crate::testutil::{OFFLINE_BASE_URL, offline_crawler, seed};

    fn course_url(game_id: &str) -> String {
        format!("{OFFLINE_BASE_URL}/ajax.match.course/-/mode/PAGE/spiel/{game_id}")
    }

    #[tokio::test]
    async fn test_match_course_parses_goal_event() {
        let html = r#"
            <div id="match_course_body">
                <div class="row-event event-left">
                    <div class="column-time"><div class="valign-inner">16’</div></div>
                    <div class="column-event"><span class="even">1:0</span></div>
                    <div class="column-player">Spieler A</div>
                </div>
            </div>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        seed(&crawler.client, &course_url("testgame"), html).await;

        let events = crawler.match_course("testgame").await;
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.time, "16’");
        assert_eq!(event.kind, "goal");
        assert_eq!(event.team, "home");
        assert_eq!(event.score.as_deref(), Some("1:0"));
        assert!(event.description.as_deref().unwrap().contains("Spieler A"));
    }

    #[tokio::test]
    async fn test_match_course_obfuscated_player_name() {
        let html = format!(
            r#"
            <div id="match_course_body">
                <div class="row-event event-right">
                    <div class="column-time"><div class="valign-inner">10’</div></div>
                    <div class="column-player"><span data-obfuscation="font123">{}</span></div>
                </div>
            </div>
            "#,
            '\u{e100}'
        );
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        crawler
            .fonts
            .seed_mapping("font123", FontMapping::from([("e100".to_string(), "A".to_string())]))
            .await;
        seed(&crawler.client, &course_url("game123"), &html).await;

        let events = crawler.match_course("game123").await;
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.kind, "unknown");
        assert_eq!(event.team, "away");
        assert_eq!(event.description.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_match_course_cards() {
        let html = r#"
            <div id="match_course_body">
                <div class="row-event event-left">
                    <div class="column-time"><div class="valign-inner">33’</div></div>
                    <div class="column-event"><span class="icon-card yellow-card"></span></div>
                </div>
                <div class="row-event event-right">
                    <div class="column-time"><div class="valign-inner">78’</div></div>
                    <div class="column-event"><span class="icon-card red-card"></span></div>
                </div>
            </div>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        seed(&crawler.client, &course_url("cards"), html).await;

        let events = crawler.match_course("cards").await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "yellow-card");
        assert_eq!(events[0].description.as_deref(), Some("Gelbe Karte"));
        assert_eq!(events[1].kind, "red-card");
        assert_eq!(events[1].description.as_deref(), Some("Rote Karte"));
    }

    #[tokio::test]
    async fn test_match_course_substitution_names() {
        let html = r#"
            <div id="match_course_body">
                <div class="row-event event-left">
                    <div class="column-time"><div class="valign-inner">60’</div></div>
                    <div class="column-event"><span class="icon-substitute"></span></div>
                    <div class="column-player">
                        <div class="substitute">
                            <a href="/spielerprofil/-/player/p1">in</a>
                            <a href="/spielerprofil/-/player/p2">out</a>
                        </div>
                    </div>
                </div>
            </div>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        seed(&crawler.client, &course_url("subs"), html).await;
        seed(
            &crawler.client,
            &format!("{OFFLINE_BASE_URL}/spielerprofil/-/player/p1"),
            r#"<p class="profile-name">Max Muster</p>"#,
        )
        .await;
        seed(
            &crawler.client,
            &format!("{OFFLINE_BASE_URL}/spielerprofil/-/player/p2"),
            r#"<p class="profile-name">Erik Beispiel</p>"#,
        )
        .await;

        let events = crawler.match_course("subs").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "substitution");
        assert_eq!(events[0].description.as_deref(), Some("Max Muster für Erik Beispiel"));
    }

    #[tokio::test]
    async fn test_match_course_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        assert!(crawler.match_course("unseeded").await.is_empty());
    }
}
