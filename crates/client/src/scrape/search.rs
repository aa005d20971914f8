//! Club search crawling and parsing.

use scraper::{Html, Selector};

use super::{Crawler, clean_text, last_path_segment, normalize_logo_url};
use spielplan_core::model::ClubSearchResult;

impl Crawler {
    /// Search clubs by name.
    pub async fn search_clubs(&self, query: &str) -> Vec<ClubSearchResult> {
        tracing::debug!("searching for clubs with query '{}'", query);
        let encoded = urlencoding::encode(query);
        let url = format!("{}/suche/-/text/{}/restriction/CLUB_AND_TEAM", self.base_url, encoded);

        let Some(html) = self.fetch_text(&url, self.ttl.games).await else {
            tracing::warn!("request failed for club search with query '{}'", query);
            return Vec::new();
        };

        let clubs = parse_club_search(&html);
        tracing::info!("found {} clubs for query '{}'", clubs.len(), query);
        clubs
    }
}

fn parse_club_search(html: &str) -> Vec<ClubSearchResult> {
    let doc = Html::parse_document(html);
    let list_sel = Selector::parse("div#clublist").expect("invalid selector");
    let item_sel = Selector::parse("li").expect("invalid selector");
    let link_sel = Selector::parse("a").expect("invalid selector");
    let img_sel = Selector::parse("img").expect("invalid selector");
    let name_sel = Selector::parse("p.name").expect("invalid selector");
    let sub_sel = Selector::parse("p.sub").expect("invalid selector");

    let Some(list) = doc.select(&list_sel).next() else {
        tracing::info!("no club list in search results");
        return Vec::new();
    };

    let mut clubs = Vec::new();
    for item in list.select(&item_sel) {
        let Some(link) = item.select(&link_sel).next() else { continue };
        let Some(href) = link.value().attr("href") else { continue };
        let Some(id) = last_path_segment(href) else { continue };

        let logo_url = link
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| {
                let url =
                    if src.starts_with("//") { format!("https:{src}") } else { src.to_string() };
                normalize_logo_url(&url)
            })
            .unwrap_or_default();

        let name = link
            .select(&name_sel)
            .next()
            .map(|el| clean_text(&el))
            .unwrap_or_else(|| "Unknown Club".to_string());
        let city = link
            .select(&sub_sel)
            .next()
            .map(|el| clean_text(&el).replace('\u{a0}', " "))
            .unwrap_or_default();

        clubs.push(ClubSearchResult { id, name, logo_url, city });
    }
    clubs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{OFFLINE_BASE_URL, offline_crawler, seed};

    const CLUB_SEARCH_HTML: &str = r#"
        <div id="clublist">
            <ul>
                <li>
                    <a href="/verein/test-club-e-v/001VTR8D8C000000VARTQG41VT4929AS">
                        <img src="//media.fussball.de/club-logo.png">
                        <p class="name">Test Club e.V.</p>
                        <p class="sub">12345&nbsp;Teststadt</p>
                    </a>
                </li>
                <li>
                    <a><!-- incomplete link, should be skipped --></a>
                </li>
            </ul>
        </div>
    "#;

    fn search_url(query: &str) -> String {
        format!("{OFFLINE_BASE_URL}/suche/-/text/{query}/restriction/CLUB_AND_TEAM")
    }

    #[tokio::test]
    async fn test_search_clubs() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        seed(&crawler.client, &search_url("test"), CLUB_SEARCH_HTML).await;

        let clubs = crawler.search_clubs("test").await;
        assert_eq!(clubs.len(), 1);

        let club = &clubs[0];
        assert_eq!(club.id, "001VTR8D8C000000VARTQG41VT4929AS");
        assert_eq!(club.name, "Test Club e.V.");
        assert_eq!(club.logo_url, "https://media.fussball.de/club-logo.png");
        assert_eq!(club.city, "12345 Teststadt");
    }

    #[tokio::test]
    async fn test_search_clubs_escapes_query() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        seed(&crawler.client, &search_url("T%C3%BCrkg%C3%BCc%C3%BC"), CLUB_SEARCH_HTML).await;

        let clubs = crawler.search_clubs("Türkgücü").await;
        assert_eq!(clubs.len(), 1);
    }

    #[tokio::test]
    async fn test_search_clubs_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = offline_crawler(dir.path());
        seed(&crawler.client, &search_url("abc"), "<html></html>").await;
        assert!(crawler.search_clubs("abc").await.is_empty());
    }
}
