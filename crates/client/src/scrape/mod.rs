//! Site-specific adapters for fussball.de markup.
//!
//! Everything in here is brittle by nature: the selectors track one site's
//! markup and degrade to empty results when it shifts. A parse failure of
//! one unit (a game row, a table row) is logged and skips that unit, never
//! the whole list.

pub mod course;
pub mod game;
pub mod games;
pub mod overview;
pub mod search;
pub mod table;
pub mod teams;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use scraper::ElementRef;

use crate::fetch::CachedClient;
use crate::fonts::FontMapper;
use spielplan_core::TtlConfig;

pub const FUSSBALL_DE_BASE_URL: &str = "https://www.fussball.de";

static LOGO_FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"format/\d+").expect("invalid regex"));

/// Normalize a logo URL so the format segment is pinned to `format/9`,
/// keeping file sizes small and rendering consistent.
pub fn normalize_logo_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    LOGO_FORMAT_RE.replace_all(url, "format/9").to_string()
}

/// Crawls fussball.de through the cached client and deobfuscates scores via
/// the font mapper. All dependencies are constructor-injected; there is no
/// process-wide state.
pub struct Crawler {
    pub(crate) client: Arc<CachedClient>,
    pub(crate) fonts: FontMapper,
    pub(crate) ttl: TtlConfig,
    pub(crate) base_url: String,
}

impl Crawler {
    pub fn new(client: Arc<CachedClient>, ttl: TtlConfig) -> Self {
        Self::with_base_url(client, ttl, FUSSBALL_DE_BASE_URL)
    }

    /// Like [`new`](Self::new) with an explicit site base URL.
    pub fn with_base_url(
        client: Arc<CachedClient>,
        ttl: TtlConfig,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let fonts = FontMapper::new(Arc::clone(&client), base_url.clone(), ttl.font);
        Self { client, fonts, ttl, base_url }
    }

    /// Resolve a site-relative or protocol-relative href.
    pub(crate) fn absolute(&self, href: &str) -> String {
        if href.starts_with("//") {
            format!("https:{href}")
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            href.to_string()
        }
    }

    /// Fetch a URL's body as text regardless of status. Negative entries
    /// yield an empty body, which parsers treat as "no content".
    pub(crate) async fn fetch_text(&self, url: &str, ttl: Duration) -> Option<String> {
        let response = self.client.get(url, ttl).await?;
        Some(response.text())
    }

    /// Fetch a URL's body as text, requiring a 200.
    pub(crate) async fn fetch_ok(&self, url: &str, ttl: Duration) -> Option<String> {
        let response = self.client.get(url, ttl).await?;
        if response.status != 200 {
            tracing::warn!("unexpected status {} for {}", response.status, url);
            return None;
        }
        Some(response.text())
    }
}

/// All text under an element, each segment trimmed, concatenated.
pub(crate) fn clean_text(element: &ElementRef<'_>) -> String {
    element.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

pub(crate) fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// The trailing path segment of an href, which is where the site keeps its
/// entity IDs.
pub(crate) fn last_path_segment(href: &str) -> Option<String> {
    href.trim_matches('/')
        .rsplit('/')
        .next()
        .map(str::to_string)
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_logo_url() {
        assert_eq!(
            normalize_logo_url("https://media.fussball.de/logo/format/2/foo.png"),
            "https://media.fussball.de/logo/format/9/foo.png"
        );
        assert_eq!(normalize_logo_url("https://media.fussball.de/plain.png"), "https://media.fussball.de/plain.png");
        assert_eq!(normalize_logo_url(""), "");
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(
            last_path_segment("/verein/test-club/001VTR8D8C000000VARTQG41VT4929AS").as_deref(),
            Some("001VTR8D8C000000VARTQG41VT4929AS")
        );
        assert_eq!(last_path_segment("/spiel/123/").as_deref(), Some("123"));
        assert_eq!(last_path_segment(""), None);
    }

    #[test]
    fn test_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = crate::testutil::offline_crawler(dir.path());
        assert_eq!(crawler.absolute("/spiel/123"), "http://127.0.0.1:9/spiel/123");
        assert_eq!(crawler.absolute("//media.fussball.de/x.png"), "https://media.fussball.de/x.png");
        assert_eq!(crawler.absolute("https://example.com/x"), "https://example.com/x");
    }
}
