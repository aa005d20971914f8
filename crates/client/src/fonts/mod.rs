//! Score-font deobfuscation.
//!
//! fussball.de defeats naive scraping by rendering scores (and sometimes
//! player names) through rotating custom web fonts whose glyphs live in the
//! Unicode Private Use Area. The engine downloads the font asset through the
//! HTTP cache, reads its character map and glyph names, and builds a
//! code-point → digit mapping cached per font identifier with its own long
//! TTL.

pub mod decode;

pub use decode::{decode_fragment, decode_span};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::fetch::CachedClient;
use spielplan_core::Error;

/// Mapping from lowercase hex code point to decoded text: a digit, the
/// score separator, or an empty placeholder for bare PUA glyphs.
pub type FontMapping = HashMap<String, String>;

/// Semantic glyph names the site uses for score digits. "hyphen" is the
/// separator between home and away score.
const DIGIT_GLYPH_NAMES: [(&str, &str); 11] = [
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("hyphen", ":"),
];

/// Cached font mapping with fetch timestamp.
struct CachedMapping {
    mapping: Arc<FontMapping>,
    fetched_at: Instant,
}

/// Builds and caches deobfuscation mappings per font identifier.
///
/// Mappings are immutable after construction. Failures yield an empty
/// mapping so callers can fall back to the raw text.
pub struct FontMapper {
    client: Arc<CachedClient>,
    base_url: String,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedMapping>>,
}

impl FontMapper {
    pub fn new(client: Arc<CachedClient>, base_url: impl Into<String>, ttl: Duration) -> Self {
        Self { client, base_url: base_url.into(), ttl, cache: Mutex::new(HashMap::new()) }
    }

    /// Retrieve or build the mapping for a font identifier.
    ///
    /// On a miss the font asset is fetched through the HTTP cache (font TTL
    /// class) and parsed; a fetch or parse failure returns an empty mapping
    /// without caching it, so a later cycle can recover.
    pub async fn map_for(&self, font_id: &str) -> Arc<FontMapping> {
        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(font_id)
                && cached.fetched_at.elapsed() < self.ttl
            {
                tracing::debug!("font mapping cache hit for {}", font_id);
                return Arc::clone(&cached.mapping);
            }
        }

        tracing::info!("font mapping cache miss for {}, fetching font", font_id);
        let url = format!(
            "{}/export.fontface/-/format/ttf/id/{}/type/font",
            self.base_url, font_id
        );

        let mapping = match self.client.get(&url, self.ttl).await {
            Some(response) if response.status == 200 => {
                match parse_glyph_table(&response.body) {
                    Ok(mapping) => mapping,
                    Err(err) => {
                        tracing::error!("error parsing font file {}: {}", font_id, err);
                        return Arc::new(FontMapping::new());
                    }
                }
            }
            _ => {
                tracing::error!("failed to download font file: {}", font_id);
                return Arc::new(FontMapping::new());
            }
        };

        let mapping = Arc::new(mapping);
        let mut cache = self.cache.lock().await;
        cache.insert(
            font_id.to_string(),
            CachedMapping { mapping: Arc::clone(&mapping), fetched_at: Instant::now() },
        );
        tracing::info!("created and cached font mapping for: {}", font_id);
        mapping
    }

    #[cfg(test)]
    pub(crate) async fn seed_mapping(&self, font_id: &str, mapping: FontMapping) {
        self.cache.lock().await.insert(
            font_id.to_string(),
            CachedMapping { mapping: Arc::new(mapping), fetched_at: Instant::now() },
        );
    }
}

/// Parse a font's character map table into a deobfuscation mapping.
fn parse_glyph_table(data: &[u8]) -> Result<FontMapping, Error> {
    let face = ttf_parser::Face::parse(data, 0).map_err(|e| Error::FontParse(e.to_string()))?;
    let cmap = face
        .tables()
        .cmap
        .ok_or_else(|| Error::FontParse("no cmap table found".into()))?;

    let mut mapping = FontMapping::new();
    for subtable in cmap.subtables {
        if !subtable.is_unicode() {
            continue;
        }
        subtable.codepoints(|code| {
            if let Some(glyph) = subtable.glyph_index(code)
                && let Some(name) = face.glyph_name(glyph)
            {
                map_glyph(code, name, &mut mapping);
            }
        });
    }
    Ok(mapping)
}

/// Map one (code point, glyph name) pair into the mapping.
///
/// Known digit names map to their digit; "uniE675"-style names mark PUA
/// glyphs that are present but carry no digit value; anything else is left
/// unmapped.
fn map_glyph(code: u32, name: &str, mapping: &mut FontMapping) {
    let hex = format!("{:x}", code);
    if let Some((_, digit)) = DIGIT_GLYPH_NAMES.iter().find(|(glyph_name, _)| *glyph_name == name) {
        mapping.insert(hex, (*digit).to_string());
    } else if name.len() > 3 && name[..3].eq_ignore_ascii_case("uni") {
        mapping.entry(hex).or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::offline_client;

    #[test]
    fn test_map_glyph_known_names() {
        let mut mapping = FontMapping::new();
        map_glyph(0x61, "one", &mut mapping);
        map_glyph(0x62, "two", &mut mapping);
        map_glyph(0x3A, "hyphen", &mut mapping);
        map_glyph(0x99, "unknown", &mut mapping);

        let expected: FontMapping = [
            ("61".to_string(), "1".to_string()),
            ("62".to_string(), "2".to_string()),
            ("3a".to_string(), ":".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(mapping, expected);
    }

    #[test]
    fn test_map_glyph_private_use_area() {
        let mut mapping = FontMapping::new();
        map_glyph(0xE675, "uniE675", &mut mapping);
        assert_eq!(mapping.get("e675").map(String::as_str), Some(""));

        // an existing digit mapping is not clobbered by a PUA name
        map_glyph(0xE675, "one", &mut mapping);
        map_glyph(0xE675, "uniE675", &mut mapping);
        assert_eq!(mapping.get("e675").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_map_glyph_bare_uni_prefix() {
        let mut mapping = FontMapping::new();
        map_glyph(0xE675, "uni", &mut mapping);
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_parse_glyph_table_rejects_garbage() {
        assert!(parse_glyph_table(b"not a font").is_err());
    }

    #[tokio::test]
    async fn test_map_for_failure_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        let mapper =
            FontMapper::new(client, "http://127.0.0.1:9", Duration::from_secs(86_400));

        let mapping = mapper.map_for("bad-font").await;
        assert!(mapping.is_empty());
    }

    #[tokio::test]
    async fn test_map_for_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        let mapper =
            FontMapper::new(client, "http://127.0.0.1:9", Duration::from_secs(86_400));

        mapper
            .seed_mapping("cached-font", FontMapping::from([("61".to_string(), "1".to_string())]))
            .await;

        let mapping = mapper.map_for("cached-font").await;
        assert_eq!(mapping.get("61").map(String::as_str), Some("1"));
    }
}
