//! Decoding of obfuscated text inside parsed HTML fragments.
//!
//! Two decoders with deliberately different handling of unmapped glyphs,
//! matching the site's observed behavior:
//!
//! - [`decode_span`] (strict): unmapped characters are dropped.
//! - [`decode_fragment`] (compound): unmapped characters pass through as
//!   their original character.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};

use super::{FontMapper, FontMapping};

/// Attribute carrying the font identifier on obfuscated spans.
pub const OBFUSCATION_ATTR: &str = "data-obfuscation";

/// Strict decode of a single span fragment.
///
/// Returns the trimmed raw text when the span carries no obfuscation marker
/// or its mapping is empty; otherwise decodes character by character,
/// dropping anything unmapped. `None` when the fragment has no span or no
/// text.
pub async fn decode_span(mapper: &FontMapper, html: &str) -> Option<String> {
    let (raw, font_id) = {
        let doc = Html::parse_fragment(html);
        let selector = Selector::parse("span").expect("invalid selector");
        let span = doc.select(&selector).next()?;
        let raw = span.text().collect::<String>().trim().to_string();
        (raw, span.value().attr(OBFUSCATION_ATTR).map(str::to_string))
    };
    if raw.is_empty() {
        return None;
    }
    let Some(font_id) = font_id else {
        return Some(raw);
    };

    let mapping = mapper.map_for(&font_id).await;
    if mapping.is_empty() {
        return Some(raw);
    }
    Some(decode_strict(&raw, &mapping))
}

/// Compound decode of a parent fragment containing obfuscated spans plus
/// ordinary text.
///
/// Each distinct font mapping is fetched at most once. The fragment is then
/// walked in document order: obfuscated spans are replaced by their decoded
/// text and their children are not re-walked (that would emit the raw glyph
/// text next to its decoded form); ordinary text nodes contribute their
/// trimmed text unless they consist entirely of Private Use Area code
/// points.
pub async fn decode_fragment(mapper: &FontMapper, html: &str) -> String {
    let fonts = fragment_fonts(html);

    let mut mappings: HashMap<String, Arc<FontMapping>> = HashMap::new();
    for font_id in fonts {
        let mapping = mapper.map_for(&font_id).await;
        mappings.insert(font_id, mapping);
    }

    decode_with(html, &mappings)
}

/// Distinct font identifiers referenced by a fragment.
fn fragment_fonts(html: &str) -> HashSet<String> {
    let doc = Html::parse_fragment(html);
    let selector = Selector::parse("span[data-obfuscation]").expect("invalid selector");
    doc.select(&selector)
        .filter_map(|span| span.value().attr(OBFUSCATION_ATTR))
        .map(str::to_string)
        .collect()
}

/// Document-order walk with preloaded mappings.
fn decode_with(html: &str, mappings: &HashMap<String, Arc<FontMapping>>) -> String {
    let doc = Html::parse_fragment(html);
    let mut parts: Vec<String> = Vec::new();
    emit(*doc.root_element(), mappings, &mut parts);
    parts.concat().trim().to_string()
}

fn emit(node: NodeRef<'_, Node>, mappings: &HashMap<String, Arc<FontMapping>>, parts: &mut Vec<String>) {
    match node.value() {
        Node::Element(element) => {
            if element.name() == "span"
                && let Some(font_id) = element.attr(OBFUSCATION_ATTR)
            {
                let text = collect_text(node);
                let decoded = match mappings.get(font_id) {
                    Some(mapping) => decode_lenient(&text, mapping),
                    None => text,
                };
                parts.push(decoded);
                return;
            }
            for child in node.children() {
                emit(child, mappings, parts);
            }
        }
        Node::Text(text) => {
            let trimmed = text.text.trim();
            if !trimmed.is_empty() && !is_private_use_only(trimmed) {
                parts.push(trimmed.to_string());
            }
        }
        _ => {
            for child in node.children() {
                emit(child, mappings, parts);
            }
        }
    }
}

/// All text under a node, unstripped, in document order.
fn collect_text(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        if let Node::Text(text) = descendant.value() {
            out.push_str(&text.text);
        }
    }
    out
}

/// Strict per-character decode: lowercase hex lookup, then uppercased;
/// unmapped and placeholder characters are dropped.
fn decode_strict(text: &str, mapping: &FontMapping) -> String {
    let mut decoded = String::new();
    for ch in text.chars() {
        let hex = format!("{:x}", ch as u32);
        let value = match mapping.get(&hex).filter(|v| !v.is_empty()) {
            Some(value) => Some(value),
            None => mapping.get(&hex.to_uppercase()).filter(|v| !v.is_empty()),
        };
        if let Some(value) = value {
            decoded.push_str(value);
        }
    }
    decoded
}

/// Lenient per-character decode: unmapped characters pass through verbatim,
/// placeholder mappings erase their character.
fn decode_lenient(text: &str, mapping: &FontMapping) -> String {
    text.chars()
        .map(|ch| {
            let hex = format!("{:x}", ch as u32);
            match mapping.get(&hex) {
                Some(value) => value.clone(),
                None => ch.to_string(),
            }
        })
        .collect()
}

fn is_private_use_only(text: &str) -> bool {
    text.chars().all(|c| ('\u{E000}'..='\u{F8FF}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::offline_client;
    use std::time::Duration;

    fn mapper(dir: &std::path::Path) -> FontMapper {
        FontMapper::new(offline_client(dir), "http://127.0.0.1:9", Duration::from_secs(86_400))
    }

    fn score_mapping() -> FontMapping {
        FontMapping::from([
            ("e001".to_string(), "1".to_string()),
            ("e002".to_string(), "2".to_string()),
        ])
    }

    #[tokio::test]
    async fn test_decode_span_plain() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = decode_span(&mapper(dir.path()), "<span>Hello</span>").await;
        assert_eq!(decoded.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_decode_span_empty_mapping_returns_raw() {
        let dir = tempfile::tempdir().unwrap();
        // the font cannot be fetched, so the mapping stays empty and the
        // visible text comes back unchanged
        let decoded =
            decode_span(&mapper(dir.path()), r#"<span data-obfuscation="fontX">X</span>"#).await;
        assert_eq!(decoded.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn test_decode_span_strict_drops_unmapped() {
        let dir = tempfile::tempdir().unwrap();
        let m = mapper(dir.path());
        m.seed_mapping("score-font", score_mapping()).await;

        let html = format!(r#"<span data-obfuscation="score-font">{}{}{}</span>"#, '\u{e001}', '\u{e003}', '\u{e002}');
        let decoded = decode_span(&m, &html).await;
        assert_eq!(decoded.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_decode_span_uppercase_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let m = mapper(dir.path());
        m.seed_mapping("score-font", FontMapping::from([("E001".to_string(), "7".to_string())]))
            .await;

        let html = format!(r#"<span data-obfuscation="score-font">{}</span>"#, '\u{e001}');
        let decoded = decode_span(&m, &html).await;
        assert_eq!(decoded.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_decode_span_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = decode_span(&mapper(dir.path()), "<span></span>").await;
        assert!(decoded.is_none());
    }

    #[tokio::test]
    async fn test_decode_fragment_preserves_document_order() {
        let dir = tempfile::tempdir().unwrap();
        let m = mapper(dir.path());
        m.seed_mapping("font-a", FontMapping::from([("e001".to_string(), "1".to_string())]))
            .await;
        m.seed_mapping("font-b", FontMapping::from([("e002".to_string(), "2".to_string())]))
            .await;

        let html = format!(
            r#"<div>before <span data-obfuscation="font-a">{}</span>:<span data-obfuscation="font-b">{}</span> after</div>"#,
            '\u{e001}', '\u{e002}'
        );
        let decoded = decode_fragment(&m, &html).await;
        assert_eq!(decoded, "before1:2after");
    }

    #[tokio::test]
    async fn test_decode_fragment_score_cell() {
        let dir = tempfile::tempdir().unwrap();
        let m = mapper(dir.path());
        m.seed_mapping("score-font-123", score_mapping()).await;

        let html = format!(
            concat!(
                r#"<a href="/spiel/123"></a>"#,
                r#"<span data-obfuscation="score-font-123" class="score-left">{}</span>"#,
                r#"<span class="score-seperator">:</span>"#,
                r#"<span data-obfuscation="score-font-123" class="score-right">{}</span>"#
            ),
            '\u{e001}', '\u{e002}'
        );
        let decoded = decode_fragment(&m, &html).await;
        assert_eq!(decoded, "1:2");
    }

    #[tokio::test]
    async fn test_decode_fragment_unmapped_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let m = mapper(dir.path());
        m.seed_mapping("score-font", score_mapping()).await;

        // compound decode keeps unmapped characters, unlike the strict
        // single-span decode
        let html = format!(r#"<div><span data-obfuscation="score-font">A{}</span></div>"#, '\u{e001}');
        let decoded = decode_fragment(&m, &html).await;
        assert_eq!(decoded, "A1");
    }

    #[tokio::test]
    async fn test_decode_fragment_skips_private_use_text_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let m = mapper(dir.path());

        let html = format!("<div>visible<i>{}</i></div>", '\u{e050}');
        let decoded = decode_fragment(&m, &html).await;
        assert_eq!(decoded, "visible");
    }

    #[tokio::test]
    async fn test_decode_fragment_does_not_rewalk_span_children() {
        let dir = tempfile::tempdir().unwrap();
        let m = mapper(dir.path());
        m.seed_mapping("score-font", score_mapping()).await;

        let html = format!(
            r#"<div><span data-obfuscation="score-font"><i>{}</i></span></div>"#,
            '\u{e001}'
        );
        let decoded = decode_fragment(&m, &html).await;
        assert_eq!(decoded, "1");
    }

    #[test]
    fn test_fragment_fonts_dedup() {
        let html = concat!(
            r#"<div><span data-obfuscation="f1">a</span>"#,
            r#"<span data-obfuscation="f1">b</span>"#,
            r#"<span data-obfuscation="f2">c</span></div>"#
        );
        let fonts = fragment_fonts(html);
        assert_eq!(fonts.len(), 2);
        assert!(fonts.contains("f1"));
        assert!(fonts.contains("f2"));
    }
}
