//! Cache entry metadata and the bounded in-memory entry map.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conditional-request validators supplied by the remote server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Validators {
    /// Whether a metadata probe's validators prove the resource unchanged.
    ///
    /// A match on either validator is sufficient; absent validators on
    /// either side never match.
    pub fn matches_probe(&self, etag: Option<&str>, last_modified: Option<&str>) -> bool {
        let etag_match = matches!((self.etag.as_deref(), etag), (Some(a), Some(b)) if a == b);
        let modified_match =
            matches!((self.last_modified.as_deref(), last_modified), (Some(a), Some(b)) if a == b);
        etag_match || modified_match
    }
}

/// The cached state of one URL.
///
/// Header keys are stored lowercased. The body is never held inline; `body`
/// is a content-store reference, set only for status codes below 400.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The originally requested URL; also the cache key.
    pub url: String,
    /// Effective URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub validators: Validators,
    /// Entry is fresh while `now < expires_at`.
    pub expires_at: DateTime<Utc>,
    /// Content-store reference for the persisted body, if any.
    pub body: Option<String>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether this is a negatively cached error response.
    pub fn is_negative(&self) -> bool {
        self.status >= 400
    }

    /// Extend the expiry after a successful revalidation.
    ///
    /// Monotonic: a concurrent fresher write is never moved backwards by a
    /// conditional-probe no-op.
    pub fn extend_to(&mut self, until: DateTime<Utc>) {
        if until > self.expires_at {
            self.expires_at = until;
        }
    }
}

/// Bounded in-memory map from URL to [`CacheEntry`].
///
/// The size cap is a safety valve with least-recently-used eviction; TTL
/// freshness is the primary expiry mechanism. Stale entries are kept around
/// on purpose: they hold the validators needed for revalidation.
#[derive(Debug)]
pub struct EntryCache {
    entries: HashMap<String, CacheEntry>,
    recency: VecDeque<String>,
    max_entries: usize,
}

impl EntryCache {
    pub fn new(max_entries: usize) -> Self {
        Self { entries: HashMap::new(), recency: VecDeque::new(), max_entries }
    }

    /// Look up an entry, refreshing its recency.
    pub fn get(&mut self, url: &str) -> Option<&CacheEntry> {
        if !self.entries.contains_key(url) {
            return None;
        }
        self.touch(url);
        self.entries.get(url)
    }

    /// Insert or overwrite an entry, evicting the least recently used
    /// entries once the bound is exceeded.
    pub fn insert(&mut self, entry: CacheEntry) {
        let url = entry.url.clone();
        if self.entries.insert(url.clone(), entry).is_none() {
            self.recency.push_back(url);
        } else {
            self.touch(&url);
        }

        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.recency.pop_front() else { break };
            self.entries.remove(&oldest);
        }
    }

    /// Extend an entry's expiry monotonically. Returns false when the URL is
    /// not cached.
    pub fn extend_expiry(&mut self, url: &str, until: DateTime<Utc>) -> bool {
        match self.entries.get_mut(url) {
            Some(entry) => {
                entry.extend_to(until);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn touch(&mut self, url: &str) {
        if let Some(pos) = self.recency.iter().position(|u| u == url) {
            self.recency.remove(pos);
        }
        self.recency.push_back(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_entry(url: &str, expires_in_secs: i64) -> CacheEntry {
        CacheEntry {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            headers: HashMap::new(),
            validators: Validators::default(),
            expires_at: Utc::now() + Duration::seconds(expires_in_secs),
            body: Some("abc".into()),
        }
    }

    #[test]
    fn test_freshness() {
        let now = Utc::now();
        assert!(make_entry("u", 60).is_fresh(now));
        assert!(!make_entry("u", -60).is_fresh(now));
    }

    #[test]
    fn test_extend_is_monotonic() {
        let mut entry = make_entry("u", 600);
        let original = entry.expires_at;
        entry.extend_to(original - Duration::seconds(300));
        assert_eq!(entry.expires_at, original);
        entry.extend_to(original + Duration::seconds(300));
        assert_eq!(entry.expires_at, original + Duration::seconds(300));
    }

    #[test]
    fn test_negative_entry() {
        let mut entry = make_entry("u", 60);
        entry.status = 404;
        entry.body = None;
        assert!(entry.is_negative());
        assert!(!make_entry("u", 60).is_negative());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = EntryCache::new(2);
        cache.insert(make_entry("a", 60));
        cache.insert(make_entry("b", 60));
        cache.insert(make_entry("c", 60));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = EntryCache::new(2);
        cache.insert(make_entry("a", 60));
        cache.insert(make_entry("b", 60));
        cache.get("a");
        cache.insert(make_entry("c", 60));
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_insert_overwrites_same_url() {
        let mut cache = EntryCache::new(2);
        cache.insert(make_entry("a", 60));
        let mut updated = make_entry("a", 120);
        updated.status = 304;
        cache.insert(updated);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().status, 304);
    }

    #[test]
    fn test_extend_expiry_missing_url() {
        let mut cache = EntryCache::new(2);
        assert!(!cache.extend_expiry("nope", Utc::now()));
    }

    #[test]
    fn test_validators_match() {
        let validators = Validators { etag: Some("\"v1\"".into()), last_modified: None };
        assert!(validators.matches_probe(Some("\"v1\""), None));
        assert!(!validators.matches_probe(Some("\"v2\""), None));
        assert!(!validators.matches_probe(None, Some("Mon, 01 Jan 2024 00:00:00 GMT")));
        assert!(!Validators::default().matches_probe(None, None));
    }
}
