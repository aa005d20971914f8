//! Transparent cache-enabled HTTP fetch pipeline.
//!
//! ### Fetch-or-revalidate
//! - Fresh entries are served from the content store without touching the
//!   network.
//! - Stale entries are probed with a cheap HEAD request first; matching
//!   validators extend the TTL without a full re-download.
//! - Full requests carry `If-None-Match` / `If-Modified-Since` built from
//!   stored validators; a 304 counts as a successful revalidation.
//!
//! ### Negative caching
//! - Responses with status >= 400 are cached bodyless with a short TTL
//!   (at most 5 minutes) to avoid hammering a failing endpoint.
//!
//! The cache key is always the originally requested URL; the post-redirect
//! URL is recorded as `final_url` on the entry.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use reqwest::{Method, StatusCode, header};
use tokio::sync::Mutex;

use spielplan_core::{CacheEntry, ContentStore, EntryCache, Error, Validators, url_hash};

/// Negative entries live at most this long.
const NEGATIVE_TTL_CAP: Duration = Duration::from_secs(300);

/// Configuration for the cached fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "spielplan/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Maximum number of in-memory cache entries (default: 1024)
    pub max_entries: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "spielplan/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            max_entries: 1024,
        }
    }
}

/// Response from a cached fetch, already decompressed.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The effective URL after redirects.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers with lowercased keys.
    pub headers: HashMap<String, String>,
    /// Response body bytes; empty for negative entries.
    pub body: Bytes,
}

impl FetchResponse {
    /// The body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// HTTP client with a transparent fetch-or-revalidate cache in front.
pub struct CachedClient {
    http: reqwest::Client,
    cache: Mutex<EntryCache>,
    store: ContentStore,
}

impl CachedClient {
    /// Create a new cached client over the given content store.
    pub fn new(config: FetchConfig, store: ContentStore) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, cache: Mutex::new(EntryCache::new(config.max_entries)), store })
    }

    /// Cache-enabled GET.
    pub async fn fetch(&self, url: &str, ttl: Duration) -> Result<FetchResponse, Error> {
        self.request(Method::GET, url, ttl).await
    }

    /// Like [`fetch`](Self::fetch), but failures are logged and swallowed.
    ///
    /// This is what the scrape adapters consume: a transport failure means
    /// "no data available", never an error to propagate.
    pub async fn get(&self, url: &str, ttl: Duration) -> Option<FetchResponse> {
        match self.fetch(url, ttl).await {
            Ok(response) => Some(response),
            Err(err) => {
                tracing::warn!("request failed for {}: {}", url, err);
                None
            }
        }
    }

    /// Cache-enabled request with an explicit method.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        ttl: Duration,
    ) -> Result<FetchResponse, Error> {
        let now = Utc::now();

        // Fresh hit: serve stored content without any network access.
        let stale = {
            let mut cache = self.cache.lock().await;
            cache.get(url).cloned()
        };
        if let Some(entry) = &stale
            && entry.is_fresh(now)
        {
            tracing::debug!("cache hit for {}", url);
            return Ok(self.stored_response(entry).await);
        }
        // anything left in `stale` is an expired entry

        // Expired entry: cheap HEAD probe before a full re-download.
        if let Some(entry) = &stale {
            match self.probe(url).await {
                Ok(Some((etag, last_modified)))
                    if entry.validators.matches_probe(etag.as_deref(), last_modified.as_deref()) =>
                {
                    tracing::debug!("HEAD check: no change for {}, extending TTL", url);
                    self.cache.lock().await.extend_expiry(url, now + ttl_offset(ttl));
                    return Ok(self.stored_response(entry).await);
                }
                Ok(Some(_)) => {
                    tracing::debug!("HEAD check: resource changed for {}, will refetch", url);
                }
                Ok(None) => {}
                Err(err) => tracing::warn!("HEAD request failed for {}: {}", url, err),
            }
        }

        let mut request = self.http.request(method, url);
        if let Some(entry) = &stale {
            if let Some(etag) = &entry.validators.etag {
                request = request.header(header::IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = &entry.validators.last_modified {
                request = request.header(header::IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = request.send().await.map_err(|e| Error::Network(e.to_string()))?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED
            && let Some(entry) = &stale
        {
            self.cache.lock().await.extend_expiry(url, now + ttl_offset(ttl));
            return Ok(self.stored_response(entry).await);
        }

        let final_url = response.url().to_string();
        let headers = header_map(response.headers());

        if status.as_u16() >= 400 {
            tracing::warn!("caching negative response {} for {}", status.as_u16(), url);
            let negative = CacheEntry {
                url: url.to_string(),
                final_url: final_url.clone(),
                status: status.as_u16(),
                headers: headers.clone(),
                validators: Validators::default(),
                expires_at: now + ttl_offset(ttl.min(NEGATIVE_TTL_CAP)),
                body: None,
            };
            self.cache.lock().await.insert(negative);

            return Ok(FetchResponse {
                url: final_url,
                status: status.as_u16(),
                headers,
                body: Bytes::new(),
            });
        }

        let body = response.bytes().await.map_err(|e| Error::Network(e.to_string()))?;

        // Persistence failures degrade to an uncached response; they never
        // fail the fetch itself.
        match self.store.put_body(&url_hash(url), &body).await {
            Ok(body_ref) => {
                let entry = CacheEntry {
                    url: url.to_string(),
                    final_url: final_url.clone(),
                    status: status.as_u16(),
                    headers: headers.clone(),
                    validators: Validators {
                        etag: headers.get("etag").cloned(),
                        last_modified: headers.get("last-modified").cloned(),
                    },
                    expires_at: now + ttl_offset(ttl),
                    body: Some(body_ref),
                };
                if let Err(err) = self.store.put_meta(&entry).await {
                    tracing::warn!("failed to write sidecar metadata for {}: {}", url, err);
                }
                self.cache.lock().await.insert(entry);
            }
            Err(err) => tracing::warn!("failed to persist body for {}: {}", url, err),
        }

        Ok(FetchResponse { url: final_url, status: status.as_u16(), headers, body })
    }

    /// The content store backing this client.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Snapshot of all current cache entries, for persistence.
    pub async fn snapshot_entries(&self) -> Vec<CacheEntry> {
        self.cache.lock().await.iter().cloned().collect()
    }

    /// Re-insert entries reconstructed from a persisted snapshot.
    pub async fn restore_entries(&self, entries: Vec<CacheEntry>) {
        let mut cache = self.cache.lock().await;
        for entry in entries {
            cache.insert(entry);
        }
    }

    /// Build a response from a cache entry, loading the body lazily from
    /// the content store.
    async fn stored_response(&self, entry: &CacheEntry) -> FetchResponse {
        let body = match &entry.body {
            Some(body_ref) => match self.store.body(body_ref).await {
                Some(bytes) => Bytes::from(bytes),
                None => {
                    tracing::warn!("cached body unreadable for {}", entry.url);
                    Bytes::new()
                }
            },
            None => Bytes::new(),
        };
        FetchResponse {
            url: entry.final_url.clone(),
            status: entry.status,
            headers: entry.headers.clone(),
            body,
        }
    }

    /// Metadata-only existence probe. Returns the probe's validators on 200,
    /// `None` for any other status.
    async fn probe(
        &self,
        url: &str,
    ) -> Result<Option<(Option<String>, Option<String>)>, Error> {
        let response = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Ok(None);
        }

        let header_value = |name: header::HeaderName| {
            response.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
        };
        Ok(Some((header_value(header::ETAG), header_value(header::LAST_MODIFIED))))
    }
}

fn ttl_offset(ttl: Duration) -> chrono::Duration {
    chrono::Duration::seconds(ttl.as_secs() as i64)
}

fn header_map(headers: &header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
