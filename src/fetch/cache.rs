//! In-memory memoization of page fetches by URL.
//!
//! The cache key is the exact URL string, with no normalization: callers
//! that want deduplication across equivalent forms (trailing slash, query
//! order) must normalize before use. This is a documented limitation rather
//! than a bug - listings are always fetched through canonical URLs that the
//! resolver constructed.
//!
//! The cache is shared mutable state. Access to the underlying map is
//! serialized through the concurrent map's internal locking, so a future
//! background prefetcher can share it with navigation without changes.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, instrument};

use super::transport::{FetchError, FetchResponse, Transport};

/// One cached page with its retrieval time.
#[derive(Debug, Clone)]
struct CachedPage {
    response: FetchResponse,
    fetched_at: Instant,
}

/// Age-queryable record of one cached URL.
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    /// The exact URL string used as the cache key.
    pub url: String,
    /// How long ago the content was fetched.
    pub age: Duration,
}

/// Snapshot of cache contents for display and diagnostics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cached URLs.
    pub count: usize,
    /// Sum of cached body sizes in bytes.
    pub total_bytes: u64,
    /// Per-entry URL and age, in no particular order.
    pub entries: Vec<CacheEntryInfo>,
}

impl CacheStats {
    /// Returns the cached URLs.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.url.as_str()).collect()
    }
}

/// Memoizes raw page fetches by URL.
#[derive(Debug, Default)]
pub struct FetchCache {
    pages: DashMap<String, CachedPage>,
}

impl FetchCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached response for `url`, fetching and caching it on a
    /// miss. With `use_cache` false the cache is bypassed for the read but
    /// the fresh response still replaces any cached copy.
    ///
    /// # Errors
    ///
    /// Propagates the transport's [`FetchError`] on a failed fetch; failures
    /// are never cached.
    #[instrument(level = "debug", skip(self, transport))]
    pub async fn get_or_fetch(
        &self,
        url: &str,
        transport: &dyn Transport,
        use_cache: bool,
    ) -> Result<FetchResponse, FetchError> {
        if use_cache {
            // The map guard must not be held across the fetch await below.
            if let Some(hit) = self.pages.get(url) {
                debug!("cache hit");
                return Ok(hit.response.clone());
            }
        }

        let response = transport.fetch(url).await?;
        debug!(bytes = response.body.len(), "caching response");
        self.pages.insert(
            url.to_string(),
            CachedPage {
                response: response.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(response)
    }

    /// Removes a single URL from the cache. Returns true when the URL was
    /// cached.
    pub fn invalidate(&self, url: &str) -> bool {
        self.pages.remove(url).is_some()
    }

    /// Removes every cached page.
    pub fn clear(&self) {
        self.pages.clear();
    }

    /// Returns true when the URL is currently cached.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    /// Number of cached URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns count, total size, and per-entry ages.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut total_bytes = 0u64;
        let entries: Vec<CacheEntryInfo> = self
            .pages
            .iter()
            .map(|item| {
                total_bytes += item.value().response.body.len() as u64;
                CacheEntryInfo {
                    url: item.key().clone(),
                    age: now.saturating_duration_since(item.value().fetched_at),
                }
            })
            .collect();

        CacheStats {
            count: entries.len(),
            total_bytes,
            entries,
        }
    }
}
