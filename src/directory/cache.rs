/// Directory Cache - in-memory TTL cache of resolved directory entries
use crate::{directory::DirectoryEntry, metrics};
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Cached URL with its validity window
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub url: Url,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Directory cache manager
#[derive(Clone)]
pub struct DirectoryCache {
    entries: Arc<RwLock<HashMap<String, CachedEntry>>>,
    /// TTL for cached entries (default: 10 hours)
    ttl: Duration,
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryCache {
    /// Create a new directory cache
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::hours(10),
        }
    }

    /// Set custom TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get cached URL for a urn, if present and unexpired
    pub async fn get(&self, urn: &str) -> Option<Url> {
        self.get_at(urn, Utc::now()).await
    }

    pub async fn get_at(&self, urn: &str, now: DateTime<Utc>) -> Option<Url> {
        {
            let entries = self.entries.read().await;
            match entries.get(urn) {
                Some(entry) if entry.is_fresh(now) => {
                    metrics::DIRECTORY_CACHE_HITS_TOTAL.inc();
                    return Some(entry.url.clone());
                }
                Some(_) => {}
                None => {
                    metrics::DIRECTORY_CACHE_MISSES_TOTAL.inc();
                    return None;
                }
            }
        }

        // Cache expired, delete it unless a refresh replaced it meanwhile
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(urn) {
            if entry.is_fresh(now) {
                metrics::DIRECTORY_CACHE_HITS_TOTAL.inc();
                return Some(entry.url.clone());
            }
            debug!("Directory cache entry expired: {}", urn);
            entries.remove(urn);
            metrics::DIRECTORY_CACHE_SIZE.set(entries.len() as i64);
        }
        metrics::DIRECTORY_CACHE_MISSES_TOTAL.inc();
        None
    }

    /// Cache a URL for a urn
    pub async fn put(&self, urn: &str, url: Url) {
        self.put_at(urn, url, Utc::now()).await
    }

    pub async fn put_at(&self, urn: &str, url: Url, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(urn.to_string(), self.new_entry(url, now));
        metrics::DIRECTORY_CACHE_SIZE.set(entries.len() as i64);
    }

    /// Cache a batch of entries under a single write lock
    ///
    /// Later entries overwrite earlier ones sharing the same urn.
    pub async fn put_all(&self, batch: &[DirectoryEntry]) {
        self.put_all_at(batch, Utc::now()).await
    }

    pub async fn put_all_at(&self, batch: &[DirectoryEntry], now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        for entry in batch {
            entries.insert(entry.urn.clone(), self.new_entry(entry.url.clone(), now));
        }
        metrics::DIRECTORY_CACHE_SIZE.set(entries.len() as i64);
    }

    /// Delete a cached entry
    pub async fn invalidate(&self, urn: &str) -> bool {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(urn).is_some();
        metrics::DIRECTORY_CACHE_SIZE.set(entries.len() as i64);
        removed
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        metrics::DIRECTORY_CACHE_SIZE.set(0);
    }

    /// Number of stored entries, including expired ones not yet purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clean up expired cache entries, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Utc::now()).await
    }

    pub async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        metrics::DIRECTORY_CACHE_SIZE.set(entries.len() as i64);
        before - entries.len()
    }

    fn new_entry(&self, url: Url, now: DateTime<Utc>) -> CachedEntry {
        CachedEntry {
            url,
            cached_at: now,
            // An unrepresentable expiry means the entry never expires
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}
