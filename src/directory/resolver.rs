/// Service Directory - resolves platform identifiers to URLs with caching
use crate::{
    directory::{DirectoryCache, DirectorySource, IdentifierKind, PlatformIdentifier},
    error::{DirectoryError, DirectoryResult},
    metrics,
};
use reqwest::Url;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Main directory resolver - combines the cache with a directory source
#[derive(Clone)]
pub struct ServiceDirectory {
    cache: DirectoryCache,
    source: Arc<dyn DirectorySource>,
    single_flight: bool,
    /// Serializes refreshes and holds the error of the last one, if it failed
    refresh_lock: Arc<Mutex<Option<DirectoryError>>>,
    refresh_generation: Arc<AtomicU64>,
}

impl ServiceDirectory {
    /// Create a new resolver
    pub fn new(cache: DirectoryCache, source: Arc<dyn DirectorySource>) -> Self {
        Self {
            cache,
            source,
            single_flight: true,
            refresh_lock: Arc::new(Mutex::new(None)),
            refresh_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Coalesce concurrent cache misses into a single refresh
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Resolve a service or API identifier to its URL
    ///
    /// Resolution order:
    /// 1. Check cache first (fast path)
    /// 2. Refresh the whole directory once
    /// 3. Check cache again; a second miss is terminal
    pub async fn resolve_service_url(&self, id: &PlatformIdentifier) -> DirectoryResult<Url> {
        id.assert_kind(&[IdentifierKind::Service, IdentifierKind::Api])?;
        let urn = id.to_string();

        if let Some(url) = self.cache.get(&urn).await {
            metrics::record_resolution("hit");
            return Ok(url);
        }

        debug!("Directory cache miss for {}", urn);

        if let Err(e) = self.refresh_after_miss().await {
            metrics::record_resolution("error");
            return Err(e);
        }

        match self.cache.get(&urn).await {
            Some(url) => {
                metrics::record_resolution("refreshed");
                Ok(url)
            }
            None => {
                warn!("No directory entry for {} after refresh", urn);
                metrics::record_resolution("not_found");
                Err(DirectoryError::EntryNotFound(urn))
            }
        }
    }

    /// Resolve a resource identifier to a URL under its API
    pub async fn resolve_resource_url(&self, id: &PlatformIdentifier) -> DirectoryResult<Url> {
        id.assert_kind(&[IdentifierKind::Resource])?;

        let api_url = self.resolve_service_url(&id.api_identifier()?).await?;
        let resource = id.resource().unwrap_or_default();

        Ok(compose_resource_url(&api_url, resource))
    }

    /// Resolve any identifier kind
    pub async fn resolve(&self, id: &PlatformIdentifier) -> DirectoryResult<Url> {
        match id.kind() {
            IdentifierKind::Resource => self.resolve_resource_url(id).await,
            IdentifierKind::Service | IdentifierKind::Api => self.resolve_service_url(id).await,
        }
    }

    /// Fetch the whole directory and cache every entry
    pub async fn refresh(&self) -> DirectoryResult<usize> {
        let mut last_error = self.refresh_lock.lock().await;
        self.refresh_locked(&mut last_error).await
    }

    /// Invalidate a cached entry (force re-fetch on next resolve)
    pub async fn invalidate(&self, id: &PlatformIdentifier) -> bool {
        let urn = match id.kind() {
            IdentifierKind::Resource => match id.api_identifier() {
                Ok(api) => api.to_string(),
                Err(_) => return false,
            },
            _ => id.to_string(),
        };
        self.cache.invalidate(&urn).await
    }

    /// Clean up expired cache entries
    pub async fn cleanup_cache(&self) -> usize {
        self.cache.cleanup_expired().await
    }

    async fn refresh_after_miss(&self) -> DirectoryResult<()> {
        if !self.single_flight {
            return self.fetch_and_populate().await.map(|_| ());
        }

        let observed = self.refresh_generation.load(Ordering::Acquire);
        let mut last_error = self.refresh_lock.lock().await;

        // Another task finished a refresh while we waited for the lock,
        // successful or not; share its outcome instead of fetching again
        if self.refresh_generation.load(Ordering::Acquire) != observed {
            debug!("Reusing directory refresh completed by a concurrent resolve");
            return match last_error.as_ref() {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            };
        }

        self.refresh_locked(&mut last_error).await.map(|_| ())
    }

    /// Run a refresh while holding the refresh lock and publish its outcome
    async fn refresh_locked(
        &self,
        last_error: &mut Option<DirectoryError>,
    ) -> DirectoryResult<usize> {
        let result = self.fetch_and_populate().await;
        *last_error = result.as_ref().err().cloned();
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn fetch_and_populate(&self) -> DirectoryResult<usize> {
        let entries = self.source.fetch_all().await?;
        self.cache.put_all(&entries).await;

        info!("Directory cache refreshed with {} entries", entries.len());
        Ok(entries.len())
    }
}

/// Append a resource path to an API base URL with exactly one separating slash
///
/// A `?query` in the resource is appended to any query already on the base
/// URL, and a `#fragment` replaces the base fragment.
pub fn compose_resource_url(api_url: &Url, resource: &str) -> Url {
    let (resource, fragment) = match resource.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (resource, None),
    };
    let (path, query) = match resource.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (resource, None),
    };

    let mut url = api_url.clone();
    let base = api_url.path().trim_end_matches('/');
    let suffix = path.trim_start_matches('/');
    url.set_path(&format!("{}/{}", base, suffix));
    if let Some(query) = query {
        let merged = match api_url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query),
            _ => query.to_string(),
        };
        url.set_query(Some(&merged));
    }
    if fragment.is_some() {
        url.set_fragment(fragment);
    }
    url
}
