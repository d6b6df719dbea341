/// Directory Fetcher - retrieves the full directory listing over HTTP
use crate::{
    directory::{DirectoryEntry, DiscoveryRecord, RetryPolicy, TokenProvider},
    error::{DirectoryError, DirectoryResult, FetchError},
    metrics,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Path of the discovery endpoint relative to the directory base URL
pub const DISCOVERY_PATH: &str = "/api/discovery/v1";

/// Source of the complete directory listing
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch_all(&self) -> DirectoryResult<Vec<DirectoryEntry>>;
}

/// Fetches the directory from the remote discovery endpoint
pub struct HttpDirectoryFetcher {
    http_client: reqwest::Client,
    discovery_url: String,
    token_provider: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
}

impl HttpDirectoryFetcher {
    /// Create a new fetcher
    pub fn new(
        directory_url: &str,
        token_provider: Arc<dyn TokenProvider>,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> DirectoryResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("service-directory/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|e| DirectoryError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            discovery_url: discovery_url(directory_url),
            token_provider,
            retry,
        })
    }

    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }

    /// Single fetch attempt, without retries
    async fn fetch_once(&self) -> Result<Vec<DirectoryEntry>, FetchError> {
        let token = self.token_provider.get_access_token().await?;

        debug!("Fetching directory from {}", self.discovery_url);

        let response = self
            .http_client
            .get(&self.discovery_url)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let records: Vec<DiscoveryRecord> = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(parse_records(records))
    }
}

#[async_trait]
impl DirectorySource for HttpDirectoryFetcher {
    async fn fetch_all(&self) -> DirectoryResult<Vec<DirectoryEntry>> {
        let started = Instant::now();

        let result = self
            .retry
            .run("Directory fetch", move |_| async move {
                let outcome = self.fetch_once().await;
                let label = if outcome.is_ok() { "success" } else { "failure" };
                metrics::DIRECTORY_FETCH_ATTEMPTS_TOTAL
                    .with_label_values(&[label])
                    .inc();
                outcome
            })
            .await;

        metrics::DIRECTORY_FETCH_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

        match result {
            Ok(entries) => {
                info!(
                    "Retrieved {} directory entries from {}",
                    entries.len(),
                    self.discovery_url
                );
                Ok(entries)
            }
            Err(exhausted) => {
                error!(
                    "Failed to retrieve directory from {} after {} attempt(s): {}",
                    self.discovery_url, exhausted.attempts, exhausted.last_error
                );
                Err(DirectoryError::fetch(exhausted.attempts, exhausted.last_error))
            }
        }
    }
}

/// Build the discovery endpoint from the directory base URL
pub fn discovery_url(directory_url: &str) -> String {
    format!("{}{}", directory_url.trim_end_matches('/'), DISCOVERY_PATH)
}

/// Convert raw records, dropping any with an unparsable URL
pub fn parse_records(records: Vec<DiscoveryRecord>) -> Vec<DirectoryEntry> {
    records
        .into_iter()
        .filter_map(|record| {
            let urn = record.urn.clone();
            let raw_url = record.url.clone();
            match DirectoryEntry::try_from(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(
                        "Dropping directory entry {} with invalid url '{}': {}",
                        urn, raw_url, e
                    );
                    metrics::DIRECTORY_ENTRIES_DROPPED_TOTAL.inc();
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(urn: &str, url: &str) -> DiscoveryRecord {
        DiscoveryRecord {
            urn: urn.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_discovery_url() {
        assert_eq!(
            discovery_url("https://directory.example.com"),
            "https://directory.example.com/api/discovery/v1"
        );
        assert_eq!(
            discovery_url("https://directory.example.com/"),
            "https://directory.example.com/api/discovery/v1"
        );
    }

    #[test]
    fn test_parse_records_drops_invalid_urls() {
        let entries = parse_records(vec![
            record("urn:ads:platform:tenant-service", "https://tenant/"),
            record("urn:ads:platform:broken-service", "::not a url::"),
            record("urn:ads:platform:event-service:v1", "https://event/event/v1"),
        ]);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].urn, "urn:ads:platform:tenant-service");
        assert_eq!(entries[1].url.path(), "/event/v1");
    }

    #[test]
    fn test_parse_records_keeps_duplicates_in_order() {
        let entries = parse_records(vec![
            record("urn:ads:platform:a", "https://one/"),
            record("urn:ads:platform:a", "https://two/"),
        ]);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].url.as_str(), "https://two/");
    }
}
