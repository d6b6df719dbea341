/// Service Directory Resolution System
///
/// Resolves platform identifiers (URNs) to live service URLs, caching the
/// directory listing and composing resource URLs from API base URLs.

pub mod cache;
pub mod fetcher;
pub mod resolver;
pub mod retry;
pub mod token;
pub mod urn;

pub use cache::DirectoryCache;
pub use fetcher::{DirectorySource, HttpDirectoryFetcher};
pub use resolver::{compose_resource_url, ServiceDirectory};
pub use retry::{Backoff, RetryPolicy};
pub use token::{ClientCredentialsTokenProvider, StaticTokenProvider, TokenProvider};
pub use urn::{Locator, Partition, PlatformIdentifier};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Service,
    Api,
    Resource,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentifierKind::Service => "service",
            IdentifierKind::Api => "api",
            IdentifierKind::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// Resolved directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub urn: String,
    pub url: Url,
}

/// Raw entry as returned by the discovery endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub urn: String,
    pub url: String,
}

impl TryFrom<DiscoveryRecord> for DirectoryEntry {
    type Error = String;

    fn try_from(record: DiscoveryRecord) -> Result<Self, Self::Error> {
        let url = Url::parse(&record.url).map_err(|e| e.to_string())?;
        Ok(Self {
            urn: record.urn,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_record() {
        let entry = DirectoryEntry::try_from(DiscoveryRecord {
            urn: "urn:ads:platform:tenant-service:v2".to_string(),
            url: "https://host/application/v2".to_string(),
        })
        .unwrap();
        assert_eq!(entry.url.path(), "/application/v2");

        let bad = DirectoryEntry::try_from(DiscoveryRecord {
            urn: "urn:ads:platform:tenant-service:v2".to_string(),
            url: "not a url".to_string(),
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&IdentifierKind::Resource).unwrap(),
            "\"resource\""
        );
        assert_eq!(IdentifierKind::Api.to_string(), "api");
    }
}
