/// Service Directory - platform identifier resolution and caching
///
/// Resolves platform service, API and resource identifiers
/// (`urn:ads:{namespace}:{service}[:{api}[:{resource}]]`) to live URLs using
/// the remote directory service, caching the directory listing in memory.

pub mod api;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod server;

pub use context::AppContext;
pub use directory::{IdentifierKind, PlatformIdentifier, ServiceDirectory};
pub use error::{DirectoryError, DirectoryResult};
