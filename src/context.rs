/// Application context and dependency injection
use crate::{
    config::{AppConfig, TokenConfig},
    directory::{
        ClientCredentialsTokenProvider, DirectoryCache, HttpDirectoryFetcher, ServiceDirectory,
        StaticTokenProvider, TokenProvider,
    },
    error::{DirectoryError, DirectoryResult},
};
use std::sync::Arc;
use tracing::info;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub directory: Arc<ServiceDirectory>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: AppConfig) -> DirectoryResult<Self> {
        // Validate configuration
        config.validate_config()?;

        let token_provider = Self::build_token_provider(&config)?;

        let fetcher = HttpDirectoryFetcher::new(
            &config.directory.directory_url,
            token_provider,
            config.directory.retry_policy(),
            config.directory.request_timeout(),
        )?;
        info!("Directory discovery endpoint: {}", fetcher.discovery_url());

        let cache = DirectoryCache::new().with_ttl(config.directory.cache_ttl());
        let directory = ServiceDirectory::new(cache, Arc::new(fetcher))
            .with_single_flight(config.directory.single_flight);

        Ok(Self::with_directory(config, directory))
    }

    /// Create a context around an already constructed resolver
    pub fn with_directory(config: AppConfig, directory: ServiceDirectory) -> Self {
        Self {
            config: Arc::new(config),
            directory: Arc::new(directory),
        }
    }

    fn build_token_provider(config: &AppConfig) -> DirectoryResult<Arc<dyn TokenProvider>> {
        match &config.token {
            TokenConfig::Static { token } => {
                info!("Using static access token for directory requests");
                Ok(Arc::new(StaticTokenProvider::new(token.clone())))
            }
            TokenConfig::ClientCredentials {
                token_url,
                client_id,
                client_secret,
            } => {
                info!("Using client credentials for {} against {}", client_id, token_url);
                let http_client = reqwest::Client::builder()
                    .timeout(config.directory.request_timeout())
                    .build()
                    .map_err(|e| {
                        DirectoryError::Internal(format!("Failed to create HTTP client: {}", e))
                    })?;
                Ok(Arc::new(ClientCredentialsTokenProvider::new(
                    http_client,
                    token_url.clone(),
                    client_id.clone(),
                    client_secret.clone(),
                )))
            }
        }
    }
}
