/// Configuration management for the service directory
use crate::{
    directory::{Backoff, RetryPolicy},
    error::{DirectoryError, DirectoryResult},
};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub directory: DirectoryConfig,
    pub token: TokenConfig,
    #[validate(nested)]
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Directory client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// Base URL of the directory service
    #[validate(url)]
    pub directory_url: String,
    /// At most one year
    #[validate(range(min = 1, max = 31_536_000))]
    pub cache_ttl_secs: u64,
    #[validate(range(min = 1))]
    pub cache_cleanup_secs: u64,
    #[validate(range(min = 1, max = 20))]
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_backoff: Backoff,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
    pub single_flight: bool,
}

/// How bearer tokens for the directory are obtained
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TokenConfig {
    Static {
        token: String,
    },
    ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
    },
}

/// Sidecar HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
}

/// Logging configuration
///
/// `level` is a tracing `EnvFilter` directive string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl DirectoryConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache_cleanup_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            backoff: self.retry_backoff,
            jitter: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> DirectoryResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> DirectoryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let directory_url = lookup("DIRECTORY_URL")
            .ok_or_else(|| DirectoryError::Config("DIRECTORY_URL is required".to_string()))?;

        let directory = DirectoryConfig {
            directory_url,
            cache_ttl_secs: parse_or(&lookup, "DIRECTORY_CACHE_TTL_SECS", 36_000)?,
            cache_cleanup_secs: parse_or(&lookup, "DIRECTORY_CACHE_CLEANUP_SECS", 1_800)?,
            retry_attempts: parse_or(&lookup, "DIRECTORY_RETRY_ATTEMPTS", 3)?,
            retry_delay_ms: parse_or(&lookup, "DIRECTORY_RETRY_DELAY_MS", 500)?,
            retry_max_delay_ms: parse_or(&lookup, "DIRECTORY_RETRY_MAX_DELAY_MS", 10_000)?,
            retry_backoff: parse_or(&lookup, "DIRECTORY_RETRY_BACKOFF", Backoff::Exponential)?,
            request_timeout_secs: parse_or(&lookup, "DIRECTORY_REQUEST_TIMEOUT_SECS", 10)?,
            single_flight: parse_or(&lookup, "DIRECTORY_SINGLE_FLIGHT", true)?,
        };

        let token = match lookup("DIRECTORY_ACCESS_TOKEN") {
            Some(token) => TokenConfig::Static { token },
            None => TokenConfig::ClientCredentials {
                token_url: lookup("ACCESS_TOKEN_URL").ok_or_else(|| {
                    DirectoryError::Config(
                        "ACCESS_TOKEN_URL or DIRECTORY_ACCESS_TOKEN is required".to_string(),
                    )
                })?,
                client_id: lookup("CLIENT_ID")
                    .ok_or_else(|| DirectoryError::Config("CLIENT_ID is required".to_string()))?,
                client_secret: lookup("CLIENT_SECRET").ok_or_else(|| {
                    DirectoryError::Config("CLIENT_SECRET is required".to_string())
                })?,
            },
        };

        let server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "SERVER_PORT", 3344)?,
        };

        let logging = LoggingConfig {
            level: lookup("RUST_LOG")
                .unwrap_or_else(|| "service_directory=debug,tower_http=debug".to_string()),
        };

        Ok(AppConfig {
            directory,
            token,
            server,
            logging,
        })
    }

    /// Validate configuration
    pub fn validate_config(&self) -> DirectoryResult<()> {
        self.validate()
            .map_err(|e| DirectoryError::Config(e.to_string()))?;

        if self.directory.retry_max_delay_ms < self.directory.retry_delay_ms {
            return Err(DirectoryError::Config(
                "DIRECTORY_RETRY_MAX_DELAY_MS must not be less than DIRECTORY_RETRY_DELAY_MS"
                    .to_string(),
            ));
        }

        match &self.token {
            TokenConfig::Static { token } if token.trim().is_empty() => {
                return Err(DirectoryError::Config(
                    "DIRECTORY_ACCESS_TOKEN cannot be empty".to_string(),
                ));
            }
            TokenConfig::ClientCredentials { token_url, .. }
                if reqwest::Url::parse(token_url).is_err() =>
            {
                return Err(DirectoryError::Config(format!(
                    "ACCESS_TOKEN_URL is not a valid URL: {}",
                    token_url
                )));
            }
            _ => {}
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> DirectoryResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DirectoryError::Config(format!("Invalid value for {}: '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> DirectoryResult<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("DIRECTORY_ACCESS_TOKEN", "secret-token"),
        ])
        .unwrap();

        assert_eq!(config.directory.cache_ttl(), chrono::Duration::hours(10));
        assert_eq!(config.directory.retry_attempts, 3);
        assert_eq!(config.directory.retry_backoff, Backoff::Exponential);
        assert_eq!(config.directory.request_timeout(), Duration::from_secs(10));
        assert!(config.directory.single_flight);
        assert_eq!(config.server.port, 3344);
        assert_eq!(config.logging.level, "service_directory=debug,tower_http=debug");
        assert!(matches!(config.token, TokenConfig::Static { .. }));
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_client_credentials() {
        let config = load(&[
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("ACCESS_TOKEN_URL", "https://access.example.com/token"),
            ("CLIENT_ID", "urn:ads:platform:push-service"),
            ("CLIENT_SECRET", "shh"),
            ("DIRECTORY_RETRY_BACKOFF", "fixed"),
            ("DIRECTORY_SINGLE_FLIGHT", "false"),
        ])
        .unwrap();

        match &config.token {
            TokenConfig::ClientCredentials { client_id, .. } => {
                assert_eq!(client_id, "urn:ads:platform:push-service")
            }
            other => panic!("unexpected token config: {:?}", other),
        }
        assert_eq!(config.directory.retry_policy().backoff, Backoff::Fixed);
        assert!(!config.directory.single_flight);
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_missing_required_values() {
        assert!(load(&[("DIRECTORY_ACCESS_TOKEN", "t")]).is_err());
        assert!(load(&[("DIRECTORY_URL", "https://directory.example.com")]).is_err());
    }

    #[test]
    fn test_invalid_values() {
        let unparsable = load(&[
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("DIRECTORY_ACCESS_TOKEN", "t"),
            ("DIRECTORY_RETRY_ATTEMPTS", "many"),
        ]);
        assert!(matches!(unparsable, Err(DirectoryError::Config(_))));

        let out_of_range = load(&[
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("DIRECTORY_ACCESS_TOKEN", "t"),
            ("DIRECTORY_RETRY_ATTEMPTS", "0"),
        ])
        .unwrap();
        assert!(out_of_range.validate_config().is_err());

        let bad_url = load(&[
            ("DIRECTORY_URL", "directory"),
            ("DIRECTORY_ACCESS_TOKEN", "t"),
        ])
        .unwrap();
        assert!(bad_url.validate_config().is_err());

        let huge_ttl = load(&[
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("DIRECTORY_ACCESS_TOKEN", "t"),
            ("DIRECTORY_CACHE_TTL_SECS", "9000000000000"),
        ])
        .unwrap();
        assert!(huge_ttl.validate_config().is_err());
        assert!(huge_ttl.directory.cache_ttl() > chrono::Duration::zero());

        let wrapping_ttl = load(&[
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("DIRECTORY_ACCESS_TOKEN", "t"),
            ("DIRECTORY_CACHE_TTL_SECS", &u64::MAX.to_string()),
        ])
        .unwrap();
        assert!(wrapping_ttl.validate_config().is_err());
        assert_eq!(wrapping_ttl.directory.cache_ttl(), chrono::Duration::MAX);

        let inverted_delays = load(&[
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("DIRECTORY_ACCESS_TOKEN", "t"),
            ("DIRECTORY_RETRY_DELAY_MS", "5000"),
            ("DIRECTORY_RETRY_MAX_DELAY_MS", "100"),
        ])
        .unwrap();
        assert!(inverted_delays.validate_config().is_err());
    }
}
