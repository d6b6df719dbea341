/// Access token providers for authenticated directory lookups
use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Tokens are refreshed this long before the issuer's expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_access_token(&self) -> Result<String, FetchError>;
}

/// Provider returning a fixed, pre-issued token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_access_token(&self) -> Result<String, FetchError> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// OAuth2 client-credentials provider with in-memory token caching
pub struct ClientCredentialsTokenProvider {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsTokenProvider {
    pub fn new(
        http_client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: Mutex::new(None),
        }
    }

    async fn request_token(&self) -> Result<CachedToken, FetchError> {
        debug!("Requesting access token from {}", self.token_url);

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Token(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Token(format!(
                "token endpoint returned error: {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Token(format!("invalid token response: {}", e)))?;

        let expires_at = Duration::try_seconds(body.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                FetchError::Token(format!("invalid expires_in: {}", body.expires_in))
            })?;

        info!(
            "Obtained access token for client {} (expires in {}s)",
            self.client_id, body.expires_in
        );

        Ok(CachedToken {
            value: body.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsTokenProvider {
    async fn get_access_token(&self) -> Result<String, FetchError> {
        // Held across the request so concurrent callers share one token fetch
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.get_access_token().await.unwrap(), "abc");
    }

    #[test]
    fn test_cached_token_expiry_margin() {
        let now = Utc::now();
        let token = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(300),
        };

        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + Duration::seconds(239)));
        assert!(!token.is_valid_at(now + Duration::seconds(240)));
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_token_error() {
        let provider = ClientCredentialsTokenProvider::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/token",
            "client",
            "secret",
        );

        let err = provider.get_access_token().await.unwrap_err();
        assert!(matches!(err, FetchError::Token(_)));
    }
}
