/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{DirectoryError, DirectoryResult},
};
use axum::{http::StatusCode, response::Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .merge(crate::api::routes())
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> DirectoryResult<()> {
    let addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);

    info!("Service directory resolver listening on {}", addr);
    info!("   Directory: {}", ctx.config.directory.directory_url);

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DirectoryError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| DirectoryError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::resolve::ResolveResponse,
        config::AppConfig,
        directory::{
            DirectoryCache, DirectoryEntry, DirectorySource, IdentifierKind, ServiceDirectory,
        },
        error::{ErrorResponse, FetchError},
    };
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body, Bytes};
    use axum::http::Request;
    use reqwest::Url;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StaticSource(Vec<DirectoryEntry>);

    #[async_trait]
    impl DirectorySource for StaticSource {
        async fn fetch_all(&self) -> DirectoryResult<Vec<DirectoryEntry>> {
            Ok(self.0.clone())
        }
    }

    struct OfflineSource;

    #[async_trait]
    impl DirectorySource for OfflineSource {
        async fn fetch_all(&self) -> DirectoryResult<Vec<DirectoryEntry>> {
            Err(DirectoryError::fetch(
                3,
                FetchError::Decode("offline".to_string()),
            ))
        }
    }

    fn test_config() -> AppConfig {
        let vars: HashMap<&str, &str> = [
            ("DIRECTORY_URL", "https://directory.example.com"),
            ("DIRECTORY_ACCESS_TOKEN", "t"),
        ]
        .into_iter()
        .collect();
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
    }

    fn router_with(source: Arc<dyn DirectorySource>) -> Router {
        let directory = ServiceDirectory::new(DirectoryCache::new(), source);
        build_router(AppContext::with_directory(test_config(), directory))
    }

    fn tenant_router() -> Router {
        router_with(Arc::new(StaticSource(vec![DirectoryEntry {
            urn: "urn:ads:platform:tenant-service:v2".to_string(),
            url: Url::parse("https://host/application/v2").unwrap(),
        }])))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Bytes) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_resolve_resource() {
        let (status, body) = get(
            tenant_router(),
            "/resolve?urn=urn:ads:platform:tenant-service:v2:/tenants/abc",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: ResolveResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.kind, IdentifierKind::Resource);
        assert_eq!(response.url, "https://host/application/v2/tenants/abc");
    }

    #[tokio::test]
    async fn test_resolve_error_statuses() {
        let (status, body) = get(tenant_router(), "/resolve?urn=urn:ads:platform").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "MalformedIdentifier");

        let (status, body) = get(tenant_router(), "/resolve?urn=urn:ads:platform:missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(error.message.contains("urn:ads:platform:missing"));

        let (status, _) = get(
            router_with(Arc::new(OfflineSource)),
            "/resolve?urn=urn:ads:platform:tenant-service",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health_and_fallback() {
        let (status, body) = get(tenant_router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["cachedEntries"], 0);

        let (status, _) = get(tenant_router(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
