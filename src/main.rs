/// Service Directory resolver
///
/// Sidecar exposing platform identifier resolution over HTTP, backed by the
/// remote directory service and an in-memory cache.

use service_directory::{
    config::AppConfig, error::DirectoryResult, jobs, server, AppContext,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> DirectoryResult<()> {
    // Load configuration (RUST_LOG included, so .env can set it)
    let config = AppConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Service directory resolver v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Create application context
    let ctx = Arc::new(AppContext::new(config)?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    let _jobs = scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}
