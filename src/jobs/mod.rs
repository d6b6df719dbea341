use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        info!("Starting background job scheduler");

        let handles = vec![
            tokio::spawn(Self::directory_warmup_job(Arc::clone(&self))),
            tokio::spawn(Self::directory_cache_cleanup_job(Arc::clone(&self))),
        ];

        info!("Background jobs started");
        handles
    }

    /// Populate the directory cache once at startup
    async fn directory_warmup_job(scheduler: Arc<Self>) {
        match tasks::warm_directory_cache(&scheduler.context).await {
            Ok(count) => info!("Directory cache warmed with {} entries", count),
            // Not fatal: resolves will refresh on their first miss
            Err(e) => error!("Failed to warm directory cache: {}", e),
        }
    }

    /// Cleanup expired directory cache entries (default every 30 minutes)
    async fn directory_cache_cleanup_job(scheduler: Arc<Self>) {
        let period = scheduler.context.config.directory.cache_cleanup_interval();
        let mut interval = interval(period);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            let count = tasks::cleanup_directory_cache(&scheduler.context).await;
            if count > 0 {
                info!("Cleaned up {} expired directory cache entries", count);
            }
        }
    }
}
