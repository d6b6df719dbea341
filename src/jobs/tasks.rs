/// Background task implementations
use crate::{context::AppContext, error::DirectoryResult, metrics};

/// Fetch the full directory into the cache
pub async fn warm_directory_cache(ctx: &AppContext) -> DirectoryResult<usize> {
    let result = ctx.directory.refresh().await;
    let status = if result.is_ok() { "success" } else { "failure" };
    metrics::record_background_job("directory_warmup", status);
    result
}

/// Cleanup expired directory cache entries
pub async fn cleanup_directory_cache(ctx: &AppContext) -> usize {
    let removed = ctx.directory.cleanup_cache().await;
    metrics::record_background_job("directory_cache_cleanup", "success");
    removed
}
