use std::time::Duration;

use crate::cache::OrderCache;
use crate::store::OrderStore;

/// Seed the cache with every persisted order before any message is consumed.
///
/// A store failure or an expired deadline is not fatal: the cache is left
/// empty, a warning is logged, and 0 is returned.
pub async fn recover_cache(
    store: &dyn OrderStore,
    cache: &OrderCache,
    deadline: Duration,
) -> usize {
    tracing::info!("Restoring order cache from the store");

    match tokio::time::timeout(deadline, store.get_all_orders()).await {
        Ok(Ok(orders)) => {
            let count = orders.len();
            cache.restore(orders);
            tracing::info!(restored = count, "📦 Cache restored");
            count
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to restore cache from the store, starting empty");
            0
        }
        Err(_) => {
            tracing::warn!(
                deadline_secs = deadline.as_secs(),
                "Timed out restoring cache from the store, starting empty"
            );
            0
        }
    }
}
