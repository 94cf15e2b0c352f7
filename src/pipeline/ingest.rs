use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::OrderCache;
use crate::domain::order::{self, DecodeError, Order, ValidationError};
use crate::metrics::Metrics;
use crate::store::{OrderStore, StoreError};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Ingestion Pipeline
// ============================================================================
//
// Per message:  Received → Decoded → Validated → Persisted → Cached
//
// Any failing step is terminal for that message: it is logged and dropped.
// The cache is written only after the store committed the aggregate, so the
// cache never holds an order the store does not.
//
// Store calls run under a deadline and outside any cache lock.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("persist failed for {order_uid}: {source}")]
    Store {
        order_uid: String,
        #[source]
        source: StoreError,
    },
}

/// Terminal state of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Cached,
    Malformed,
    Invalid,
    StoreFailed,
}

impl IngestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestOutcome::Cached => "cached",
            IngestOutcome::Malformed => "malformed",
            IngestOutcome::Invalid => "invalid",
            IngestOutcome::StoreFailed => "store_failed",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Deadline for each store call
    pub store_timeout: Duration,
    /// Retries for transient store failures; defaults to none
    pub retry: RetryConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            retry: RetryConfig::no_retry(),
        }
    }
}

#[derive(Clone)]
pub struct IngestPipeline {
    store: Arc<dyn OrderStore>,
    cache: Arc<OrderCache>,
    settings: PipelineSettings,
    metrics: Option<Arc<Metrics>>,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: Arc<OrderCache>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &Arc<OrderCache> {
        &self.cache
    }

    /// Run one message through the pipeline, log the outcome, never fail.
    pub async fn handle(&self, raw: &[u8]) -> IngestOutcome {
        let started = Instant::now();

        let outcome = match self.ingest(raw).await {
            Ok(order_uid) => {
                tracing::info!(order_uid = %order_uid, "✅ Order processed successfully");
                IngestOutcome::Cached
            }
            Err(IngestError::Decode(e)) => {
                tracing::warn!(error = %e, payload_bytes = raw.len(), "Invalid JSON received, message dropped");
                IngestOutcome::Malformed
            }
            Err(IngestError::Validation(e)) => {
                tracing::warn!(field = e.field(), error = %e, "Invalid order data, message dropped");
                IngestOutcome::Invalid
            }
            Err(IngestError::Store { order_uid, source }) => {
                tracing::error!(
                    order_uid = %order_uid,
                    error = %source,
                    "❌ Failed to save order, message dropped and not cached"
                );
                IngestOutcome::StoreFailed
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_ingest(outcome.as_str(), started.elapsed().as_secs_f64());
            metrics.set_cache_size(self.cache.size());
        }

        outcome
    }

    /// Decode → validate → persist → cache. Returns the cached order_uid.
    pub async fn ingest(&self, raw: &[u8]) -> Result<String, IngestError> {
        let order = order::decode(raw)?;
        order.validate()?;

        self.persist(&order).await.map_err(|source| IngestError::Store {
            order_uid: order.order_uid.clone(),
            source,
        })?;

        let order_uid = order.order_uid.clone();
        self.cache.set(order);
        Ok(order_uid)
    }

    async fn persist(&self, order: &Order) -> Result<(), StoreError> {
        let timeout = self.settings.store_timeout;

        retry_on_transient(&self.settings.retry, |attempt| {
            if attempt > 1 {
                if let Some(metrics) = &self.metrics {
                    metrics.record_store_retry();
                }
            }
            async move {
                match tokio::time::timeout(timeout, self.store.create_order(order)).await {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::Timeout(timeout)),
                }
            }
        })
        .await
        .into_result()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryOrderStore, MockOrderStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    const X1: &[u8] =
        br#"{"order_uid":"X1","track_number":"T1","delivery":{"name":"A"},"items":[{"name":"i1"}]}"#;

    fn pipeline_with(store: Arc<dyn OrderStore>) -> IngestPipeline {
        IngestPipeline::new(store, Arc::new(OrderCache::new()), PipelineSettings::default())
    }

    fn payload(uid: &str, track: &str) -> Vec<u8> {
        serde_json::json!({
            "order_uid": uid,
            "track_number": track,
            "delivery": {"name": "A"},
            "items": [{"name": "i1"}]
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_valid_message_is_persisted_and_cached() {
        let store = Arc::new(InMemoryOrderStore::new());
        let pipeline = pipeline_with(store.clone());

        assert_eq!(pipeline.handle(X1).await, IngestOutcome::Cached);

        assert_eq!(pipeline.cache().size(), 1);
        let cached = pipeline.cache().get("X1").unwrap();
        assert_eq!(*cached, order::decode(X1).unwrap());
        assert_eq!(store.get_order_by_uid("X1").await.unwrap(), *cached);
    }

    #[tokio::test]
    async fn test_null_optional_fields_are_ingested() {
        let store = Arc::new(InMemoryOrderStore::new());
        let pipeline = pipeline_with(store.clone());
        let raw = br#"{"order_uid":"X1","track_number":"T1","delivery":{"name":"A","email":null},"items":[{"name":"i1"}],"internal_signature":null}"#;

        assert_eq!(pipeline.handle(raw).await, IngestOutcome::Cached);
        assert_eq!(pipeline.cache().size(), 1);
        assert!(pipeline.cache().get("X1").unwrap().internal_signature.is_empty());
    }

    #[tokio::test]
    async fn test_empty_uid_is_dropped_without_store_call() {
        let mut store = MockOrderStore::new();
        store.expect_create_order().never();
        let pipeline = pipeline_with(Arc::new(store));

        let raw = payload("", "T1");
        assert_eq!(pipeline.handle(&raw).await, IngestOutcome::Invalid);
        assert_eq!(pipeline.cache().size(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_dropped_without_store_call() {
        let mut store = MockOrderStore::new();
        store.expect_create_order().never();
        let pipeline = pipeline_with(Arc::new(store));

        assert_eq!(pipeline.handle(b"not json").await, IngestOutcome::Malformed);
        assert!(matches!(pipeline.ingest(b"{").await, Err(IngestError::Decode(_))));
        assert_eq!(pipeline.cache().size(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_cache_untouched() {
        let mut store = MockOrderStore::new();
        store
            .expect_create_order()
            .times(1)
            .returning(|order| Err(StoreError::Rejected(order.order_uid.clone())));
        let pipeline = pipeline_with(Arc::new(store));

        let err = pipeline.ingest(X1).await.unwrap_err();
        assert!(matches!(err, IngestError::Store { ref order_uid, .. } if order_uid == "X1"));
        assert!(pipeline.cache().get("X1").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_resend_keeps_committed_version_cached() {
        let store = Arc::new(InMemoryOrderStore::new());
        let pipeline = pipeline_with(store);

        assert_eq!(pipeline.handle(&payload("X1", "first")).await, IngestOutcome::Cached);
        assert_eq!(pipeline.handle(&payload("X1", "second")).await, IngestOutcome::StoreFailed);

        assert_eq!(pipeline.cache().get("X1").unwrap().track_number, "first");
    }

    #[tokio::test]
    async fn test_store_call_is_bounded_by_deadline() {
        struct StalledStore;

        #[async_trait]
        impl OrderStore for StalledStore {
            async fn create_order(&self, _order: &Order) -> Result<(), StoreError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
            async fn get_order_by_uid(&self, uid: &str) -> Result<Order, StoreError> {
                Err(StoreError::NotFound(uid.to_string()))
            }
            async fn get_all_orders(&self) -> Result<Vec<Order>, StoreError> {
                Ok(vec![])
            }
        }

        let settings = PipelineSettings {
            store_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let pipeline = IngestPipeline::new(Arc::new(StalledStore), Arc::new(OrderCache::new()), settings);

        let err = pipeline.ingest(X1).await.unwrap_err();
        assert!(matches!(err, IngestError::Store { source: StoreError::Timeout(_), .. }));
        assert_eq!(pipeline.cache().size(), 0);
    }

    #[tokio::test]
    async fn test_transient_store_failure_is_retried_when_configured() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut store = MockOrderStore::new();
        {
            let calls = calls.clone();
            store.expect_create_order().times(2).returning(move |_| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StoreError::Unavailable("connection reset".to_string()))
                } else {
                    Ok(())
                }
            });
        }

        let settings = PipelineSettings {
            retry: RetryConfig {
                initial_delay: Duration::from_millis(1),
                ..RetryConfig::with_max_attempts(3)
            },
            ..Default::default()
        };
        let metrics = Arc::new(Metrics::new().unwrap());
        let pipeline = IngestPipeline::new(Arc::new(store), Arc::new(OrderCache::new()), settings)
            .with_metrics(metrics.clone());

        assert_eq!(pipeline.handle(X1).await, IngestOutcome::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(metrics.store_retry_attempts.get(), 1);
        assert_eq!(metrics.cache_orders.get(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_not_retried_by_default() {
        let mut store = MockOrderStore::new();
        store
            .expect_create_order()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));
        let pipeline = pipeline_with(Arc::new(store));

        assert_eq!(pipeline.handle(X1).await, IngestOutcome::StoreFailed);
    }

    #[tokio::test]
    async fn test_concurrent_ingest_of_distinct_orders() {
        let store = Arc::new(InMemoryOrderStore::new());
        let pipeline = pipeline_with(store.clone());

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move { pipeline.handle(&payload(&format!("uid-{i}"), "T")).await })
            })
            .collect();

        for task in futures_util::future::join_all(tasks).await {
            assert_eq!(task.unwrap(), IngestOutcome::Cached);
        }

        assert_eq!(pipeline.cache().size(), 50);
        assert_eq!(store.len(), 50);
    }

    #[tokio::test]
    async fn test_metrics_record_outcomes() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let pipeline = pipeline_with(Arc::new(InMemoryOrderStore::new())).with_metrics(metrics.clone());

        pipeline.handle(X1).await;
        pipeline.handle(b"{ broken").await;
        pipeline.handle(&payload("X2", "")).await;

        let counter = |outcome: &str| metrics.ingest_messages.with_label_values(&[outcome]).get();
        assert_eq!(counter("cached"), 1);
        assert_eq!(counter("malformed"), 1);
        assert_eq!(counter("invalid"), 1);
        assert_eq!(counter("store_failed"), 0);
    }
}
