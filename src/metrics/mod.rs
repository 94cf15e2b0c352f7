use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Ingestion outcomes (cached / malformed / invalid / store_failed)
// - Ingestion latency, store call included
// - Store retry attempts
// - Cache size, and how many orders startup recovery restored
//
// Exposed as text by the HTTP surface under /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub ingest_messages: IntCounterVec,
    pub ingest_duration: Histogram,
    pub store_retry_attempts: IntCounter,
    pub cache_orders: IntGauge,
    pub cache_restored_orders: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let ingest_messages = IntCounterVec::new(
            Opts::new("ingest_messages_total", "Inbound order messages by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(ingest_messages.clone()))?;

        let ingest_duration = Histogram::with_opts(
            HistogramOpts::new("ingest_duration_seconds", "Time to process one inbound message")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(ingest_duration.clone()))?;

        let store_retry_attempts = IntCounter::new(
            "store_retry_attempts_total",
            "Store writes re-attempted after a transient failure",
        )?;
        registry.register(Box::new(store_retry_attempts.clone()))?;

        let cache_orders = IntGauge::new("cache_orders", "Orders currently held in the cache")?;
        registry.register(Box::new(cache_orders.clone()))?;

        let cache_restored_orders = IntGauge::new(
            "cache_restored_orders",
            "Orders loaded into the cache by startup recovery",
        )?;
        registry.register(Box::new(cache_restored_orders.clone()))?;

        Ok(Self {
            registry,
            ingest_messages,
            ingest_duration,
            store_retry_attempts,
            cache_orders,
            cache_restored_orders,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_ingest(&self, outcome: &str, duration_secs: f64) {
        self.ingest_messages.with_label_values(&[outcome]).inc();
        self.ingest_duration.observe(duration_secs);
    }

    pub fn record_store_retry(&self) {
        self.store_retry_attempts.inc();
    }

    pub fn set_cache_size(&self, size: usize) {
        self.cache_orders.set(size as i64);
    }

    pub fn record_restore(&self, restored: usize) {
        self.cache_restored_orders.set(restored as i64);
        self.set_cache_size(restored);
    }
}
