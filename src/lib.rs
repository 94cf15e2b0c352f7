// ============================================================================
// order_ingest
// ============================================================================
//
// Consumes order messages from Redpanda, persists each valid order to
// PostgreSQL, and serves lookups from an in-memory write-through cache.
//
//   domain     order aggregate, validation, wire codec
//   store      OrderStore trait, Postgres and in-memory backends
//   cache      concurrent order cache and its read interface
//   pipeline   per-message ingestion, startup recovery
//   messaging  Redpanda consumer / publisher
//   api        HTTP read surface
//   metrics    Prometheus metrics
//   config     environment configuration
//
// ============================================================================

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod messaging;
pub mod metrics;
pub mod pipeline;
pub mod store;
pub mod utils;
