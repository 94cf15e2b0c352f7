// ============================================================================
// Messaging - Redpanda (Kafka protocol) transport
// ============================================================================

mod consumer;
mod redpanda;

pub use consumer::OrderConsumer;
pub use redpanda::OrderPublisher;
