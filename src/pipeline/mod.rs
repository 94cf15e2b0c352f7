// ============================================================================
// Ingestion & Recovery
// ============================================================================
//
// - ingest:   decode → validate → persist → cache, one message at a time
// - recovery: bulk-load the cache from the store at startup
//
// ============================================================================

mod ingest;
mod recovery;

pub use ingest::{IngestError, IngestOutcome, IngestPipeline, PipelineSettings};
pub use recovery::recover_cache;
