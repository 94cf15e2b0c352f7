// ============================================================================
// HTTP Read Surface
// ============================================================================
//
// GET /order?id=<uid>   order as JSON, 400 without id, 404 when unknown
// GET /order/<uid>      same, path form
// GET /health           liveness plus cache size
// GET /metrics          Prometheus text exposition
//
// Backed by the cache only; the store is never read on this path.
// ============================================================================

mod handlers;
mod server;

pub use handlers::{configure, AppState, OrderQuery};
pub use server::build_http_server;
