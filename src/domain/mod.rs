// ============================================================================
// Domain Layer
// ============================================================================
//
// The order aggregate, its wire format and its acceptance rules.
// Persistence, caching and transport live outside this module.
//
// ============================================================================

pub mod order;
