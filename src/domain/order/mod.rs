// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (Delivery, Payment, Item)
// - Aggregate (Order) and its acceptance rules
// - Wire codec (decode / encode)
// - Errors (ValidationError, DecodeError)
//
// Everything here is pure: no I/O, no shared state.
//
// ============================================================================

pub mod value_objects;
pub mod aggregate;
pub mod codec;
pub mod errors;

pub use value_objects::*;
pub use aggregate::*;
pub use codec::*;
pub use errors::*;
