// ============================================================================
// User Domain
// ============================================================================
//
// Users own orders but are otherwise outside the order engine: the engine
// only resolves them by id.
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod aggregate;

pub use value_objects::*;
pub use errors::*;
pub use aggregate::*;
