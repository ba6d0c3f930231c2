// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderStatus state machine, OrderItem)
// - Order aggregate (items + derived total)
// - Events written to the outbox
// - Commands and the engine that runs them against a store transaction
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod engine;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use engine::*;
