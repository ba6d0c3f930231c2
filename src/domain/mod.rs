// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - user: order owners, resolved by id
// - product: catalog entries holding the authoritative stock count
// - order: the order aggregate, its state machine and the engine
// - catalog: product/user registration
//
// Persistence is behind the traits in `crate::store`.
//
// ============================================================================

pub mod user;
pub mod product;
pub mod order;
pub mod catalog;
