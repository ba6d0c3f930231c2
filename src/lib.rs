//! Order lifecycle and inventory-consistency engine.
//!
//! Orders move through PENDING → CONFIRMED → SHIPPED → DELIVERED (or
//! CANCELLED); adding an item reserves product stock, and cancelling a
//! confirmed order gives it back. Every operation runs in one store
//! transaction together with its outbox event.

pub mod config;
pub mod domain;
pub mod ids;
pub mod metrics;
pub mod outbox;
pub mod store;
pub mod telemetry;
