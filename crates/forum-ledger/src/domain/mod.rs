//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for the confidential forum.
//! NO I/O, NO async, NO engine calls.
//!
//! - Dependencies point INWARD only (adapters and the program depend on
//!   this, not vice versa).
//! - Confidential values appear here only as opaque [`Handle`]s.

pub mod entities;
pub mod invariants;
pub mod ledger;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use invariants::*;
pub use ledger::*;
pub use services::*;
pub use value_objects::*;
