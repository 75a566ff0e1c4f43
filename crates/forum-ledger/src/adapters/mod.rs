//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the driven ports. A deployment swaps these
//! for a real encryption coprocessor, wallet layer and message bus.

pub mod acl;
pub mod engine;
pub mod event_bus;
pub mod treasury;

pub use acl::*;
pub use engine::*;
pub use event_bus::*;
pub use treasury::*;
