//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the forum program and the outside world.
//!
//! - **Driving Port (Inbound)**: `ForumApi`
//! - **Driven Ports (Outbound)**: `ConfidentialEngine`, `DecryptionService`,
//!   `ValueTransfer`, `EventPublisher`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
