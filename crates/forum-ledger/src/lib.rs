//! # Forum Ledger - Confidential Q&A Program
//!
//! A question-and-answer forum run as a ledger program whose reputation,
//! contribution counts, vote tallies and reputation gates are stored as
//! opaque ciphertext handles. The program combines them homomorphically and
//! never sees a plaintext aggregate.
//!
//! ## Purpose
//!
//! Participants post questions (optionally escrowing a native-currency
//! bounty), answer, vote with encrypted scores, and the asker picks a best
//! answer. Selection pays the bounty out exactly once and credits the
//! answerer's encrypted reputation.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | At most one best answer per question | `domain/invariants.rs` - `check_best_answer_exclusivity()` |
//! | INVARIANT-2 | `answer_count` equals the per-question index length | `domain/invariants.rs` - `check_answer_count_invariant()` |
//! | INVARIANT-3 | Ids strictly increasing, never reused | `domain/ledger.rs` - `IdAllocator` |
//! | INVARIANT-4 | Escrow equals open bounties and is covered by the balance | `domain/invariants.rs` - `check_escrow_invariant()` |
//! | INVARIANT-5 | Program and owner on every stored handle's ACL | `domain/invariants.rs` - `check_acl_coverage()` |
//!
//! ## Call Semantics
//!
//! - **Atomic**: every mutating call commits fully or leaves the ledger
//!   unchanged (`program.rs` - `transact()`).
//! - **Checks-effects-interactions**: the bounty is zeroed and the vault
//!   debited before the value transfer hands control to the recipient.
//! - **Single writer**: `ForumService` serialises calls behind one lock.
//!
//! ## Reputation Accrual
//!
//! | Event | Delta | Credited to |
//! |-------|-------|-------------|
//! | Answer submitted | +1 contribution | submitter |
//! | Vote cast | +1 reputation | voter |
//! | Answer verified (false→true) | +10 reputation | answer author |
//! | Best answer selected | +25 reputation | answer author |
//!
//! The table and the vote range `[0, 10]` are constants, not configuration.
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `ConfidentialEngine` | Encode, homomorphic add, ACL grants |
//! | `DecryptionService` | Off-ledger reads by ACL members |
//! | `ValueTransfer` | Bounty payouts and withdrawals |
//! | `EventPublisher` | Committed event fan-out |
//!
//! ## Usage Example
//!
//! ```ignore
//! use forum_ledger::prelude::*;
//!
//! let service = create_test_service();
//! let response = service
//!     .handle_request(alice, U256::zero(), Uuid::new_v4(),
//!         ForumRequestPayload::InitializeUser { initial_reputation: 50 })
//!     .await?;
//! assert!(response.success);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod program;
pub mod service;
pub mod telemetry;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{Answer, CallContext, ForumConfig, Question, UserProfile};

    // Value objects
    pub use crate::domain::value_objects::{
        Address, AnswerId, EncryptedContent, Handle, Plaintext, QuestionId, Timestamp, U256,
    };

    // Ledger and rules
    pub use crate::domain::ledger::{ForumIndex, ForumLedger, IdAllocator, Vault};
    pub use crate::domain::services::{AggregateKind, LedgerEvent, RewardTable, MAX_SCORE};

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::ForumApi;
    pub use crate::ports::outbound::{
        ConfidentialEngine, DecryptionService, EventPublisher, ValueTransfer,
    };

    // Events
    pub use crate::events::{
        topics, CallOutput, EventFilter, EventTopic, ForumEvent, ForumRequestPayload,
        ForumResponsePayload,
    };

    // Errors
    pub use crate::errors::{
        ConfigError, EngineError, EntityKind, ForumError, ServiceError, TelemetryError,
        TransferError,
    };

    // Adapters
    pub use crate::adapters::{
        InMemoryAcl, InMemoryConfidentialEngine, InMemoryEventBus, InMemoryTreasury, Payout,
        Subscription,
    };

    // Program and service
    pub use crate::program::ForumProgram;
    pub use crate::service::{
        create_test_service, create_test_service_with, ForumService, ServiceConfig,
        ServiceStats,
    };
    pub use crate::telemetry::init_tracing;
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program name used in logs.
pub const PROGRAM_NAME: &str = "Confidential Forum";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prelude_exports() {
        use prelude::*;
        let _ = ForumConfig::default();
        let _ = Address::ZERO;
        let _ = RewardTable::STANDARD;
        assert_eq!(MAX_SCORE, 10);
    }
}
