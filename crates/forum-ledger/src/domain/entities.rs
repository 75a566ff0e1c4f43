//! # Core Domain Entities
//!
//! Profiles, questions and answers, plus the per-call context the hosting
//! ledger supplies.

use crate::domain::value_objects::{
    Address, AnswerId, EncryptedContent, Handle, QuestionId, Timestamp, U256,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// Per-call context supplied by the hosting ledger.
///
/// Mirrors the sender / attached value / block time triple every call into
/// the program carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Principal invoking the operation.
    pub caller: Address,
    /// Native currency attached to the call.
    pub value: U256,
    /// Ledger time of the call.
    pub timestamp: Timestamp,
}

impl CallContext {
    /// Context for a call that carries no value.
    #[must_use]
    pub fn new(caller: Address, timestamp: Timestamp) -> Self {
        Self {
            caller,
            value: U256::zero(),
            timestamp,
        }
    }

    /// Context for a payable call.
    #[must_use]
    pub fn with_value(caller: Address, value: U256, timestamp: Timestamp) -> Self {
        Self {
            caller,
            value,
            timestamp,
        }
    }
}

// =============================================================================
// USER PROFILE
// =============================================================================

/// A participant's identity record.
///
/// `reputation` and `contributions` are confidential aggregates; everything
/// else is public.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning principal.
    pub address: Address,
    /// Encrypted reputation aggregate.
    pub reputation: Handle,
    /// Encrypted contribution count.
    pub contributions: Handle,
    /// Expert flag, set by the privileged principal.
    pub is_expert: bool,
    /// Self-declared specialties, in insertion order.
    pub specialties: Vec<String>,
    /// Ledger time the profile was created.
    pub join_time: Timestamp,
}

// =============================================================================
// QUESTION
// =============================================================================

/// A posted question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Sequential identifier.
    pub id: QuestionId,
    /// Public category label.
    pub category: String,
    /// Client-encrypted body.
    pub encrypted_content: EncryptedContent,
    /// Posting principal.
    pub author: Address,
    /// Ledger time of posting.
    pub created_at: Timestamp,
    /// Number of answers submitted.
    pub answer_count: u32,
    /// Encrypted minimum-reputation gate chosen by the author.
    pub reputation_gate: Handle,
    /// False once closed.
    pub is_active: bool,
    /// Escrowed native currency awaiting a best answer.
    pub bounty: U256,
}

// =============================================================================
// ANSWER
// =============================================================================

/// An answer to a question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Sequential identifier.
    pub id: AnswerId,
    /// Question this answer belongs to.
    pub question_id: QuestionId,
    /// Client-encrypted body.
    pub encrypted_content: EncryptedContent,
    /// Answering principal.
    pub author: Address,
    /// Ledger time of submission.
    pub created_at: Timestamp,
    /// Encrypted sum of all votes cast.
    pub score: Handle,
    /// Set by the privileged principal.
    pub is_verified: bool,
    /// At most one answer per question carries this flag.
    pub is_best_answer: bool,
}

// =============================================================================
// FORUM CONFIG
// =============================================================================

/// Program-level configuration fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumConfig {
    /// Address the program itself holds ACL grants under.
    pub program_address: Address,
    /// Initial privileged principal.
    pub admin: Address,
}

impl ForumConfig {
    /// Config with the given program and admin addresses.
    #[must_use]
    pub fn new(program_address: Address, admin: Address) -> Self {
        Self {
            program_address,
            admin,
        }
    }
}

impl Default for ForumConfig {
    fn default() -> Self {
        let mut program = [0u8; 20];
        program[19] = 0x42;
        Self::new(Address::new(program), Address::ZERO)
    }
}
