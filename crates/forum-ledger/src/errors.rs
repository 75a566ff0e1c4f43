//! # Error Types
//!
//! All error types for the confidential forum.
//!
//! Every [`ForumError`] aborts the call that raised it; the program restores
//! its ledger snapshot so no partial effect survives.

use crate::domain::value_objects::{Address, AnswerId, Handle, QuestionId, U256};
use thiserror::Error;

/// Which content table a lookup missed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// Question table.
    Question,
    /// Answer table.
    Answer,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Question => write!(f, "question"),
            Self::Answer => write!(f, "answer"),
        }
    }
}

// =============================================================================
// FORUM ERRORS
// =============================================================================

/// Errors raised by forum operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForumError {
    /// Caller (or target principal) has no profile.
    #[error("principal not initialized: {0}")]
    NotInitialized(Address),

    /// Caller already has a profile.
    #[error("principal already initialized: {0}")]
    AlreadyInitialized(Address),

    /// Unknown question or answer id.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u32 },

    /// Post body is empty.
    #[error("encrypted content is empty")]
    EmptyContent,

    /// Vote outside `[0, max]`.
    #[error("invalid score: {score} not in [0, {max}]")]
    InvalidScore { score: u8, max: u8 },

    /// Author voting on their own answer.
    #[error("cannot vote on own answer")]
    SelfVote,

    /// Question has been closed.
    #[error("question {0} is closed")]
    QuestionInactive(QuestionId),

    /// Caller lacks the required role.
    #[error("not authorized: {0}")]
    NotAuthorized(Address),

    /// Answer belongs to a different question.
    #[error("{answer_id} belongs to {actual}, not {question_id}")]
    AnswerQuestionMismatch {
        question_id: QuestionId,
        answer_id: AnswerId,
        actual: QuestionId,
    },

    /// Value attached to an operation that does not accept it.
    #[error("operation is not payable (value {0})")]
    NonPayable(U256),

    /// Vault cannot cover a debit.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: U256, available: U256 },

    /// A nested call needed the treasury while an outer transfer held it.
    #[error("value transfer already in progress")]
    TransferInProgress,

    /// Id counter wrapped.
    #[error("id space exhausted")]
    IdSpaceExhausted,

    /// Confidential engine failure.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Value transfer failure.
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl ForumError {
    /// `NotFound` for a question id.
    #[must_use]
    pub fn question_not_found(id: QuestionId) -> Self {
        Self::NotFound {
            kind: EntityKind::Question,
            id: id.0,
        }
    }

    /// `NotFound` for an answer id.
    #[must_use]
    pub fn answer_not_found(id: AnswerId) -> Self {
        Self::NotFound {
            kind: EntityKind::Answer,
            id: id.0,
        }
    }

    /// Returns true for caller-input failures (as opposed to collaborator
    /// failures from the engine or the value-transfer layer).
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        !matches!(
            self,
            Self::Engine(_) | Self::Transfer(_) | Self::TransferInProgress | Self::IdSpaceExhausted
        )
    }
}

// =============================================================================
// ENGINE ERRORS
// =============================================================================

/// Errors from the confidential-value engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Handle was never minted by this engine.
    #[error("unknown handle: {0:?}")]
    UnknownHandle(Handle),

    /// Principal is not on the handle's ACL.
    #[error("access denied for {principal} on {handle:?}")]
    AccessDenied { handle: Handle, principal: Address },

    /// Engine backend unreachable.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// TRANSFER ERRORS
// =============================================================================

/// Errors from the native-currency transfer layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Recipient refused the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

// =============================================================================
// SERVICE ERRORS
// =============================================================================

/// Errors from the async service wrapper.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A committed call left the ledger violating an invariant.
    #[error("invariant violated after {operation}: {details}")]
    InvariantViolated { operation: String, details: String },
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors loading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable present but unparsable.
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Errors installing the tracing subscriber.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// Filter directive did not parse, or a global subscriber already exists.
    #[error("tracing init failed: {0}")]
    Init(String),
}

// =============================================================================
// TESTS
// =============================================================================
