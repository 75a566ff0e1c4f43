//! # Event Schema
//!
//! Events the program emits on success, and the request/response payloads
//! the service exchanges with the transaction-submission layer.
//!
//! ## Emission Rules
//!
//! | Operation | Events (in order) |
//! |-----------|-------------------|
//! | `initialize_user` | `UserInitialized` |
//! | `post_question` | `QuestionPosted` |
//! | `submit_answer` | `AnswerSubmitted` |
//! | `vote_on_answer` | `ReputationUpdated` (voter) |
//! | `verify_answer` | `AnswerVerified`, then `ReputationUpdated` on false→true |
//! | `select_best_answer` | `BestAnswerSelected`, `BountyPaid` if escrowed, `ReputationUpdated` |
//! | `close_question` | `QuestionClosed` on the open→closed transition |
//! | `add_specialty` | `SpecialtyAdded` |
//! | `promote_to_expert` | `ExpertPromoted` on first promotion |
//! | `deposit` | `FundsDeposited` if value > 0 |
//! | `withdraw_funds` | `FundsWithdrawn` if anything was withdrawable |
//! | `transfer_privilege` | `PrivilegeTransferred` |
//!
//! Events raised by a reverted call are discarded with the rest of its effects.

use crate::domain::value_objects::{
    Address, AnswerId, EncryptedContent, Plaintext, QuestionId, Timestamp, U256,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// FORUM EVENTS
// =============================================================================

/// Events emitted by the forum program.
///
/// Public fields only; no event ever carries a plaintext confidential value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForumEvent {
    /// A profile was created.
    UserInitialized { user: Address, timestamp: Timestamp },

    /// A user's encrypted reputation aggregate was replaced.
    ReputationUpdated { user: Address, timestamp: Timestamp },

    /// A specialty was appended to a profile.
    SpecialtyAdded { user: Address, specialty: String },

    /// A user was promoted to expert.
    ExpertPromoted { user: Address },

    /// A question was posted.
    QuestionPosted {
        id: QuestionId,
        author: Address,
        category: String,
    },

    /// An answer was submitted.
    AnswerSubmitted {
        id: AnswerId,
        question_id: QuestionId,
        author: Address,
    },

    /// An answer's verified flag was set.
    AnswerVerified { id: AnswerId, verified: bool },

    /// An answer was chosen as best.
    BestAnswerSelected {
        question_id: QuestionId,
        answer_id: AnswerId,
    },

    /// An escrowed bounty left the program.
    BountyPaid {
        question_id: QuestionId,
        recipient: Address,
        amount: U256,
    },

    /// A question stopped accepting answers.
    QuestionClosed { id: QuestionId },

    /// Non-bounty funds were deposited.
    FundsDeposited { from: Address, amount: U256 },

    /// Non-bounty funds were withdrawn by the privileged principal.
    FundsWithdrawn { to: Address, amount: U256 },

    /// The privileged role changed hands.
    PrivilegeTransferred { previous: Address, new: Address },
}

impl ForumEvent {
    /// Topic this event is published under.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::UserInitialized { .. }
            | Self::ReputationUpdated { .. }
            | Self::SpecialtyAdded { .. }
            | Self::ExpertPromoted { .. } => EventTopic::Identity,
            Self::QuestionPosted { .. }
            | Self::AnswerSubmitted { .. }
            | Self::AnswerVerified { .. }
            | Self::QuestionClosed { .. } => EventTopic::Content,
            Self::BestAnswerSelected { .. } | Self::BountyPaid { .. } => EventTopic::Bounty,
            Self::FundsDeposited { .. }
            | Self::FundsWithdrawn { .. }
            | Self::PrivilegeTransferred { .. } => EventTopic::Admin,
        }
    }
}

/// Coarse event categories for subscription filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Profiles and reputation.
    Identity,
    /// Questions and answers.
    Content,
    /// Best-answer selection and payouts.
    Bounty,
    /// Privileged operations and vault movements.
    Admin,
}

impl EventTopic {
    /// Bus topic name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => topics::IDENTITY,
            Self::Content => topics::CONTENT,
            Self::Bounty => topics::BOUNTY,
            Self::Admin => topics::ADMIN,
        }
    }
}

/// Filter over event topics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics accepted. Empty accepts everything.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Accepts every event.
    #[must_use]
    pub fn all() -> Self {
        Self { topics: Vec::new() }
    }

    /// Accepts only the listed topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Returns true if the event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &ForumEvent) -> bool {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}

// =============================================================================
// REQUEST / RESPONSE PAYLOADS
// =============================================================================

/// A forum call as submitted by the transaction layer.
///
/// The caller and attached value travel in the envelope, not the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForumRequestPayload {
    /// `initialize_user`.
    InitializeUser { initial_reputation: Plaintext },
    /// `add_specialty`.
    AddSpecialty { specialty: String },
    /// `promote_to_expert`.
    PromoteToExpert { user: Address },
    /// `post_question`; the bounty is the envelope value.
    PostQuestion {
        category: String,
        content: EncryptedContent,
        reputation_gate: Plaintext,
    },
    /// `submit_answer`.
    SubmitAnswer {
        question_id: QuestionId,
        content: EncryptedContent,
    },
    /// `vote_on_answer`.
    VoteOnAnswer { answer_id: AnswerId, score: u8 },
    /// `verify_answer`.
    VerifyAnswer { answer_id: AnswerId, verified: bool },
    /// `select_best_answer`.
    SelectBestAnswer {
        question_id: QuestionId,
        answer_id: AnswerId,
    },
    /// `close_question`.
    CloseQuestion { question_id: QuestionId },
    /// `deposit`; the amount is the envelope value.
    Deposit,
    /// `withdraw_funds`.
    WithdrawFunds,
    /// `transfer_privilege`.
    TransferPrivilege { new_admin: Address },
}

impl ForumRequestPayload {
    /// Operation name used in logs and stats.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::InitializeUser { .. } => "initialize_user",
            Self::AddSpecialty { .. } => "add_specialty",
            Self::PromoteToExpert { .. } => "promote_to_expert",
            Self::PostQuestion { .. } => "post_question",
            Self::SubmitAnswer { .. } => "submit_answer",
            Self::VoteOnAnswer { .. } => "vote_on_answer",
            Self::VerifyAnswer { .. } => "verify_answer",
            Self::SelectBestAnswer { .. } => "select_best_answer",
            Self::CloseQuestion { .. } => "close_question",
            Self::Deposit => "deposit",
            Self::WithdrawFunds => "withdraw_funds",
            Self::TransferPrivilege { .. } => "transfer_privilege",
        }
    }
}

/// Value returned by a successful call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutput {
    /// Operation returns nothing.
    Unit,
    /// Newly allocated question id.
    Question(QuestionId),
    /// Newly allocated answer id.
    Answer(AnswerId),
    /// Amount withdrawn.
    Withdrawn(U256),
}

/// Result of a forum call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumResponsePayload {
    /// Whether the call committed.
    pub success: bool,
    /// Return value (None when reverted).
    pub output: Option<CallOutput>,
    /// Events emitted by the committed call.
    pub events: Vec<ForumEvent>,
    /// Revert reason (if the call failed).
    pub revert_reason: Option<String>,
}

impl ForumResponsePayload {
    /// Response for a committed call.
    #[must_use]
    pub fn committed(output: CallOutput, events: Vec<ForumEvent>) -> Self {
        Self {
            success: true,
            output: Some(output),
            events,
            revert_reason: None,
        }
    }

    /// Response for a reverted call.
    #[must_use]
    pub fn reverted(reason: String) -> Self {
        Self {
            success: false,
            output: None,
            events: Vec::new(),
            revert_reason: Some(reason),
        }
    }
}

// =============================================================================
// EVENT BUS TOPICS
// =============================================================================

/// Event topics for the forum program.
pub mod topics {
    /// Profile and reputation events.
    pub const IDENTITY: &str = "forum.identity";

    /// Question and answer events.
    pub const CONTENT: &str = "forum.content";

    /// Best-answer and bounty events.
    pub const BOUNTY: &str = "forum.bounty";

    /// Privileged-operation events.
    pub const ADMIN: &str = "forum.admin";
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_topics() {
        let user = Address::new([1u8; 20]);
        assert_eq!(
            ForumEvent::ReputationUpdated { user, timestamp: 1 }.topic(),
            EventTopic::Identity
        );
        assert_eq!(
            ForumEvent::QuestionClosed { id: QuestionId(1) }.topic(),
            EventTopic::Content
        );
        assert_eq!(
            ForumEvent::BountyPaid {
                question_id: QuestionId(1),
                recipient: user,
                amount: U256::from(1),
            }
            .topic(),
            EventTopic::Bounty
        );
        assert_eq!(EventTopic::Admin.as_str(), "forum.admin");
    }

    #[test]
    fn test_filter_matching() {
        let event = ForumEvent::QuestionClosed { id: QuestionId(1) };
        assert!(EventFilter::all().matches(&event));
        assert!(EventFilter::topics(vec![EventTopic::Content]).matches(&event));
        assert!(!EventFilter::topics(vec![EventTopic::Bounty]).matches(&event));
    }

    #[test]
    fn test_request_payload_serialization() {
        let payload = ForumRequestPayload::PostQuestion {
            category: "Technology".to_string(),
            content: EncryptedContent::from("Q1"),
            reputation_gate: 10,
        };

        let serialized = serde_json::to_string(&payload).unwrap();
        assert!(serialized.contains("PostQuestion"));
        let deserialized: ForumRequestPayload = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, payload);
        assert_eq!(deserialized.operation(), "post_question");
    }

    #[test]
    fn test_reverted_response_has_no_events() {
        let response = ForumResponsePayload::reverted("self vote".to_string());
        assert!(!response.success);
        assert!(response.events.is_empty());
        assert!(response.output.is_none());
    }
}
